// src/services/approver_service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;

use crate::{
    common::{db_utils::with_timeout, error::AppError},
    db::EmployeeStore,
    engine::policy::WFH_MIN_TENURE_DAYS,
    middleware::actor::Actor,
    models::{
        employee::{ApproverResponse, Employee, LeaveTypesResponse},
        leave::LeaveType,
    },
};

#[derive(Clone)]
pub struct ApproverService {
    employees: Arc<dyn EmployeeStore>,
    timeout: Duration,
}

impl ApproverService {
    pub fn new(employees: Arc<dyn EmployeeStore>, timeout: Duration) -> Self {
        Self { employees, timeout }
    }

    pub async fn find_employee(&self, employee_id: &str) -> Result<Employee, AppError> {
        with_timeout(self.timeout, "find_employee", self.employees.find_employee(employee_id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))
    }

    pub async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        with_timeout(self.timeout, "list_employees", self.employees.list_employees()).await
    }

    pub async fn current_approver(&self, employee_id: &str) -> Result<String, AppError> {
        self.find_employee(employee_id)
            .await?
            .approver_id
            .ok_or_else(|| AppError::NotFound(format!("approver of employee {employee_id}")))
    }

    /// Aprovador do aprovador (segundo nível). None quando a cadeia termina.
    pub async fn second_level_of(&self, approver_id: &str) -> Result<Option<String>, AppError> {
        let approver = with_timeout(self.timeout, "find_employee", self.employees.find_employee(approver_id)).await?;
        Ok(approver
            .and_then(|a| a.approver_id)
            .filter(|second| second != approver_id))
    }

    /// Tipos que o colaborador pode pedir hoje + aprovador atual.
    pub async fn leave_types(
        &self,
        actor: &Actor,
        employee_id: &str,
        today: NaiveDate,
    ) -> Result<LeaveTypesResponse, AppError> {
        let employee = self.find_employee(employee_id).await?;

        let allowed = actor.is_hr()
            || actor.employee_id == employee.employee_id
            || employee.approver_id.as_deref() == Some(actor.employee_id.as_str());
        if !allowed {
            return Err(AppError::Unauthorized(format!(
                "{} cannot view the leave types of {employee_id}",
                actor.employee_id
            )));
        }

        let wfh_eligible = employee.tenure_days(today) >= WFH_MIN_TENURE_DAYS;
        let leave_types = LeaveType::ALL
            .into_iter()
            .filter(|t| *t != LeaveType::WorkFromHome || wfh_eligible)
            .collect();

        Ok(LeaveTypesResponse { leave_types, approver_id: employee.approver_id })
    }

    /// Sobrescreve o aprovador (idempotente) e repassa os pedidos pendentes.
    pub async fn reassign(
        &self,
        actor: &Actor,
        employee_id: &str,
        new_approver_id: &str,
    ) -> Result<ApproverResponse, AppError> {
        if !actor.is_hr() {
            return Err(AppError::Unauthorized("only HR can reassign approvers".into()));
        }
        if employee_id == new_approver_id {
            return Err(AppError::Validation(format!("{employee_id} cannot approve their own requests")));
        }

        self.find_employee(employee_id).await?;
        self.find_employee(new_approver_id).await?;

        let rebound = with_timeout(
            self.timeout,
            "reassign_approver",
            self.employees.reassign_approver(employee_id, new_approver_id),
        )
        .await?;

        tracing::info!(
            "🔁 Aprovador de {} agora é {} (por {}, {} pedido(s) pendente(s) religado(s))",
            employee_id,
            new_approver_id,
            actor.employee_id,
            rebound
        );

        Ok(ApproverResponse {
            employee_id: employee_id.to_string(),
            approver_id: new_approver_id.to_string(),
            rebound_requests: rebound,
        })
    }
}
