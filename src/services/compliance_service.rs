// src/services/compliance_service.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    common::{db_utils::with_timeout, error::AppError},
    db::ComplianceStore,
    engine::compliance,
    middleware::actor::Actor,
    models::compliance::{ComplianceStatus, WarningResponse},
    services::approver_service::ApproverService,
};

#[derive(Clone)]
pub struct ComplianceService {
    store: Arc<dyn ComplianceStore>,
    approvers: ApproverService,
    required_policies: Arc<Vec<String>>,
    timeout: Duration,
}

impl ComplianceService {
    pub fn new(
        store: Arc<dyn ComplianceStore>,
        approvers: ApproverService,
        required_policies: Vec<String>,
        timeout: Duration,
    ) -> Self {
        Self { store, approvers, required_policies: Arc::new(required_policies), timeout }
    }

    pub async fn status(&self, actor: &Actor, employee_id: &str) -> Result<ComplianceStatus, AppError> {
        if actor.employee_id != employee_id && !actor.is_hr() {
            return Err(AppError::Unauthorized(format!(
                "{} cannot view the compliance status of {employee_id}",
                actor.employee_id
            )));
        }

        let employee = self.approvers.find_employee(employee_id).await?;
        let pending = compliance::pending_policies(&employee.policy_acknowledgments, &self.required_policies);

        Ok(ComplianceStatus {
            employee_id: employee.employee_id,
            fully_acknowledged: pending.is_empty(),
            pending_policies: pending,
            warning_count: employee.warning_count,
            escalated: compliance::is_escalated(employee.warning_count),
        })
    }

    /// O próprio colaborador (ou o RH) registra o aceite de uma política.
    pub async fn record_acknowledgment(
        &self,
        actor: &Actor,
        employee_id: &str,
        policy_id: &str,
    ) -> Result<ComplianceStatus, AppError> {
        if actor.employee_id != employee_id && !actor.is_hr() {
            return Err(AppError::Unauthorized(format!(
                "{} cannot acknowledge policies for {employee_id}",
                actor.employee_id
            )));
        }

        self.approvers.find_employee(employee_id).await?;

        let acks = with_timeout(
            self.timeout,
            "record_acknowledgment",
            self.store.record_acknowledgment(employee_id, policy_id),
        )
        .await?;

        if compliance::is_fully_acknowledged(&acks, &self.required_policies) {
            let required = Arc::clone(&self.required_policies);
            let count = with_timeout(
                self.timeout,
                "update_warning_count",
                self.store.update_warning_count(employee_id, &move |current: i16, acks: &BTreeMap<String, bool>| {
                    compliance::count_after_acknowledgment(current, compliance::is_fully_acknowledged(acks, &required))
                }),
            )
            .await?;
            tracing::info!("📜 {} aceitou todas as políticas (avisos: {})", employee_id, count);
        } else {
            tracing::info!("📜 {} aceitou a política '{}'", employee_id, policy_id);
        }

        self.status(actor, employee_id).await
    }

    /// Um tick do agendador de compliance: +1 aviso para quem ainda tem política pendente.
    /// Os aceites são avaliados dentro da mesma operação atômica do contador.
    pub async fn tick(&self, employee_id: &str) -> Result<WarningResponse, AppError> {
        let employee = self.approvers.find_employee(employee_id).await?;
        let required = Arc::clone(&self.required_policies);

        let warning_count = with_timeout(
            self.timeout,
            "update_warning_count",
            self.store.update_warning_count(employee_id, &move |current: i16, acks: &BTreeMap<String, bool>| {
                compliance::next_warning_count(current, compliance::is_fully_acknowledged(acks, &required))
            }),
        )
        .await?;

        let escalated = compliance::is_escalated(warning_count);
        if escalated {
            tracing::warn!(
                "🚨 {} atingiu {} avisos: escalonar para o ciclo de vida da conta",
                employee_id,
                warning_count
            );
        } else if warning_count != employee.warning_count {
            tracing::info!("⚠️ Aviso {} registrado para {}", warning_count, employee_id);
        }

        Ok(WarningResponse { warning_count, escalated })
    }
}
