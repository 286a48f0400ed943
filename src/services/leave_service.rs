// src/services/leave_service.rs

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use uuid::Uuid;

use crate::{
    common::{db_utils::with_timeout, error::AppError},
    db::{BalanceSource, LeaveStore},
    engine::state_machine::{self, SubmitContext},
    middleware::actor::Actor,
    models::leave::{ApprovalChecksPayload, DecideLeavePayload, LeaveRequest, LeaveRequestInput, LeaveStatus},
    services::{approver_service::ApproverService, calendar_service::CalendarService},
};

// Nenhum pedido cobre mais de um ano; o contador de dias percorre o intervalo
const MAX_REQUEST_SPAN_DAYS: i64 = 366;

// Folga de uma semana nas pontas cobre a regra semanal de WFH
const CALENDAR_MARGIN_DAYS: i64 = 7;

#[derive(Clone)]
pub struct LeaveService {
    leaves: Arc<dyn LeaveStore>,
    balances: Arc<dyn BalanceSource>,
    approvers: ApproverService,
    calendar: CalendarService,
    timeout: Duration,
}

impl LeaveService {
    pub fn new(
        leaves: Arc<dyn LeaveStore>,
        balances: Arc<dyn BalanceSource>,
        approvers: ApproverService,
        calendar: CalendarService,
        timeout: Duration,
    ) -> Self {
        Self { leaves, balances, approvers, calendar, timeout }
    }

    async fn load(&self, id: Uuid) -> Result<LeaveRequest, AppError> {
        with_timeout(self.timeout, "find_leave", self.leaves.find_leave(id))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("leave request {id}")))
    }

    /// Grava a transição só se ninguém mexeu no pedido desde a leitura.
    async fn commit_transition(
        &self,
        updated: &LeaveRequest,
        expected_status: LeaveStatus,
        expected_approver: Option<&str>,
    ) -> Result<(), AppError> {
        let applied = with_timeout(
            self.timeout,
            "update_leave_if",
            self.leaves.update_leave_if(updated, expected_status, expected_approver),
        )
        .await?;

        if !applied {
            return Err(AppError::InvalidState(format!(
                "leave request {} was changed by another operation",
                updated.id
            )));
        }
        Ok(())
    }

    // --- SUBMIT ---
    pub async fn submit(
        &self,
        actor: &Actor,
        input: LeaveRequestInput,
        now: NaiveDateTime,
    ) -> Result<LeaveRequest, AppError> {
        let employee_id = input.employee_id.clone().unwrap_or_else(|| actor.employee_id.clone());
        if employee_id != actor.employee_id && !actor.is_hr() {
            return Err(AppError::Unauthorized("only HR can apply leave on behalf of another employee".into()));
        }

        let first = input.from_date.min(input.to_date);
        let last = input.from_date.max(input.to_date);
        if last.signed_duration_since(first).num_days() >= MAX_REQUEST_SPAN_DAYS {
            return Err(AppError::Validation(format!(
                "a leave request cannot span more than {MAX_REQUEST_SPAN_DAYS} days"
            )));
        }

        let employee = self.approvers.find_employee(&employee_id).await?;
        let approver_id = employee
            .approver_id
            .clone()
            .ok_or_else(|| AppError::NotFound(format!("approver of employee {employee_id}")))?;
        let approver_of_approver = self.approvers.second_level_of(&approver_id).await?;

        let margin = TimeDelta::days(CALENDAR_MARGIN_DAYS);
        let start = first.checked_sub_signed(margin).unwrap_or(NaiveDate::MIN);
        let end = last.checked_add_signed(margin).unwrap_or(NaiveDate::MAX);
        let calendar = self.calendar.calendar_between(start, end).await?;

        let available_balance = if input.leave_type.is_balance_gated() {
            with_timeout(
                self.timeout,
                "available_balance",
                self.balances.available_balance(&employee_id, input.leave_type),
            )
            .await?
        } else {
            None
        };

        let history = with_timeout(self.timeout, "leaves_for_employee", self.leaves.leaves_for_employee(&employee_id))
            .await?;

        let ctx = SubmitContext {
            employee: &employee,
            now,
            calendar: &calendar,
            available_balance,
            history: &history,
            approver_id: &approver_id,
            approver_of_approver: approver_of_approver.as_deref(),
        };
        let submitted = state_machine::submit(LeaveRequest::draft(&employee_id, input, now), &ctx)?;

        let inserted = with_timeout(self.timeout, "insert_leave", self.leaves.insert_leave(&submitted)).await?;
        if !inserted {
            tracing::warn!(
                "🔁 Aprovador de {} mudou durante a submissão; pedido {} descartado",
                employee_id,
                submitted.id
            );
            return Err(AppError::TransientFailure(format!(
                "the approver of {employee_id} changed while the request was being submitted"
            )));
        }

        if let Some(original) = submitted.converted_from {
            tracing::warn!(
                "💸 Saldo insuficiente: pedido {} de {} convertido de {} para {}",
                submitted.id,
                employee_id,
                original.as_str(),
                submitted.leave_type.as_str()
            );
        }
        tracing::info!(
            "📝 Pedido {} ({}, {} dia(s)) de {} aguardando {}",
            submitted.id,
            submitted.leave_type.as_str(),
            submitted.chargeable_days,
            employee_id,
            approver_id
        );

        Ok(submitted)
    }

    // --- DECIDE ---
    pub async fn decide(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: DecideLeavePayload,
        now: NaiveDateTime,
    ) -> Result<LeaveRequest, AppError> {
        let current = self.load(id).await?;
        let decided = state_machine::decide(&current, &actor.employee_id, payload.outcome, payload.comment, now)?;

        self.commit_transition(&decided, LeaveStatus::Pending, current.approver_id.as_deref())
            .await?;

        tracing::info!("✅ Pedido {} {} por {}", id, decided.status.as_str(), actor.employee_id);
        Ok(decided)
    }

    // --- CANCEL ---
    pub async fn cancel(&self, actor: &Actor, id: Uuid, now: NaiveDateTime) -> Result<LeaveRequest, AppError> {
        let current = self.load(id).await?;
        let cancelled = state_machine::cancel(&current, &actor.employee_id, actor.is_hr(), now)?;

        self.commit_transition(&cancelled, current.status, None).await?;

        tracing::info!("🚫 Pedido {} cancelado por {}", id, actor.employee_id);
        Ok(cancelled)
    }

    // --- CHECKS DO APROVADOR ---
    pub async fn set_checks(
        &self,
        actor: &Actor,
        id: Uuid,
        payload: ApprovalChecksPayload,
    ) -> Result<LeaveRequest, AppError> {
        let current = self.load(id).await?;
        let updated = state_machine::set_checks(
            &current,
            &actor.employee_id,
            payload.logged_time_checked,
            payload.customer_approved,
        )?;

        self.commit_transition(&updated, LeaveStatus::Pending, current.approver_id.as_deref())
            .await?;
        Ok(updated)
    }

    // --- LEITURA ---
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<LeaveRequest, AppError> {
        let request = self.load(id).await?;

        let visible = actor.is_hr()
            || request.employee_id == actor.employee_id
            || request.approver_id.as_deref() == Some(actor.employee_id.as_str())
            || request.second_level_approver_id.as_deref() == Some(actor.employee_id.as_str());
        if !visible {
            return Err(AppError::Unauthorized(format!("{} cannot view leave request {id}", actor.employee_id)));
        }
        Ok(request)
    }

    pub async fn list_for_employee(&self, actor: &Actor, employee_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        if actor.employee_id != employee_id && !actor.is_hr() {
            let approver = self.approvers.current_approver(employee_id).await.ok();
            if approver.as_deref() != Some(actor.employee_id.as_str()) {
                return Err(AppError::Unauthorized(format!(
                    "{} cannot list the leaves of {employee_id}",
                    actor.employee_id
                )));
            }
        }

        with_timeout(self.timeout, "leaves_for_employee", self.leaves.leaves_for_employee(employee_id)).await
    }

    pub async fn pending_for_approver(&self, actor: &Actor, approver_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        if actor.employee_id != approver_id && !actor.is_hr() {
            return Err(AppError::Unauthorized(format!(
                "{} cannot view the queue of {approver_id}",
                actor.employee_id
            )));
        }

        with_timeout(self.timeout, "pending_for_approver", self.leaves.pending_for_approver(approver_id)).await
    }
}
