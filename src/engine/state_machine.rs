// src/engine/state_machine.rs

//! Transições do pedido de licença.
//!
//! `Draft → Pending → {Approved, Rejected}` e `Pending|Approved → Cancelled`.
//! As funções aqui são puras: recebem o pedido atual e devolvem o pedido
//! atualizado. Quem persiste (com compare-and-set no status) é o serviço.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::engine::calendar::HolidayCalendar;
use crate::engine::day_calculator::chargeable_days;
use crate::engine::policy::{self, PolicyContext, PolicyViolation};
use crate::models::employee::Employee;
use crate::models::leave::{DecisionOutcome, LeaveRequest, LeaveStatus, LeaveType};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LeaveTransitionError {
    #[error("leave request violates {} policy rule(s)", .0.len())]
    PolicyRejected(Vec<PolicyViolation>),

    #[error("cannot {action} a request in status {}", .status.as_str())]
    InvalidState { action: &'static str, status: LeaveStatus },

    #[error("{0}")]
    Unauthorized(String),
}

/// Tudo que a submissão precisa além do próprio pedido.
#[derive(Debug, Clone, Copy)]
pub struct SubmitContext<'a> {
    pub employee: &'a Employee,
    pub now: NaiveDateTime,
    pub calendar: &'a HolidayCalendar,
    pub available_balance: Option<Decimal>,
    pub history: &'a [LeaveRequest],
    pub approver_id: &'a str,
    // Aprovador do aprovador; None no topo da cadeia
    pub approver_of_approver: Option<&'a str>,
}

impl<'a> SubmitContext<'a> {
    fn policy<'r>(&self, request: &'r LeaveRequest) -> PolicyContext<'r>
    where
        'a: 'r,
    {
        PolicyContext {
            request,
            employee: self.employee,
            now: self.now,
            calendar: self.calendar,
            available_balance: self.available_balance,
            history: self.history,
        }
    }
}

/// Conta os dias, valida e move o rascunho para `Pending`.
///
/// Se a única violação for saldo insuficiente num tipo com saldo, o pedido
/// vira `Unpaid` (com `converted_from` preenchido) em vez de ser recusado.
pub fn submit(mut request: LeaveRequest, ctx: &SubmitContext<'_>) -> Result<LeaveRequest, LeaveTransitionError> {
    if request.status != LeaveStatus::Draft {
        return Err(LeaveTransitionError::InvalidState { action: "submit", status: request.status });
    }

    // Intervalo inválido é reportado pelas regras comuns
    request.chargeable_days = chargeable_days(ctx.calendar, request.from_date, request.to_date, request.duration_mode)
        .unwrap_or(Decimal::ZERO);

    if let Err(violations) = policy::validate(&ctx.policy(&request)) {
        if !policy::is_balance_only_failure(request.leave_type, &violations) {
            return Err(LeaveTransitionError::PolicyRejected(violations));
        }

        request.converted_from = Some(request.leave_type);
        request.leave_type = LeaveType::Unpaid;
        request.chargeable_days =
            chargeable_days(ctx.calendar, request.from_date, request.to_date, request.duration_mode)
                .unwrap_or(Decimal::ZERO);

        policy::validate(&ctx.policy(&request)).map_err(LeaveTransitionError::PolicyRejected)?;
    }

    if policy::requires_second_level(&ctx.policy(&request)) {
        let second = ctx.approver_of_approver.unwrap_or(ctx.approver_id);
        request.second_level_approver_id = Some(second.to_string());
    }

    request.approver_id = Some(ctx.approver_id.to_string());
    request.status = LeaveStatus::Pending;
    Ok(request)
}

fn is_bound_approver(request: &LeaveRequest, actor_id: &str) -> bool {
    request.approver_id.as_deref() == Some(actor_id) || request.second_level_approver_id.as_deref() == Some(actor_id)
}

pub fn decide(
    request: &LeaveRequest,
    actor_id: &str,
    outcome: DecisionOutcome,
    comment: Option<String>,
    now: NaiveDateTime,
) -> Result<LeaveRequest, LeaveTransitionError> {
    if request.status != LeaveStatus::Pending {
        return Err(LeaveTransitionError::InvalidState { action: "decide", status: request.status });
    }

    if !is_bound_approver(request, actor_id) {
        return Err(LeaveTransitionError::Unauthorized(format!(
            "{actor_id} is not the approver of this request"
        )));
    }

    if outcome == DecisionOutcome::Approved {
        if let Some(second) = request.second_level_approver_id.as_deref() {
            if second != actor_id {
                return Err(LeaveTransitionError::Unauthorized(format!(
                    "this request needs approval from the second-level approver {second}"
                )));
            }
        }

        let missing = policy::approval_prerequisites(request);
        if !missing.is_empty() {
            return Err(LeaveTransitionError::PolicyRejected(missing));
        }
    }

    let mut decided = request.clone();
    decided.status = outcome.into();
    decided.decided_at = Some(now);
    decided.decided_by = Some(actor_id.to_string());
    decided.approver_comment = comment;
    Ok(decided)
}

pub fn cancel(
    request: &LeaveRequest,
    actor_id: &str,
    actor_is_hr: bool,
    now: NaiveDateTime,
) -> Result<LeaveRequest, LeaveTransitionError> {
    if !request.status.is_live() {
        return Err(LeaveTransitionError::InvalidState { action: "cancel", status: request.status });
    }

    if request.employee_id != actor_id && !actor_is_hr {
        return Err(LeaveTransitionError::Unauthorized(
            "only the requester or HR can cancel a leave request".into(),
        ));
    }

    let mut cancelled = request.clone();
    cancelled.status = LeaveStatus::Cancelled;
    cancelled.cancelled_at = Some(now);
    Ok(cancelled)
}

/// Marcações do aprovador (ponto conferido, aceite do cliente) num pedido pendente.
pub fn set_checks(
    request: &LeaveRequest,
    actor_id: &str,
    logged_time_checked: Option<bool>,
    customer_approved: Option<bool>,
) -> Result<LeaveRequest, LeaveTransitionError> {
    if request.status != LeaveStatus::Pending {
        return Err(LeaveTransitionError::InvalidState { action: "update checks of", status: request.status });
    }

    if !is_bound_approver(request, actor_id) {
        return Err(LeaveTransitionError::Unauthorized(format!(
            "{actor_id} is not the approver of this request"
        )));
    }

    let mut updated = request.clone();
    if let Some(flag) = logged_time_checked {
        updated.logged_time_checked = flag;
    }
    if let Some(flag) = customer_approved {
        updated.customer_approved = flag;
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::policy::RuleId;
    use crate::models::holiday::Holiday;
    use crate::models::leave::{DurationMode, LeaveRequestInput};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn now() -> NaiveDateTime {
        d(2025, 1, 2).and_hms_opt(10, 0, 0).unwrap()
    }

    fn employee() -> Employee {
        Employee {
            employee_id: "EMP001".into(),
            name: "Ana Souza".into(),
            joining_date: d(2020, 1, 1),
            is_lateral_hire: false,
            approver_id: Some("EMP010".into()),
            warning_count: 0,
            policy_acknowledgments: BTreeMap::new(),
        }
    }

    fn calendar() -> HolidayCalendar {
        HolidayCalendar::new(vec![Holiday { date: d(2025, 1, 26), name: "Republic Day".into() }])
    }

    fn draft(leave_type: LeaveType, from: NaiveDate, to: NaiveDate) -> LeaveRequest {
        let input = LeaveRequestInput {
            employee_id: None,
            leave_type,
            from_date: from,
            to_date: to,
            duration_mode: DurationMode::FullDay,
            reason: "viagem".into(),
            hand_over_comments: None,
            comp_off_transactions: vec![],
            customer_holiday_worked_date: None,
            shift_start_from_time: None,
            customer_approved: false,
        };
        LeaveRequest::draft("EMP001", input, now())
    }

    fn submit_with(request: LeaveRequest, balance: Option<Decimal>) -> Result<LeaveRequest, LeaveTransitionError> {
        let emp = employee();
        let cal = calendar();
        let ctx = SubmitContext {
            employee: &emp,
            now: now(),
            calendar: &cal,
            available_balance: balance,
            history: &[],
            approver_id: "EMP010",
            approver_of_approver: Some("EMP020"),
        };
        submit(request, &ctx)
    }

    fn pending() -> LeaveRequest {
        submit_with(draft(LeaveType::Sick, d(2025, 1, 24), d(2025, 1, 27)), None).unwrap()
    }

    #[test]
    fn submit_counts_days_and_binds_approver() {
        let submitted = pending();
        assert_eq!(submitted.status, LeaveStatus::Pending);
        assert_eq!(submitted.chargeable_days, Decimal::from(2));
        assert_eq!(submitted.approver_id.as_deref(), Some("EMP010"));
        assert_eq!(submitted.second_level_approver_id, None);
    }

    #[test]
    fn privilege_without_balance_falls_back_to_unpaid() {
        let request = draft(LeaveType::Privilege, d(2025, 1, 24), d(2025, 1, 27));
        let submitted = submit_with(request, Some(Decimal::ONE)).unwrap();

        assert_eq!(submitted.status, LeaveStatus::Pending);
        assert_eq!(submitted.leave_type, LeaveType::Unpaid);
        assert_eq!(submitted.converted_from, Some(LeaveType::Privilege));
        assert_eq!(submitted.chargeable_days, Decimal::from(2));
    }

    #[test]
    fn privilege_with_other_violations_is_rejected_with_all_of_them() {
        // só 1 dia de antecedência e sem saldo
        let request = draft(LeaveType::Privilege, d(2025, 1, 3), d(2025, 1, 3));
        let err = submit_with(request, None).unwrap_err();

        let LeaveTransitionError::PolicyRejected(violations) = err else {
            panic!("expected PolicyRejected");
        };
        let ids: Vec<_> = violations.iter().map(|v| v.rule_id).collect();
        assert_eq!(ids, vec![RuleId::PrivilegeNotice, RuleId::InsufficientBalance]);
    }

    #[test]
    fn privilege_with_balance_stays_privilege() {
        let request = draft(LeaveType::Privilege, d(2025, 1, 24), d(2025, 1, 27));
        let submitted = submit_with(request, Some(Decimal::from(10))).unwrap();
        assert_eq!(submitted.leave_type, LeaveType::Privilege);
        assert_eq!(submitted.converted_from, None);
    }

    #[test]
    fn reversed_range_is_a_policy_rejection() {
        let err = submit_with(draft(LeaveType::Sick, d(2025, 1, 27), d(2025, 1, 24)), None).unwrap_err();
        assert_eq!(
            err,
            LeaveTransitionError::PolicyRejected(vec![PolicyViolation::new(
                RuleId::InvalidRange,
                "toDate 2025-01-24 is before fromDate 2025-01-27"
            )])
        );
    }

    #[test]
    fn wfh_week_overflow_binds_second_level_approver() {
        let request = draft(LeaveType::WorkFromHome, d(2025, 1, 14), d(2025, 1, 15));
        let submitted = submit_with(request, None).unwrap();
        assert_eq!(submitted.second_level_approver_id.as_deref(), Some("EMP020"));
    }

    #[test]
    fn submit_twice_is_invalid_state() {
        let err = submit_with(pending(), None).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::InvalidState { action: "submit", .. }));
    }

    #[test]
    fn only_bound_approver_can_decide() {
        let request = pending();
        let err = decide(&request, "EMP999", DecisionOutcome::Approved, None, now()).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::Unauthorized(_)));
        assert_eq!(request.status, LeaveStatus::Pending);

        let approved = decide(&request, "EMP010", DecisionOutcome::Approved, Some("ok".into()), now()).unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(approved.decided_by.as_deref(), Some("EMP010"));
        assert_eq!(approved.approver_comment.as_deref(), Some("ok"));
        assert_eq!(approved.decided_at, Some(now()));
    }

    #[test]
    fn decisions_are_terminal() {
        let rejected = decide(&pending(), "EMP010", DecisionOutcome::Rejected, None, now()).unwrap();
        let err = decide(&rejected, "EMP010", DecisionOutcome::Approved, None, now()).unwrap_err();
        assert_eq!(err, LeaveTransitionError::InvalidState { action: "decide", status: LeaveStatus::Rejected });

        let err = cancel(&rejected, "EMP001", false, now()).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::InvalidState { .. }));
    }

    #[test]
    fn second_level_request_needs_second_level_approval() {
        let request = submit_with(draft(LeaveType::WorkFromHome, d(2025, 1, 14), d(2025, 1, 15)), None).unwrap();

        let err = decide(&request, "EMP010", DecisionOutcome::Approved, None, now()).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::Unauthorized(_)));

        // o primeiro nível ainda pode recusar
        assert!(decide(&request, "EMP010", DecisionOutcome::Rejected, None, now()).is_ok());
        assert!(decide(&request, "EMP020", DecisionOutcome::Approved, None, now()).is_ok());
    }

    #[test]
    fn missed_entry_approval_requires_logged_time_check() {
        let mut request = draft(LeaveType::MissedDoorEntry, d(2025, 1, 2), d(2025, 1, 2));
        request = submit_with(request, None).unwrap();

        let err = decide(&request, "EMP010", DecisionOutcome::Approved, None, now()).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::PolicyRejected(ref v) if v[0].rule_id == RuleId::LoggedTimeUnchecked));

        let checked = set_checks(&request, "EMP010", Some(true), None).unwrap();
        assert!(decide(&checked, "EMP010", DecisionOutcome::Approved, None, now()).is_ok());
    }

    #[test]
    fn set_checks_is_approver_only() {
        let err = set_checks(&pending(), "EMP001", Some(true), None).unwrap_err();
        assert!(matches!(err, LeaveTransitionError::Unauthorized(_)));
    }

    #[test]
    fn cancel_by_requester_or_hr() {
        let request = pending();
        assert!(matches!(
            cancel(&request, "EMP010", false, now()),
            Err(LeaveTransitionError::Unauthorized(_))
        ));

        let cancelled = cancel(&request, "EMP001", false, now()).unwrap();
        assert_eq!(cancelled.status, LeaveStatus::Cancelled);
        assert_eq!(cancelled.cancelled_at, Some(now()));

        let approved = decide(&request, "EMP010", DecisionOutcome::Approved, None, now()).unwrap();
        assert!(cancel(&approved, "HR001", true, now()).is_ok());
    }
}
