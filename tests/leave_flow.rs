// tests/leave_flow.rs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tokio::sync::Notify;

use hr_backend::{
    common::{error::AppError, i18n::I18nStore},
    config::{AppState, Settings},
    db::{BalanceSource, EmployeeStore, InMemoryStore, LeaveStore, Stores},
    engine::policy::RuleId,
    middleware::actor::{Actor, Role},
    models::{
        employee::Employee,
        holiday::Holiday,
        leave::{
            ApprovalChecksPayload, DecideLeavePayload, DecisionOutcome, DurationMode, LeaveRequest,
            LeaveRequestInput, LeaveStatus, LeaveType,
        },
    },
};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

// Segunda-feira, 2 de junho de 2025, 10h
fn now() -> NaiveDateTime {
    d(2025, 6, 2).and_hms_opt(10, 0, 0).unwrap()
}

fn employee(id: &str, name: &str, joined: NaiveDate, approver: Option<&str>) -> Employee {
    Employee {
        employee_id: id.into(),
        name: name.into(),
        joining_date: joined,
        is_lateral_hire: false,
        approver_id: approver.map(str::to_string),
        warning_count: 0,
        policy_acknowledgments: BTreeMap::new(),
    }
}

async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.put_employee(employee("EMP100", "Marina Costa", d(2018, 3, 1), None)).await;
    store.put_employee(employee("EMP010", "Rafael Lima", d(2020, 7, 15), Some("EMP100"))).await;
    store.put_employee(employee("EMP001", "Ana Souza", d(2023, 2, 1), Some("EMP010"))).await;
    store.put_employee(employee("EMP002", "Bruno Alves", d(2025, 1, 6), Some("EMP010"))).await;
    store
        .put_holiday(Holiday { date: d(2025, 8, 15), name: "Independence Day".into() })
        .await;
    store
}

fn state_with(stores: Stores, timeout: Duration) -> AppState {
    let settings = Settings {
        store_timeout: timeout,
        required_policies: vec!["leave-policy".into(), "wfh-policy".into()],
        ..Settings::default()
    };
    AppState::build(settings, stores, I18nStore::embedded().unwrap())
}

fn app(store: &Arc<InMemoryStore>) -> AppState {
    state_with(Stores::in_memory(store.clone()), Duration::from_secs(2))
}

fn input(leave_type: LeaveType, from: NaiveDate, to: NaiveDate) -> LeaveRequestInput {
    LeaveRequestInput {
        employee_id: None,
        leave_type,
        from_date: from,
        to_date: to,
        duration_mode: DurationMode::FullDay,
        reason: "assuntos pessoais".into(),
        hand_over_comments: None,
        comp_off_transactions: Vec::new(),
        customer_holiday_worked_date: None,
        shift_start_from_time: None,
        customer_approved: false,
    }
}

fn ana() -> Actor {
    Actor::new("EMP001", Role::Employee)
}

fn rafael() -> Actor {
    Actor::new("EMP010", Role::Approver)
}

fn marina() -> Actor {
    Actor::new("EMP100", Role::Approver)
}

fn hr() -> Actor {
    Actor::new("HR001", Role::Hr)
}

fn rule_ids(err: AppError) -> Vec<RuleId> {
    match err {
        AppError::PolicyRejected(violations) => violations.into_iter().map(|v| v.rule_id).collect(),
        other => panic!("esperava PolicyRejected, veio {other:?}"),
    }
}

async fn submit(app: &AppState, actor: &Actor, input: LeaveRequestInput) -> Result<LeaveRequest, AppError> {
    app.leave_service.submit(actor, input, now()).await
}

fn decision(outcome: DecisionOutcome) -> DecideLeavePayload {
    DecideLeavePayload { outcome, comment: Some("ok".into()) }
}

#[tokio::test]
async fn privilege_without_enough_balance_becomes_unpaid() {
    let store = seeded_store().await;
    store.set_balance("EMP001", LeaveType::Privilege, Decimal::ONE).await;
    let app = app(&store);

    // seg 16 .. qua 18: 3 dias úteis, 14 dias de antecedência
    let submitted = submit(&app, &ana(), input(LeaveType::Privilege, d(2025, 6, 16), d(2025, 6, 18)))
        .await
        .unwrap();

    assert_eq!(submitted.status, LeaveStatus::Pending);
    assert_eq!(submitted.leave_type, LeaveType::Unpaid);
    assert_eq!(submitted.converted_from, Some(LeaveType::Privilege));
    assert_eq!(submitted.chargeable_days, Decimal::from(3));
    assert_eq!(submitted.approver_id.as_deref(), Some("EMP010"));
}

#[tokio::test]
async fn short_notice_is_reported_together_with_balance() {
    let store = seeded_store().await;
    let app = app(&store);

    let err = submit(&app, &ana(), input(LeaveType::Privilege, d(2025, 6, 4), d(2025, 6, 4)))
        .await
        .unwrap_err();

    let ids = rule_ids(err);
    assert!(ids.contains(&RuleId::PrivilegeNotice));
    assert!(ids.contains(&RuleId::InsufficientBalance));
    assert!(app.leave_service.list_for_employee(&ana(), "EMP001").await.unwrap().is_empty());
}

#[tokio::test]
async fn holiday_inside_the_range_is_not_charged() {
    let store = seeded_store().await;
    store.set_balance("EMP001", LeaveType::Privilege, Decimal::from(10)).await;
    let app = app(&store);

    // seg 11 .. sex 15 de agosto, 15 é feriado
    let submitted = submit(&app, &ana(), input(LeaveType::Privilege, d(2025, 8, 11), d(2025, 8, 15)))
        .await
        .unwrap();

    assert_eq!(submitted.leave_type, LeaveType::Privilege);
    assert_eq!(submitted.chargeable_days, Decimal::from(4));
}

#[tokio::test]
async fn work_from_home_on_monday_is_rejected() {
    let store = seeded_store().await;
    let app = app(&store);

    let err = submit(&app, &ana(), input(LeaveType::WorkFromHome, d(2025, 6, 9), d(2025, 6, 9)))
        .await
        .unwrap_err();

    assert_eq!(rule_ids(err), vec![RuleId::WfhMonday]);
}

#[tokio::test]
async fn work_from_home_needs_a_year_of_tenure() {
    let store = seeded_store().await;
    let app = app(&store);
    let bruno = Actor::new("EMP002", Role::Employee);

    let err = submit(&app, &bruno, input(LeaveType::WorkFromHome, d(2025, 6, 10), d(2025, 6, 10)))
        .await
        .unwrap_err();
    assert_eq!(rule_ids(err), vec![RuleId::WfhTenure]);

    let types = app.approver_service.leave_types(&bruno, "EMP002", now().date()).await.unwrap();
    assert!(!types.leave_types.contains(&LeaveType::WorkFromHome));
    assert_eq!(types.approver_id.as_deref(), Some("EMP010"));
}

#[tokio::test]
async fn two_wfh_days_in_a_week_need_the_second_level() {
    let store = seeded_store().await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::WorkFromHome, d(2025, 6, 17), d(2025, 6, 18)))
        .await
        .unwrap();
    assert_eq!(submitted.second_level_approver_id.as_deref(), Some("EMP100"));

    // o primeiro nível não aprova sozinho
    let err = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let approved = app
        .leave_service
        .decide(&marina(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.decided_by.as_deref(), Some("EMP100"));
}

#[tokio::test]
async fn only_the_bound_approver_can_decide() {
    let store = seeded_store().await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::Sick, d(2025, 6, 3), d(2025, 6, 3)))
        .await
        .unwrap();

    let outsider = Actor::new("EMP002", Role::Approver);
    let err = app
        .leave_service
        .decide(&outsider, submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let approved = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);

    // decidido é final
    let err = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Rejected), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn missed_door_entry_needs_logged_time_check_before_approval() {
    let store = seeded_store().await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::MissedDoorEntry, d(2025, 5, 30), d(2025, 5, 30)))
        .await
        .unwrap();

    let err = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert_eq!(rule_ids(err), vec![RuleId::LoggedTimeUnchecked]);

    let checks = ApprovalChecksPayload { logged_time_checked: Some(true), customer_approved: None };
    app.leave_service.set_checks(&rafael(), submitted.id, checks).await.unwrap();

    let approved = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
}

#[tokio::test]
async fn reassignment_moves_pending_requests_to_the_new_approver() {
    let store = seeded_store().await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::Sick, d(2025, 6, 5), d(2025, 6, 6)))
        .await
        .unwrap();

    let response = app.approver_service.reassign(&hr(), "EMP001", "EMP100").await.unwrap();
    assert_eq!(response.rebound_requests, 1);

    let queue = app.leave_service.pending_for_approver(&marina(), "EMP100").await.unwrap();
    assert_eq!(queue.iter().map(|r| r.id).collect::<Vec<_>>(), vec![submitted.id]);

    // o aprovador antigo perdeu o vínculo
    let err = app
        .leave_service
        .decide(&rafael(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let approved = app
        .leave_service
        .decide(&marina(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
}

#[tokio::test]
async fn reassignment_moves_the_second_level_to_the_new_chain() {
    let store = seeded_store().await;
    store.put_employee(employee("EMP200", "Paula Reis", d(2016, 5, 2), None)).await;
    store.put_employee(employee("EMP020", "Caio Nunes", d(2019, 9, 9), Some("EMP200"))).await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::WorkFromHome, d(2025, 6, 17), d(2025, 6, 18)))
        .await
        .unwrap();
    assert_eq!(submitted.second_level_approver_id.as_deref(), Some("EMP100"));

    app.approver_service.reassign(&hr(), "EMP001", "EMP020").await.unwrap();

    // a cadeia antiga não decide mais
    let err = app
        .leave_service
        .decide(&marina(), submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let caio = Actor::new("EMP020", Role::Approver);
    let err = app
        .leave_service
        .decide(&caio, submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let paula = Actor::new("EMP200", Role::Approver);
    let approved = app
        .leave_service
        .decide(&paula, submitted.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap();
    assert_eq!(approved.status, LeaveStatus::Approved);
    assert_eq!(approved.decided_by.as_deref(), Some("EMP200"));
}

#[tokio::test]
async fn reassignment_is_reserved_to_hr_and_rejects_self_approval() {
    let store = seeded_store().await;
    let app = app(&store);

    let err = app.approver_service.reassign(&rafael(), "EMP001", "EMP100").await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let err = app.approver_service.reassign(&hr(), "EMP001", "EMP001").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = app.approver_service.reassign(&hr(), "EMP001", "EMP999").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn cancel_is_allowed_for_requester_and_hr_only() {
    let store = seeded_store().await;
    let app = app(&store);

    let submitted = submit(&app, &ana(), input(LeaveType::Sick, d(2025, 6, 3), d(2025, 6, 3)))
        .await
        .unwrap();

    let err = app.leave_service.cancel(&rafael(), submitted.id, now()).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));

    let cancelled = app.leave_service.cancel(&ana(), submitted.id, now()).await.unwrap();
    assert_eq!(cancelled.status, LeaveStatus::Cancelled);

    let err = app.leave_service.cancel(&hr(), submitted.id, now()).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidState(_)));
}

#[tokio::test]
async fn warnings_escalate_at_four_and_stay_there() {
    let store = seeded_store().await;
    let app = app(&store);

    let mut counts = Vec::new();
    for _ in 0..5 {
        counts.push(app.compliance_service.tick("EMP001").await.unwrap());
    }

    let values: Vec<i16> = counts.iter().map(|w| w.warning_count).collect();
    assert_eq!(values, vec![1, 2, 3, 4, 4]);
    assert!(!counts[2].escalated);
    assert!(counts[3].escalated);

    // aceite depois do escalonamento não zera o contador
    app.compliance_service.record_acknowledgment(&ana(), "EMP001", "leave-policy").await.unwrap();
    let status = app
        .compliance_service
        .record_acknowledgment(&ana(), "EMP001", "wfh-policy")
        .await
        .unwrap();
    assert!(status.fully_acknowledged);
    assert_eq!(status.warning_count, 4);
    assert!(status.escalated);
}

#[tokio::test]
async fn full_acknowledgment_resets_warnings_before_escalation() {
    let store = seeded_store().await;
    let app = app(&store);

    app.compliance_service.tick("EMP001").await.unwrap();
    app.compliance_service.tick("EMP001").await.unwrap();

    let partial = app
        .compliance_service
        .record_acknowledgment(&ana(), "EMP001", "leave-policy")
        .await
        .unwrap();
    assert_eq!(partial.pending_policies, vec!["wfh-policy".to_string()]);
    assert_eq!(partial.warning_count, 2);

    let full = app
        .compliance_service
        .record_acknowledgment(&ana(), "EMP001", "wfh-policy")
        .await
        .unwrap();
    assert_eq!(full.warning_count, 0);

    // sem pendência, o tick não soma
    let tick = app.compliance_service.tick("EMP001").await.unwrap();
    assert_eq!(tick.warning_count, 0);
}

#[tokio::test]
async fn extreme_dates_do_not_break_submission() {
    let store = seeded_store().await;
    let app = app(&store);

    let at_the_end = submit(&app, &ana(), input(LeaveType::Sick, NaiveDate::MAX, NaiveDate::MAX))
        .await
        .unwrap();
    assert_eq!(at_the_end.status, LeaveStatus::Pending);

    let at_the_start = submit(&app, &ana(), input(LeaveType::Sick, NaiveDate::MIN, NaiveDate::MIN))
        .await
        .unwrap();
    assert_eq!(at_the_start.status, LeaveStatus::Pending);

    let err = submit(&app, &ana(), input(LeaveType::Sick, NaiveDate::MIN, NaiveDate::MAX))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // um ano inteiro ainda é aceito
    submit(&app, &ana(), input(LeaveType::Sick, d(2026, 1, 1), d(2026, 12, 31)))
        .await
        .unwrap();
}

// Mantém os próximos acessos ao colaborador com aceites antigos
struct StaleEmployees {
    inner: Arc<InMemoryStore>,
}

#[async_trait]
impl EmployeeStore for StaleEmployees {
    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        let employee = self.inner.find_employee(employee_id).await?;
        Ok(employee.map(|e| Employee { policy_acknowledgments: BTreeMap::new(), ..e }))
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        self.inner.list_employees().await
    }

    async fn reassign_approver(&self, employee_id: &str, new_approver_id: &str) -> Result<u64, AppError> {
        self.inner.reassign_approver(employee_id, new_approver_id).await
    }
}

#[tokio::test]
async fn tick_reads_acknowledgments_under_the_counter_lock() {
    let store = seeded_store().await;
    let app = app(&store);
    app.compliance_service.record_acknowledgment(&ana(), "EMP001", "leave-policy").await.unwrap();
    app.compliance_service.record_acknowledgment(&ana(), "EMP001", "wfh-policy").await.unwrap();

    // leitura do colaborador anterior ao aceite
    let mut stores = Stores::in_memory(store.clone());
    stores.employees = Arc::new(StaleEmployees { inner: store.clone() });
    let scheduler = state_with(stores, Duration::from_secs(2));

    let tick = scheduler.compliance_service.tick("EMP001").await.unwrap();
    assert_eq!(tick.warning_count, 0);
    assert!(!tick.escalated);
}

// Segura a primeira consulta de saldo até o teste liberar
struct PausedBalance {
    first_call: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl PausedBalance {
    fn new() -> Self {
        Self { first_call: AtomicBool::new(true), entered: Notify::new(), release: Notify::new() }
    }
}

#[async_trait]
impl BalanceSource for PausedBalance {
    async fn available_balance(&self, _employee_id: &str, _leave_type: LeaveType) -> Result<Option<Decimal>, AppError> {
        if self.first_call.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(Some(Decimal::from(30)))
    }
}

#[tokio::test]
async fn submission_racing_a_reassignment_never_binds_the_old_approver() {
    let store = seeded_store().await;
    let paused = Arc::new(PausedBalance::new());
    let mut stores = Stores::in_memory(store.clone());
    stores.balances = paused.clone();
    let app = state_with(stores, Duration::from_secs(2));

    let ana_actor = ana();
    let submitting = submit(&app, &ana_actor, input(LeaveType::Privilege, d(2025, 6, 16), d(2025, 6, 16)));
    let reassigning = async {
        paused.entered.notified().await;
        let response = app.approver_service.reassign(&hr(), "EMP001", "EMP100").await.unwrap();
        paused.release.notify_one();
        response
    };
    let (submitted, response) = tokio::join!(submitting, reassigning);

    assert_eq!(response.rebound_requests, 0);
    let err = submitted.unwrap_err();
    assert!(matches!(err, AppError::TransientFailure(_)));
    assert!(err.is_retryable());
    assert!(store.leaves_for_employee("EMP001").await.unwrap().is_empty());

    // nova tentativa já sai com o aprovador atual
    let retried = submit(&app, &ana(), input(LeaveType::Privilege, d(2025, 6, 16), d(2025, 6, 16)))
        .await
        .unwrap();
    assert_eq!(retried.approver_id.as_deref(), Some("EMP100"));

    let err = app
        .leave_service
        .decide(&rafael(), retried.id, decision(DecisionOutcome::Approved), now())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)));
}

struct SlowBalance;

#[async_trait]
impl BalanceSource for SlowBalance {
    async fn available_balance(&self, _employee_id: &str, _leave_type: LeaveType) -> Result<Option<Decimal>, AppError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(Some(Decimal::from(30)))
    }
}

#[tokio::test]
async fn slow_balance_source_surfaces_a_retryable_failure() {
    let store = seeded_store().await;
    let mut stores = Stores::in_memory(store.clone());
    stores.balances = Arc::new(SlowBalance);
    let app = state_with(stores, Duration::from_millis(50));

    let err = submit(&app, &ana(), input(LeaveType::Privilege, d(2025, 6, 16), d(2025, 6, 16)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TransientFailure(_)));
    assert!(err.is_retryable());
    assert!(store.leaves_for_employee("EMP001").await.unwrap().is_empty());
}
