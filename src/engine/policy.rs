// src/engine/policy.rs

//! Regras de negócio por tipo de licença.
//!
//! Cada `LeaveType` tem uma lista ordenada de predicados puros sobre
//! `(pedido, colaborador, agora, contexto)`. Todas as regras rodam; as
//! violações são acumuladas para o chamador mostrar a lista completa.
//! Adicionar um tipo novo = uma variante + uma lista de regras.

use std::collections::HashMap;

use chrono::{Datelike, IsoWeek, Months, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::calendar::HolidayCalendar;
use crate::models::employee::Employee;
use crate::models::leave::{DurationMode, LeaveRequest, LeaveType};

pub const PRIVILEGE_NOTICE_DAYS: i64 = 7;
pub const WFH_MAX_SPAN_DAYS: i64 = 5;
pub const WFH_WEEKLY_NOTICE_DAYS: i64 = 7;
pub const WFH_MIN_TENURE_DAYS: i64 = 365;
pub const WFH_REPEAT_WINDOW_MONTHS: u32 = 6;
pub const COMP_OFF_FULL_DAY_HOURS: i64 = 8;
pub const COMP_OFF_HALF_DAY_HOURS: i64 = 4;

fn full_day_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN)
}

fn half_day_cutoff() -> NaiveTime {
    NaiveTime::from_hms_opt(11, 59, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleId {
    InvalidRange,
    HalfDaySpan,
    DurationNotAllowed,
    PrivilegeNotice,
    InsufficientBalance,
    MissedEntryFutureDate,
    CompOffTransactionsRequired,
    CompOffInsufficientHours,
    CustomerHolidayWorkedDate,
    WfhMonday,
    WfhMaxConsecutive,
    WfhSameDayCutoff,
    WfhWeeklyNotice,
    WfhTenure,
    WfhFiveDayRepeat,
    ShiftStartRequired,
    LoggedTimeUnchecked,
    CustomerApprovalMissing,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::InvalidRange => "INVALID_RANGE",
            RuleId::HalfDaySpan => "HALF_DAY_SPAN",
            RuleId::DurationNotAllowed => "DURATION_NOT_ALLOWED",
            RuleId::PrivilegeNotice => "PRIVILEGE_NOTICE",
            RuleId::InsufficientBalance => "INSUFFICIENT_BALANCE",
            RuleId::MissedEntryFutureDate => "MISSED_ENTRY_FUTURE_DATE",
            RuleId::CompOffTransactionsRequired => "COMP_OFF_TRANSACTIONS_REQUIRED",
            RuleId::CompOffInsufficientHours => "COMP_OFF_INSUFFICIENT_HOURS",
            RuleId::CustomerHolidayWorkedDate => "CUSTOMER_HOLIDAY_WORKED_DATE",
            RuleId::WfhMonday => "WFH_MONDAY",
            RuleId::WfhMaxConsecutive => "WFH_MAX_CONSECUTIVE",
            RuleId::WfhSameDayCutoff => "WFH_SAME_DAY_CUTOFF",
            RuleId::WfhWeeklyNotice => "WFH_WEEKLY_NOTICE",
            RuleId::WfhTenure => "WFH_TENURE",
            RuleId::WfhFiveDayRepeat => "WFH_FIVE_DAY_REPEAT",
            RuleId::ShiftStartRequired => "SHIFT_START_REQUIRED",
            RuleId::LoggedTimeUnchecked => "LOGGED_TIME_UNCHECKED",
            RuleId::CustomerApprovalMissing => "CUSTOMER_APPROVAL_MISSING",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyViolation {
    pub rule_id: RuleId,
    pub message: String,
}

impl PolicyViolation {
    pub fn new(rule_id: RuleId, message: impl Into<String>) -> Self {
        Self { rule_id, message: message.into() }
    }
}

/// Tudo que uma regra pode consultar.
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub request: &'a LeaveRequest,
    pub employee: &'a Employee,
    pub now: NaiveDateTime,
    pub calendar: &'a HolidayCalendar,
    // Saldo vem de fora (folha de pagamento); só existe para tipos com saldo
    pub available_balance: Option<Decimal>,
    // Outros pedidos do mesmo colaborador
    pub history: &'a [LeaveRequest],
}

impl PolicyContext<'_> {
    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    fn notice_days(&self) -> i64 {
        (self.request.from_date - self.today()).num_days()
    }

    fn live_wfh_history(&self) -> impl Iterator<Item = &LeaveRequest> {
        let own_id = self.request.id;
        self.history.iter().filter(move |other| {
            other.id != own_id && other.leave_type == LeaveType::WorkFromHome && other.status.is_live()
        })
    }
}

pub type Rule = fn(&PolicyContext<'_>) -> Option<PolicyViolation>;

const COMMON_RULES: &[Rule] = &[range_is_ordered, half_day_is_single_date, duration_is_allowed];

const PRIVILEGE_RULES: &[Rule] = &[privilege_notice, privilege_balance];
const MISSED_DOOR_ENTRY_RULES: &[Rule] = &[missed_entry_not_in_future];
const COMP_OFF_RULES: &[Rule] = &[comp_off_has_transactions, comp_off_hours];
const CUSTOMER_HOLIDAY_RULES: &[Rule] = &[customer_holiday_worked_before];
const WFH_RULES: &[Rule] = &[
    wfh_no_monday,
    wfh_max_span,
    wfh_same_day_cutoff,
    wfh_weekly_notice,
    wfh_tenure,
    wfh_five_day_repeat,
];
const EXEMPT_RULES: &[Rule] = &[exempt_has_shift_start];
const NO_RULES: &[Rule] = &[];

pub fn rules_for(leave_type: LeaveType) -> &'static [Rule] {
    match leave_type {
        LeaveType::Privilege => PRIVILEGE_RULES,
        LeaveType::MissedDoorEntry => MISSED_DOOR_ENTRY_RULES,
        LeaveType::CustomerApprovedCompOff => COMP_OFF_RULES,
        LeaveType::CustomerHoliday => CUSTOMER_HOLIDAY_RULES,
        LeaveType::WorkFromHome => WFH_RULES,
        LeaveType::ExemptLeave => EXEMPT_RULES,
        LeaveType::Sick | LeaveType::Unpaid => NO_RULES,
    }
}

/// Avalia todas as regras do tipo do pedido, sem parar na primeira falha.
pub fn validate(ctx: &PolicyContext<'_>) -> Result<(), Vec<PolicyViolation>> {
    let violations: Vec<PolicyViolation> = COMMON_RULES
        .iter()
        .chain(rules_for(ctx.request.leave_type))
        .filter_map(|rule| rule(ctx))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Verdadeiro quando o único impedimento é saldo insuficiente num tipo com saldo.
pub fn is_balance_only_failure(leave_type: LeaveType, violations: &[PolicyViolation]) -> bool {
    leave_type.is_balance_gated()
        && !violations.is_empty()
        && violations.iter().all(|v| v.rule_id == RuleId::InsufficientBalance)
}

/// WFH com mais de um dia na mesma semana ISO precisa de aprovador de segundo nível.
pub fn requires_second_level(ctx: &PolicyContext<'_>) -> bool {
    ctx.request.leave_type == LeaveType::WorkFromHome && wfh_week_overflow(ctx)
}

/// Pré-requisitos verificados na aprovação (não na submissão).
pub fn approval_prerequisites(request: &LeaveRequest) -> Vec<PolicyViolation> {
    let mut violations = Vec::new();

    if request.leave_type == LeaveType::MissedDoorEntry && !request.logged_time_checked {
        violations.push(PolicyViolation::new(
            RuleId::LoggedTimeUnchecked,
            "approver must confirm the logged time before approving a missed door entry",
        ));
    }

    if request.leave_type == LeaveType::CustomerApprovedCompOff && !request.customer_approved {
        violations.push(PolicyViolation::new(
            RuleId::CustomerApprovalMissing,
            "customer approval must be acknowledged before the comp-off is approved",
        ));
    }

    violations
}

// =============================================================================
//  REGRAS COMUNS
// =============================================================================

fn range_is_ordered(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let r = ctx.request;
    (r.to_date < r.from_date).then(|| {
        PolicyViolation::new(
            RuleId::InvalidRange,
            format!("toDate {} is before fromDate {}", r.to_date, r.from_date),
        )
    })
}

fn half_day_is_single_date(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let r = ctx.request;
    (r.duration_mode == DurationMode::HalfDay && r.from_date != r.to_date).then(|| {
        PolicyViolation::new(RuleId::HalfDaySpan, "a half-day leave must start and end on the same date")
    })
}

fn duration_is_allowed(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let r = ctx.request;
    (!r.leave_type.allows(r.duration_mode)).then(|| {
        PolicyViolation::new(
            RuleId::DurationNotAllowed,
            format!("{} only accepts full-day requests", r.leave_type.as_str()),
        )
    })
}

// =============================================================================
//  PRIVILEGE
// =============================================================================

fn privilege_notice(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    (ctx.notice_days() < PRIVILEGE_NOTICE_DAYS).then(|| {
        PolicyViolation::new(
            RuleId::PrivilegeNotice,
            format!("privilege leave must be applied at least {PRIVILEGE_NOTICE_DAYS} days in advance"),
        )
    })
}

fn privilege_balance(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let balance = ctx.available_balance.unwrap_or(Decimal::ZERO);
    (balance < ctx.request.chargeable_days).then(|| {
        PolicyViolation::new(
            RuleId::InsufficientBalance,
            format!(
                "remaining balance {} is lower than the {} chargeable days requested",
                balance, ctx.request.chargeable_days
            ),
        )
    })
}

// =============================================================================
//  MISSED DOOR ENTRY
// =============================================================================

fn missed_entry_not_in_future(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    (ctx.request.from_date > ctx.today()).then(|| {
        PolicyViolation::new(RuleId::MissedEntryFutureDate, "a missed door entry cannot be in the future")
    })
}

// =============================================================================
//  CUSTOMER APPROVED COMP-OFF
// =============================================================================

fn comp_off_has_transactions(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    ctx.request.comp_off_transactions.is_empty().then(|| {
        PolicyViolation::new(
            RuleId::CompOffTransactionsRequired,
            "at least one worked-day transaction is required for a comp-off",
        )
    })
}

fn comp_off_hours(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let required = match ctx.request.duration_mode {
        DurationMode::FullDay => Decimal::from(COMP_OFF_FULL_DAY_HOURS),
        DurationMode::HalfDay => Decimal::from(COMP_OFF_HALF_DAY_HOURS),
    };

    let short: Vec<String> = ctx
        .request
        .comp_off_transactions
        .iter()
        .filter(|t| t.hours < required)
        .map(|t| format!("{} ({}h)", t.date, t.hours))
        .collect();

    (!short.is_empty()).then(|| {
        PolicyViolation::new(
            RuleId::CompOffInsufficientHours,
            format!("each comp-off transaction needs at least {}h: {}", required, short.join(", ")),
        )
    })
}

// =============================================================================
//  CUSTOMER HOLIDAY
// =============================================================================

fn customer_holiday_worked_before(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    match ctx.request.customer_holiday_worked_date {
        Some(worked) if worked < ctx.request.from_date => None,
        Some(worked) => Some(PolicyViolation::new(
            RuleId::CustomerHolidayWorkedDate,
            format!("worked date {} must be before the leave start {}", worked, ctx.request.from_date),
        )),
        None => Some(PolicyViolation::new(
            RuleId::CustomerHolidayWorkedDate,
            "the customer holiday worked date is required",
        )),
    }
}

// =============================================================================
//  WORK FROM HOME
// =============================================================================

fn wfh_no_monday(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    let r = ctx.request;
    let monday = r
        .from_date
        .iter_days()
        .take_while(|day| *day <= r.to_date)
        .find(|day| day.weekday() == Weekday::Mon);

    monday.map(|day| {
        PolicyViolation::new(RuleId::WfhMonday, format!("work from home is not allowed on Mondays ({day})"))
    })
}

fn wfh_max_span(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    (ctx.request.span_days() > WFH_MAX_SPAN_DAYS).then(|| {
        PolicyViolation::new(
            RuleId::WfhMaxConsecutive,
            format!("work from home is limited to {WFH_MAX_SPAN_DAYS} consecutive days"),
        )
    })
}

fn wfh_same_day_cutoff(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    if ctx.request.from_date != ctx.today() {
        return None;
    }

    let cutoff = match ctx.request.duration_mode {
        DurationMode::FullDay => full_day_cutoff(),
        DurationMode::HalfDay => half_day_cutoff(),
    };

    (ctx.now.time() >= cutoff).then(|| {
        PolicyViolation::new(
            RuleId::WfhSameDayCutoff,
            format!("same-day work from home must be requested before {}", cutoff.format("%H:%M")),
        )
    })
}

fn wfh_weekly_notice(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    (wfh_week_overflow(ctx) && ctx.notice_days() < WFH_WEEKLY_NOTICE_DAYS).then(|| {
        PolicyViolation::new(
            RuleId::WfhWeeklyNotice,
            format!(
                "more than one work-from-home day in a week must be requested {WFH_WEEKLY_NOTICE_DAYS} days in advance"
            ),
        )
    })
}

fn wfh_tenure(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    (ctx.employee.tenure_days(ctx.today()) < WFH_MIN_TENURE_DAYS).then(|| {
        PolicyViolation::new(
            RuleId::WfhTenure,
            "work from home is only available after the first 12 months of tenure",
        )
    })
}

fn wfh_five_day_repeat(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    if ctx.request.span_days() != WFH_MAX_SPAN_DAYS {
        return None;
    }

    let window_start = ctx
        .today()
        .checked_sub_months(Months::new(WFH_REPEAT_WINDOW_MONTHS))
        .unwrap_or(NaiveDate::MIN);

    let previous = ctx
        .live_wfh_history()
        .find(|other| other.span_days() == WFH_MAX_SPAN_DAYS && other.from_date >= window_start);

    previous.map(|other| {
        PolicyViolation::new(
            RuleId::WfhFiveDayRepeat,
            format!(
                "a {WFH_MAX_SPAN_DAYS}-day work from home was already taken from {} within the last {WFH_REPEAT_WINDOW_MONTHS} months",
                other.from_date
            ),
        )
    })
}

/// Dias de WFH efetivos (úteis) de um pedido.
fn wfh_days<'a>(calendar: &'a HolidayCalendar, request: &'a LeaveRequest) -> impl Iterator<Item = NaiveDate> + 'a {
    request
        .from_date
        .iter_days()
        .take_while(move |day| *day <= request.to_date)
        .filter(move |day| calendar.is_working_day(*day))
}

fn wfh_week_overflow(ctx: &PolicyContext<'_>) -> bool {
    let mut per_week: HashMap<IsoWeek, usize> = HashMap::new();
    for day in wfh_days(ctx.calendar, ctx.request) {
        *per_week.entry(day.iso_week()).or_default() += 1;
    }

    for other in ctx.live_wfh_history() {
        for day in wfh_days(ctx.calendar, other) {
            if let Some(count) = per_week.get_mut(&day.iso_week()) {
                *count += 1;
            }
        }
    }

    per_week.values().any(|count| *count > 1)
}

// =============================================================================
//  EXEMPT
// =============================================================================

fn exempt_has_shift_start(ctx: &PolicyContext<'_>) -> Option<PolicyViolation> {
    ctx.request.shift_start_from_time.is_none().then(|| {
        PolicyViolation::new(RuleId::ShiftStartRequired, "exempt leave requires the shift start time")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::holiday::Holiday;
    use crate::models::leave::{CompOffTransaction, LeaveRequestInput, LeaveStatus};
    use std::collections::BTreeMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, min: u32) -> NaiveDateTime {
        date.and_hms_opt(h, min, 0).unwrap()
    }

    fn employee(joined: NaiveDate) -> Employee {
        Employee {
            employee_id: "EMP001".into(),
            name: "Ana Souza".into(),
            joining_date: joined,
            is_lateral_hire: false,
            approver_id: Some("EMP010".into()),
            warning_count: 0,
            policy_acknowledgments: BTreeMap::new(),
        }
    }

    fn request(leave_type: LeaveType, from: NaiveDate, to: NaiveDate, mode: DurationMode) -> LeaveRequest {
        let input = LeaveRequestInput {
            employee_id: None,
            leave_type,
            from_date: from,
            to_date: to,
            duration_mode: mode,
            reason: "motivo".into(),
            hand_over_comments: None,
            comp_off_transactions: vec![],
            customer_holiday_worked_date: None,
            shift_start_from_time: None,
            customer_approved: false,
        };
        let mut r = LeaveRequest::draft("EMP001", input, at(d(2025, 1, 1), 8, 0));
        r.chargeable_days = Decimal::ONE;
        r
    }

    fn rule_ids(result: Result<(), Vec<PolicyViolation>>) -> Vec<RuleId> {
        result.err().unwrap_or_default().into_iter().map(|v| v.rule_id).collect()
    }

    struct Env {
        employee: Employee,
        calendar: HolidayCalendar,
        now: NaiveDateTime,
        balance: Option<Decimal>,
        history: Vec<LeaveRequest>,
    }

    impl Env {
        fn new(now: NaiveDateTime) -> Self {
            Self {
                employee: employee(d(2020, 1, 1)),
                calendar: HolidayCalendar::new(vec![Holiday { date: d(2025, 1, 26), name: "Republic Day".into() }]),
                now,
                balance: None,
                history: vec![],
            }
        }

        fn ctx<'a>(&'a self, r: &'a LeaveRequest) -> PolicyContext<'a> {
            PolicyContext {
                request: r,
                employee: &self.employee,
                now: self.now,
                calendar: &self.calendar,
                available_balance: self.balance,
                history: &self.history,
            }
        }
    }

    #[test]
    fn sick_leave_has_only_common_rules() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let r = request(LeaveType::Sick, d(2025, 3, 3), d(2025, 3, 4), DurationMode::FullDay);
        assert_eq!(validate(&env.ctx(&r)), Ok(()));
    }

    #[test]
    fn reversed_range_is_reported() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let r = request(LeaveType::Sick, d(2025, 3, 5), d(2025, 3, 4), DurationMode::FullDay);
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::InvalidRange]);
    }

    #[test]
    fn privilege_collects_notice_and_balance() {
        let mut env = Env::new(at(d(2025, 3, 3), 10, 0));
        env.balance = Some(Decimal::ZERO);
        let r = request(LeaveType::Privilege, d(2025, 3, 5), d(2025, 3, 5), DurationMode::FullDay);
        let ids = rule_ids(validate(&env.ctx(&r)));
        assert_eq!(ids, vec![RuleId::PrivilegeNotice, RuleId::InsufficientBalance]);
        assert!(!is_balance_only_failure(LeaveType::Privilege, &validate(&env.ctx(&r)).unwrap_err()));
    }

    #[test]
    fn privilege_with_notice_and_no_balance_is_balance_only() {
        let mut env = Env::new(at(d(2025, 3, 3), 10, 0));
        env.balance = Some(Decimal::new(5, 1));
        let r = request(LeaveType::Privilege, d(2025, 3, 17), d(2025, 3, 17), DurationMode::FullDay);
        let violations = validate(&env.ctx(&r)).unwrap_err();
        assert!(is_balance_only_failure(LeaveType::Privilege, &violations));
        assert!(!is_balance_only_failure(LeaveType::Sick, &violations));
    }

    #[test]
    fn missed_door_entry_rejects_future_and_half_day() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let r = request(LeaveType::MissedDoorEntry, d(2025, 3, 4), d(2025, 3, 4), DurationMode::HalfDay);
        let ids = rule_ids(validate(&env.ctx(&r)));
        assert_eq!(ids, vec![RuleId::DurationNotAllowed, RuleId::MissedEntryFutureDate]);

        let today = request(LeaveType::MissedDoorEntry, d(2025, 3, 3), d(2025, 3, 3), DurationMode::FullDay);
        assert_eq!(validate(&env.ctx(&today)), Ok(()));
    }

    #[test]
    fn comp_off_hours_depend_on_duration() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let mut r = request(LeaveType::CustomerApprovedCompOff, d(2025, 3, 10), d(2025, 3, 10), DurationMode::HalfDay);
        r.comp_off_transactions = vec![CompOffTransaction { date: d(2025, 3, 1), hours: Decimal::from(5) }];
        assert_eq!(validate(&env.ctx(&r)), Ok(()));

        r.duration_mode = DurationMode::FullDay;
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::CompOffInsufficientHours]);

        r.comp_off_transactions.clear();
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::CompOffTransactionsRequired]);
    }

    #[test]
    fn customer_holiday_worked_date_must_precede_leave() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let mut r = request(LeaveType::CustomerHoliday, d(2025, 3, 10), d(2025, 3, 10), DurationMode::FullDay);
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::CustomerHolidayWorkedDate]);

        r.customer_holiday_worked_date = Some(d(2025, 3, 10));
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::CustomerHolidayWorkedDate]);

        r.customer_holiday_worked_date = Some(d(2025, 3, 8));
        assert_eq!(validate(&env.ctx(&r)), Ok(()));
    }

    #[test]
    fn exempt_requires_shift_start() {
        let env = Env::new(at(d(2025, 3, 3), 10, 0));
        let mut r = request(LeaveType::ExemptLeave, d(2025, 3, 10), d(2025, 3, 14), DurationMode::FullDay);
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::ShiftStartRequired]);
        r.shift_start_from_time = NaiveTime::from_hms_opt(14, 0, 0);
        assert_eq!(validate(&env.ctx(&r)), Ok(()));
    }

    #[test]
    fn wfh_with_monday_is_always_rejected() {
        let env = Env::new(at(d(2025, 3, 3), 8, 0));
        // sex 14 .. seg 17
        let r = request(LeaveType::WorkFromHome, d(2025, 3, 14), d(2025, 3, 17), DurationMode::FullDay);
        assert!(rule_ids(validate(&env.ctx(&r))).contains(&RuleId::WfhMonday));

        let monday_only = request(LeaveType::WorkFromHome, d(2025, 3, 17), d(2025, 3, 17), DurationMode::HalfDay);
        assert!(rule_ids(validate(&env.ctx(&monday_only))).contains(&RuleId::WfhMonday));
    }

    #[test]
    fn wfh_tenure_example() {
        let mut env = Env::new(at(d(2025, 6, 1), 10, 0));
        env.employee = employee(d(2025, 1, 1));
        let r = request(LeaveType::WorkFromHome, d(2025, 6, 3), d(2025, 6, 7), DurationMode::FullDay);
        let ids = rule_ids(validate(&env.ctx(&r)));
        assert!(ids.contains(&RuleId::WfhTenure));
        assert!(!ids.contains(&RuleId::WfhMonday));
    }

    #[test]
    fn wfh_span_is_capped_at_five_days() {
        let env = Env::new(at(d(2025, 3, 1), 8, 0));
        let r = request(LeaveType::WorkFromHome, d(2025, 3, 11), d(2025, 3, 16), DurationMode::FullDay);
        assert!(rule_ids(validate(&env.ctx(&r))).contains(&RuleId::WfhMaxConsecutive));
    }

    #[test]
    fn wfh_same_day_cutoffs() {
        let today = d(2025, 3, 4); // terça
        let full = request(LeaveType::WorkFromHome, today, today, DurationMode::FullDay);
        let half = request(LeaveType::WorkFromHome, today, today, DurationMode::HalfDay);

        let early = Env::new(at(today, 9, 29));
        assert_eq!(validate(&early.ctx(&full)), Ok(()));

        let late = Env::new(at(today, 9, 30));
        assert_eq!(rule_ids(validate(&late.ctx(&full))), vec![RuleId::WfhSameDayCutoff]);
        assert_eq!(validate(&late.ctx(&half)), Ok(()));

        let noon = Env::new(at(today, 11, 59));
        assert_eq!(rule_ids(validate(&noon.ctx(&half))), vec![RuleId::WfhSameDayCutoff]);
    }

    #[test]
    fn wfh_two_days_in_a_week_needs_notice_and_second_level() {
        let short = Env::new(at(d(2025, 3, 3), 8, 0));
        // ter 11 + qua 12: dois dias na mesma semana ISO, só 8 dias de antecedência
        let r = request(LeaveType::WorkFromHome, d(2025, 3, 11), d(2025, 3, 12), DurationMode::FullDay);
        assert_eq!(validate(&short.ctx(&r)), Ok(()));
        assert!(requires_second_level(&short.ctx(&r)));

        let late = Env::new(at(d(2025, 3, 6), 8, 0));
        assert_eq!(rule_ids(validate(&late.ctx(&r))), vec![RuleId::WfhWeeklyNotice]);
    }

    #[test]
    fn wfh_week_count_includes_live_history() {
        let mut env = Env::new(at(d(2025, 3, 10), 8, 0));
        let mut earlier = request(LeaveType::WorkFromHome, d(2025, 3, 11), d(2025, 3, 11), DurationMode::FullDay);
        earlier.status = LeaveStatus::Approved;
        env.history.push(earlier);

        let r = request(LeaveType::WorkFromHome, d(2025, 3, 13), d(2025, 3, 13), DurationMode::FullDay);
        assert_eq!(rule_ids(validate(&env.ctx(&r))), vec![RuleId::WfhWeeklyNotice]);

        env.history[0].status = LeaveStatus::Cancelled;
        assert_eq!(validate(&env.ctx(&r)), Ok(()));
        assert!(!requires_second_level(&env.ctx(&r)));
    }

    #[test]
    fn wfh_five_day_request_once_per_six_months() {
        let mut env = Env::new(at(d(2025, 6, 1), 8, 0));
        let mut previous = request(LeaveType::WorkFromHome, d(2025, 2, 4), d(2025, 2, 8), DurationMode::FullDay);
        previous.status = LeaveStatus::Approved;
        env.history.push(previous);

        let r = request(LeaveType::WorkFromHome, d(2025, 6, 10), d(2025, 6, 14), DurationMode::FullDay);
        assert!(rule_ids(validate(&env.ctx(&r))).contains(&RuleId::WfhFiveDayRepeat));

        env.history[0].from_date = d(2024, 11, 5);
        env.history[0].to_date = d(2024, 11, 9);
        assert!(!rule_ids(validate(&env.ctx(&r))).contains(&RuleId::WfhFiveDayRepeat));
    }

    #[test]
    fn approval_prerequisites_by_type() {
        let mut missed = request(LeaveType::MissedDoorEntry, d(2025, 3, 3), d(2025, 3, 3), DurationMode::FullDay);
        assert_eq!(approval_prerequisites(&missed)[0].rule_id, RuleId::LoggedTimeUnchecked);
        missed.logged_time_checked = true;
        assert!(approval_prerequisites(&missed).is_empty());

        let comp_off = request(LeaveType::CustomerApprovedCompOff, d(2025, 3, 3), d(2025, 3, 3), DurationMode::FullDay);
        assert_eq!(approval_prerequisites(&comp_off)[0].rule_id, RuleId::CustomerApprovalMissing);
    }
}
