// src/models/leave.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveType {
    Privilege,
    Sick,
    MissedDoorEntry,
    CustomerApprovedCompOff,
    CustomerHoliday,
    WorkFromHome,
    ExemptLeave,
    Unpaid,
}

impl LeaveType {
    pub const ALL: [LeaveType; 8] = [
        LeaveType::Privilege,
        LeaveType::Sick,
        LeaveType::MissedDoorEntry,
        LeaveType::CustomerApprovedCompOff,
        LeaveType::CustomerHoliday,
        LeaveType::WorkFromHome,
        LeaveType::ExemptLeave,
        LeaveType::Unpaid,
    ];

    /// Tipos que consomem saldo. Saldo insuficiente vira licença não remunerada.
    pub fn is_balance_gated(self) -> bool {
        matches!(self, LeaveType::Privilege)
    }

    pub fn allows(self, mode: DurationMode) -> bool {
        match self {
            LeaveType::MissedDoorEntry => mode == DurationMode::FullDay,
            _ => true,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeaveType::Privilege => "PRIVILEGE",
            LeaveType::Sick => "SICK",
            LeaveType::MissedDoorEntry => "MISSED_DOOR_ENTRY",
            LeaveType::CustomerApprovedCompOff => "CUSTOMER_APPROVED_COMP_OFF",
            LeaveType::CustomerHoliday => "CUSTOMER_HOLIDAY",
            LeaveType::WorkFromHome => "WORK_FROM_HOME",
            LeaveType::ExemptLeave => "EXEMPT_LEAVE",
            LeaveType::Unpaid => "UNPAID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "duration_mode", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationMode {
    HalfDay,
    FullDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "leave_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Pedidos que ainda "ocupam" dias (contam para regras de histórico).
    pub fn is_live(self) -> bool {
        matches!(self, LeaveStatus::Pending | LeaveStatus::Approved)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeaveStatus::Draft => "DRAFT",
            LeaveStatus::Pending => "PENDING",
            LeaveStatus::Approved => "APPROVED",
            LeaveStatus::Rejected => "REJECTED",
            LeaveStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
}

impl From<DecisionOutcome> for LeaveStatus {
    fn from(outcome: DecisionOutcome) -> Self {
        match outcome {
            DecisionOutcome::Approved => LeaveStatus::Approved,
            DecisionOutcome::Rejected => LeaveStatus::Rejected,
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompOffTransaction {
    #[schema(example = "2025-03-08")]
    pub date: NaiveDate,
    #[schema(example = "8.0")]
    pub hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: Uuid,
    #[schema(example = "EMP001")]
    pub employee_id: String,
    pub leave_type: LeaveType,
    #[schema(example = "2025-01-24")]
    pub from_date: NaiveDate,
    #[schema(example = "2025-01-27")]
    pub to_date: NaiveDate,
    pub duration_mode: DurationMode,
    pub reason: String,
    pub hand_over_comments: Option<String>,
    #[schema(example = "2.0")]
    pub chargeable_days: Decimal,
    pub approver_id: Option<String>,
    // Preenchido apenas quando a regra semanal de WFH exige segundo nível
    pub second_level_approver_id: Option<String>,
    pub status: LeaveStatus,
    pub approver_comment: Option<String>,
    pub decided_by: Option<String>,
    pub comp_off_transactions: Vec<CompOffTransaction>,
    pub customer_holiday_worked_date: Option<NaiveDate>,
    pub shift_start_from_time: Option<NaiveTime>,
    pub customer_approved: bool,
    pub logged_time_checked: bool,
    // Tipo original quando o pedido foi convertido para UNPAID
    pub converted_from: Option<LeaveType>,
    pub applied_at: NaiveDateTime,
    pub decided_at: Option<NaiveDateTime>,
    pub cancelled_at: Option<NaiveDateTime>,
}

impl LeaveRequest {
    /// Cria um rascunho a partir do que o colaborador enviou.
    pub fn draft(employee_id: &str, input: LeaveRequestInput, applied_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            employee_id: employee_id.to_string(),
            leave_type: input.leave_type,
            from_date: input.from_date,
            to_date: input.to_date,
            duration_mode: input.duration_mode,
            reason: input.reason,
            hand_over_comments: input.hand_over_comments,
            chargeable_days: Decimal::ZERO,
            approver_id: None,
            second_level_approver_id: None,
            status: LeaveStatus::Draft,
            approver_comment: None,
            decided_by: None,
            comp_off_transactions: input.comp_off_transactions,
            customer_holiday_worked_date: input.customer_holiday_worked_date,
            shift_start_from_time: input.shift_start_from_time,
            customer_approved: input.customer_approved,
            logged_time_checked: false,
            converted_from: None,
            applied_at,
            decided_at: None,
            cancelled_at: None,
        }
    }

    /// Quantidade de dias corridos do intervalo (inclusivo).
    pub fn span_days(&self) -> i64 {
        (self.to_date - self.from_date).num_days() + 1
    }

    pub fn overlaps(&self, from: NaiveDate, to: NaiveDate) -> bool {
        self.from_date <= to && self.to_date >= from
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequestInput {
    // Só o RH pode abrir pedido em nome de outra pessoa
    #[schema(example = "EMP001")]
    pub employee_id: Option<String>,

    pub leave_type: LeaveType,

    #[schema(example = "2025-06-03")]
    pub from_date: NaiveDate,

    #[schema(example = "2025-06-03")]
    pub to_date: NaiveDate,

    pub duration_mode: DurationMode,

    #[validate(length(min = 1, max = 1000, message = "required"))]
    #[schema(example = "Viagem em família")]
    pub reason: String,

    #[validate(length(max = 2000))]
    pub hand_over_comments: Option<String>,

    #[serde(default)]
    #[schema(example = json!([{"date": "2025-03-08", "hours": 8.0}]))]
    pub comp_off_transactions: Vec<CompOffTransaction>,

    pub customer_holiday_worked_date: Option<NaiveDate>,

    #[schema(value_type = Option<String>, example = "14:00:00")]
    pub shift_start_from_time: Option<NaiveTime>,

    #[serde(default)]
    pub customer_approved: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DecideLeavePayload {
    pub outcome: DecisionOutcome,

    #[validate(length(max = 1000))]
    #[schema(example = "Aprovado, boa viagem")]
    pub comment: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalChecksPayload {
    pub logged_time_checked: Option<bool>,
    pub customer_approved: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLeaveResponse {
    pub id: Uuid,
    pub status: LeaveStatus,
    #[schema(example = "2.0")]
    pub chargeable_days: Decimal,
    pub leave_type: LeaveType,
    pub converted_from: Option<LeaveType>,
    pub approver_id: Option<String>,
    pub requires_second_level: bool,
}

impl From<&LeaveRequest> for SubmitLeaveResponse {
    fn from(request: &LeaveRequest) -> Self {
        Self {
            id: request.id,
            status: request.status,
            chargeable_days: request.chargeable_days,
            leave_type: request.leave_type,
            converted_from: request.converted_from,
            approver_id: request.approver_id.clone(),
            requires_second_level: request.second_level_approver_id.is_some(),
        }
    }
}
