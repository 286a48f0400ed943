// src/models/report.rs

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::leave::{LeaveStatus, LeaveType};

/// Marcador explícito para o lado sem dados no relatório de presença.
pub const NOT_AVAILABLE: &str = "N/A";

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "report_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    LeaveReport,
    DoorEntryReport,
    AttendanceReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowSource {
    Both,
    LeaveOnly,
    DoorOnly,
}

// --- Linhas de cada tipo de relatório ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveReportRow {
    #[schema(example = "EMP001")]
    pub employee_id: String,
    pub employee_name: String,
    pub date: NaiveDate,
    pub leave_status: LeaveStatus,
    pub leave_type: LeaveType,
    #[schema(example = "1.0")]
    pub chargeable_days: Decimal,
    pub leave_request_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoorEntryRow {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "ANA SOUZA")]
    pub door_system_name: String,
    #[schema(example = "D-4471")]
    pub door_system_id: Option<String>,
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "09:12:00")]
    pub first_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:40:00")]
    pub last_out: Option<NaiveTime>,
}

// Uma linha por (colaborador, dia). Campos ausentes saem como "N/A".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRow {
    pub employee_id: String,
    pub employee_name: String,
    pub date: NaiveDate,
    #[schema(example = "APPROVED")]
    pub leave_status: String,
    #[schema(example = "PRIVILEGE")]
    pub leave_type: String,
    #[schema(example = "1.0")]
    pub leave_days: String,
    #[schema(example = "N/A")]
    pub first_in: String,
    #[schema(example = "N/A")]
    pub last_out: String,
    #[schema(example = "N/A")]
    pub door_punches: String,
    pub source: RowSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "rows", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportPayload {
    Leave(Vec<LeaveReportRow>),
    DoorEntry(Vec<DoorEntryRow>),
    Attendance(Vec<AttendanceRow>),
}

impl ReportPayload {
    pub fn report_type(&self) -> ReportType {
        match self {
            ReportPayload::Leave(_) => ReportType::LeaveReport,
            ReportPayload::DoorEntry(_) => ReportType::DoorEntryReport,
            ReportPayload::Attendance(_) => ReportType::AttendanceReport,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ReportPayload::Leave(rows) => rows.len(),
            ReportPayload::DoorEntry(rows) => rows.len(),
            ReportPayload::Attendance(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    pub id: Uuid,
    pub report_type: ReportType,
    #[schema(example = 6)]
    pub period_month: i16,
    #[schema(example = 2025)]
    pub period_year: i32,
    pub generated_at: NaiveDateTime,
    #[schema(value_type = Object)]
    pub payload: ReportPayload,
    #[schema(example = "uploads/door-2025-06.xlsx")]
    pub source_file_ref: Option<String>,
    // Nomes do sistema de catraca sem mapeamento (só no relatório de presença)
    pub unmapped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub id: Uuid,
    pub report_type: ReportType,
    pub period_month: i16,
    pub period_year: i32,
    pub generated_at: NaiveDateTime,
    pub source_file_ref: Option<String>,
}

impl From<&MonthlyReport> for ReportSummary {
    fn from(report: &MonthlyReport) -> Self {
        Self {
            id: report.id,
            report_type: report.report_type,
            period_month: report.period_month,
            period_year: report.period_year,
            generated_at: report.generated_at,
            source_file_ref: report.source_file_ref.clone(),
        }
    }
}

// Visão de leitura: metadados + linhas, sem o envelope interno do payload
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum ReportRows {
    Leave(Vec<LeaveReportRow>),
    DoorEntry(Vec<DoorEntryRow>),
    Attendance(Vec<AttendanceRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportView {
    pub id: Uuid,
    pub report_type: ReportType,
    pub period_month: i16,
    pub period_year: i32,
    pub generated_at: NaiveDateTime,
    pub source_file_ref: Option<String>,
    pub unmapped: Vec<String>,
    pub rows: ReportRows,
}

impl From<MonthlyReport> for ReportView {
    fn from(report: MonthlyReport) -> Self {
        let rows = match report.payload {
            ReportPayload::Leave(rows) => ReportRows::Leave(rows),
            ReportPayload::DoorEntry(rows) => ReportRows::DoorEntry(rows),
            ReportPayload::Attendance(rows) => ReportRows::Attendance(rows),
        };
        Self {
            id: report.id,
            report_type: report.report_type,
            period_month: report.period_month,
            period_year: report.period_year,
            generated_at: report.generated_at,
            source_file_ref: report.source_file_ref,
            unmapped: report.unmapped,
            rows,
        }
    }
}

// --- Mapeamento colaborador ↔ catraca ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoorEntryMapping {
    #[schema(example = "EMP001")]
    pub employee_id: String,
    #[schema(example = "ANA SOUZA")]
    pub door_system_name: String,
    #[schema(example = "D-4471")]
    pub door_system_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DoorEntryMappingPayload {
    #[validate(length(min = 1, max = 120, message = "required"))]
    pub door_system_name: String,
    #[validate(length(min = 1, max = 60, message = "required"))]
    pub door_system_id: String,
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportPayload {
    pub report_type: ReportType,
    #[validate(range(min = 1, max = 12))]
    #[schema(example = 6)]
    pub month: i16,
    #[validate(range(min = 2000, max = 2100))]
    #[schema(example = 2025)]
    pub year: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadDoorEntryPayload {
    #[validate(range(min = 1, max = 12))]
    pub month: i16,
    #[validate(range(min = 2000, max = 2100))]
    pub year: i32,
    pub source_file_ref: Option<String>,
    #[validate(nested)]
    #[schema(example = json!([{"doorSystemName": "ANA SOUZA", "doorSystemId": "D-4471", "date": "2025-06-02", "firstIn": "09:12:00", "lastOut": "18:40:00"}]))]
    pub rows: Vec<DoorEntryRow>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAttendancePayload {
    pub leave_report_id: Uuid,
    pub door_entry_report_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportCreatedResponse {
    pub report_id: Uuid,
    pub rows: usize,
    pub unmapped: Vec<String>,
}

impl From<&MonthlyReport> for ReportCreatedResponse {
    fn from(report: &MonthlyReport) -> Self {
        Self {
            report_id: report.id,
            rows: report.payload.len(),
            unmapped: report.unmapped.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub report_type: Option<ReportType>,
    pub month: Option<i16>,
    pub year: Option<i32>,
}
