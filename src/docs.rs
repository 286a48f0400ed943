// src/docs.rs

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

use crate::engine;
use crate::handlers;
use crate::middleware;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Holidays ---
        handlers::holidays::list_holidays,
        handlers::holidays::create_holiday,
        handlers::holidays::update_holiday,

        // --- Employees ---
        handlers::employees::get_leave_types,
        handlers::employees::update_approver,

        // --- Leaves ---
        handlers::leaves::submit_leave,
        handlers::leaves::get_leave,
        handlers::leaves::decide_leave,
        handlers::leaves::update_checks,
        handlers::leaves::cancel_leave,
        handlers::leaves::list_employee_leaves,
        handlers::leaves::list_pending,

        // --- Compliance ---
        handlers::compliance::get_status,
        handlers::compliance::acknowledge_policy,
        handlers::compliance::record_warning,

        // --- Reports ---
        handlers::reports::generate_report,
        handlers::reports::upload_door_entry,
        handlers::reports::generate_attendance,
        handlers::reports::list_reports,
        handlers::reports::get_report,
        handlers::reports::upsert_mapping,
        handlers::reports::list_mappings,
    ),
    components(
        schemas(
            // --- Identidade ---
            middleware::actor::Role,

            // --- Holidays ---
            models::holiday::Holiday,
            models::holiday::HolidayPayload,
            models::holiday::UpdateHolidayPayload,

            // --- Employees ---
            models::employee::Employee,
            models::employee::LeaveTypesResponse,
            models::employee::UpdateApproverPayload,
            models::employee::ApproverResponse,

            // --- Leaves ---
            models::leave::LeaveType,
            models::leave::DurationMode,
            models::leave::LeaveStatus,
            models::leave::DecisionOutcome,
            models::leave::CompOffTransaction,
            models::leave::LeaveRequest,
            models::leave::LeaveRequestInput,
            models::leave::DecideLeavePayload,
            models::leave::ApprovalChecksPayload,
            models::leave::SubmitLeaveResponse,

            // --- Regras ---
            engine::policy::RuleId,
            engine::policy::PolicyViolation,

            // --- Compliance ---
            models::compliance::AcknowledgePolicyPayload,
            models::compliance::ComplianceStatus,
            models::compliance::WarningResponse,

            // --- Reports ---
            models::report::ReportType,
            models::report::RowSource,
            models::report::LeaveReportRow,
            models::report::DoorEntryRow,
            models::report::AttendanceRow,
            models::report::ReportSummary,
            models::report::ReportRows,
            models::report::ReportView,
            models::report::DoorEntryMapping,
            models::report::DoorEntryMappingPayload,
            models::report::GenerateReportPayload,
            models::report::UploadDoorEntryPayload,
            models::report::GenerateAttendancePayload,
            models::report::ReportCreatedResponse,
        )
    ),
    tags(
        (name = "Holidays", description = "Calendário de feriados"),
        (name = "Employees", description = "Tipos de licença e cadeia de aprovação"),
        (name = "Leaves", description = "Pedidos de licença e aprovação"),
        (name = "Compliance", description = "Aceite de políticas e avisos"),
        (name = "Reports", description = "Relatórios mensais e mapeamento da catraca")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

// O gateway injeta a identidade em dois cabeçalhos
impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "employee_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(middleware::actor::EMPLOYEE_ID_HEADER))),
        );
        components.add_security_scheme(
            "role",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(middleware::actor::ROLE_HEADER))),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/holidays",
            "/api/holidays/{date}",
            "/api/leaves",
            "/api/leaves/{id}/decision",
            "/api/employees/{employee_id}/approver",
            "/api/compliance/{employee_id}/warnings",
            "/api/reports/attendance",
            "/api/door-mappings/{employee_id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota sem documentação: {path}");
        }
    }
}
