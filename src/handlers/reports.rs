// src/handlers/reports.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Local;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{Hr, RequireRole},
    },
    models::report::{
        DoorEntryMapping, DoorEntryMappingPayload, GenerateAttendancePayload, GenerateReportPayload,
        ReportCreatedResponse, ReportQuery, ReportSummary, ReportView, UploadDoorEntryPayload,
    },
};

// ---
// Relatórios mensais (somente RH)
// ---

#[utoipa::path(
    post,
    path = "/api/reports",
    tag = "Reports",
    request_body = GenerateReportPayload,
    responses(
        (status = 201, description = "Relatório gerado", body = ReportCreatedResponse),
        (status = 404, description = "Relatório de origem ausente (presença)"),
        (status = 409, description = "Geração do mesmo período já em andamento")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn generate_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Json(payload): Json<GenerateReportPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let report = app_state
        .report_service
        .generate(&payload, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok((StatusCode::CREATED, Json(ReportCreatedResponse::from(&report))))
}

#[utoipa::path(
    post,
    path = "/api/reports/door-entry",
    tag = "Reports",
    request_body = UploadDoorEntryPayload,
    responses(
        (status = 201, description = "Exportação da catraca armazenada", body = ReportCreatedResponse)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn upload_door_entry(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Json(payload): Json<UploadDoorEntryPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let report = app_state
        .report_service
        .upload_door_entry(payload, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok((StatusCode::CREATED, Json(ReportCreatedResponse::from(&report))))
}

#[utoipa::path(
    post,
    path = "/api/reports/attendance",
    tag = "Reports",
    request_body = GenerateAttendancePayload,
    responses(
        (status = 201, description = "Presença cruzada (com nomes sem mapeamento)", body = ReportCreatedResponse),
        (status = 404, description = "Relatório de origem ausente")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn generate_attendance(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Json(payload): Json<GenerateAttendancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .generate_attendance(payload.leave_report_id, payload.door_entry_report_id, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok((StatusCode::CREATED, Json(ReportCreatedResponse::from(&report))))
}

#[utoipa::path(
    get,
    path = "/api/reports",
    tag = "Reports",
    params(ReportQuery),
    responses(
        (status = 200, description = "Relatórios gerados (sem as linhas)", body = Vec<ReportSummary>)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn list_reports(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Query(query): Query<ReportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let reports = app_state
        .report_service
        .list_reports(&query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(reports))
}

#[utoipa::path(
    get,
    path = "/api/reports/{id}",
    tag = "Reports",
    params(
        ("id" = Uuid, Path, description = "ID do relatório")
    ),
    responses(
        (status = 200, description = "Relatório com as linhas", body = ReportView),
        (status = 404, description = "Relatório não encontrado")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn get_report(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let report = app_state
        .report_service
        .get_report(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(ReportView::from(report)))
}

// ---
// Mapeamento colaborador ↔ catraca
// ---

#[utoipa::path(
    put,
    path = "/api/door-mappings/{employee_id}",
    tag = "Reports",
    request_body = DoorEntryMappingPayload,
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Mapeamento gravado", body = DoorEntryMapping)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn upsert_mapping(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Path(employee_id): Path<String>,
    Json(payload): Json<DoorEntryMappingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let mapping = app_state
        .report_service
        .upsert_mapping(&employee_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(mapping))
}

#[utoipa::path(
    get,
    path = "/api/door-mappings",
    tag = "Reports",
    responses(
        (status = 200, description = "Todos os mapeamentos", body = Vec<DoorEntryMapping>)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn list_mappings(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
) -> Result<impl IntoResponse, ApiError> {
    let mappings = app_state
        .report_service
        .list_mappings()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(mappings))
}
