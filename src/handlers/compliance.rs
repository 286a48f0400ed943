// src/handlers/compliance.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        actor::Actor,
        i18n::Locale,
        rbac::{Hr, RequireRole},
    },
    models::compliance::{AcknowledgePolicyPayload, ComplianceStatus, WarningResponse},
};

#[utoipa::path(
    get,
    path = "/api/compliance/{employee_id}",
    tag = "Compliance",
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Políticas pendentes e contagem de avisos", body = ComplianceStatus)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn get_status(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let status = app_state
        .compliance_service
        .status(&actor, &employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(status))
}

#[utoipa::path(
    post,
    path = "/api/compliance/{employee_id}/acknowledgments",
    tag = "Compliance",
    request_body = AcknowledgePolicyPayload,
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Aceite registrado", body = ComplianceStatus)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn acknowledge_policy(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(employee_id): Path<String>,
    Json(payload): Json<AcknowledgePolicyPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let status = app_state
        .compliance_service
        .record_acknowledgment(&actor, &employee_id, &payload.policy_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(status))
}

// POST /api/compliance/{employee_id}/warnings
// Disparado pelo agendador de compliance (perfil RH), um tick por chamada
#[utoipa::path(
    post,
    path = "/api/compliance/{employee_id}/warnings",
    tag = "Compliance",
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Contagem de avisos após o tick", body = WarningResponse)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn record_warning(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .compliance_service
        .tick(&employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(response))
}
