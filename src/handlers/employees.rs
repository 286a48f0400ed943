// src/handlers/employees.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::Local;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        actor::Actor,
        i18n::Locale,
        rbac::{Hr, RequireRole},
    },
    models::employee::{ApproverResponse, LeaveTypesResponse, UpdateApproverPayload},
};

// GET /api/employees/{employee_id}/leave-types
// Usado pela tela de pedido: tipos disponíveis + quem vai aprovar
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/leave-types",
    tag = "Employees",
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Tipos de licença disponíveis", body = LeaveTypesResponse),
        (status = 403, description = "Sem acesso a este colaborador")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn get_leave_types(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .approver_service
        .leave_types(&actor, &employee_id, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(response))
}

#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}/approver",
    tag = "Employees",
    request_body = UpdateApproverPayload,
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Aprovador trocado; pendentes religados", body = ApproverResponse)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn update_approver(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(actor, _): RequireRole<Hr>,
    Path(employee_id): Path<String>,
    Json(payload): Json<UpdateApproverPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let response = app_state
        .approver_service
        .reassign(&actor, &employee_id, &payload.new_approver_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(response))
}
