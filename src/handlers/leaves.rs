// src/handlers/leaves.rs

use axum::{
    extract::{Path, State},
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
    middleware::{actor::Actor, i18n::Locale},
    models::leave::{
        ApprovalChecksPayload, DecideLeavePayload, LeaveRequest, LeaveRequestInput, SubmitLeaveResponse,
    },
};

// ---
// Handler: submit_leave
// ---
#[utoipa::path(
    post,
    path = "/api/leaves",
    tag = "Leaves",
    request_body = LeaveRequestInput,
    responses(
        (status = 201, description = "Pedido enviado (pode ter virado Unpaid)", body = SubmitLeaveResponse),
        (status = 422, description = "Regras violadas, com a lista completa")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn submit_leave(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Json(payload): Json<LeaveRequestInput>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let submitted = app_state
        .leave_service
        .submit(&actor, payload, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok((StatusCode::CREATED, Json(SubmitLeaveResponse::from(&submitted))))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{id}",
    tag = "Leaves",
    params(
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    responses(
        (status = 200, description = "Pedido", body = LeaveRequest),
        (status = 404, description = "Pedido não encontrado")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn get_leave(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let request = app_state
        .leave_service
        .get(&actor, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(request))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/decision",
    tag = "Leaves",
    request_body = DecideLeavePayload,
    params(
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    responses(
        (status = 200, description = "Decisão registrada", body = LeaveRequest),
        (status = 403, description = "Ator não é o aprovador do nível exigido"),
        (status = 409, description = "Pedido não está pendente")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn decide_leave(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<DecideLeavePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let decided = app_state
        .leave_service
        .decide(&actor, id, payload, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(decided))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/checks",
    tag = "Leaves",
    request_body = ApprovalChecksPayload,
    params(
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    responses(
        (status = 200, description = "Checagens do aprovador gravadas", body = LeaveRequest)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn update_checks(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<ApprovalChecksPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = app_state
        .leave_service
        .set_checks(&actor, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(updated))
}

#[utoipa::path(
    put,
    path = "/api/leaves/{id}/cancel",
    tag = "Leaves",
    params(
        ("id" = Uuid, Path, description = "ID do pedido")
    ),
    responses(
        (status = 200, description = "Pedido cancelado", body = LeaveRequest),
        (status = 409, description = "Pedido já finalizado")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn cancel_leave(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = app_state
        .leave_service
        .cancel(&actor, id, Local::now().naive_local())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(cancelled))
}

// GET /api/employees/{employee_id}/leaves
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}/leaves",
    tag = "Leaves",
    params(
        ("employee_id" = String, Path, description = "Código do colaborador")
    ),
    responses(
        (status = 200, description = "Histórico de pedidos", body = Vec<LeaveRequest>)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn list_employee_leaves(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(employee_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let leaves = app_state
        .leave_service
        .list_for_employee(&actor, &employee_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(leaves))
}

// GET /api/approvers/{approver_id}/pending (fila de aprovação)
#[utoipa::path(
    get,
    path = "/api/approvers/{approver_id}/pending",
    tag = "Leaves",
    params(
        ("approver_id" = String, Path, description = "Código do aprovador")
    ),
    responses(
        (status = 200, description = "Pedidos aguardando este aprovador", body = Vec<LeaveRequest>)
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn list_pending(
    State(app_state): State<AppState>,
    locale: Locale,
    actor: Actor,
    Path(approver_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let pending = app_state
        .leave_service
        .pending_for_approver(&actor, &approver_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(pending))
}
