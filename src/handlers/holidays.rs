// src/handlers/holidays.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Local, NaiveDate};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{Hr, RequireRole},
    },
    models::holiday::{Holiday, HolidayPayload, HolidayQuery, UpdateHolidayPayload},
};

#[utoipa::path(
    get,
    path = "/api/holidays",
    tag = "Holidays",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Feriados no intervalo de anos", body = Vec<Holiday>)
    )
)]
pub async fn list_holidays(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<HolidayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let holidays = app_state
        .calendar_service
        .list_holidays(query.from_year, query.to_year)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(holidays))
}

#[utoipa::path(
    post,
    path = "/api/holidays",
    tag = "Holidays",
    request_body = HolidayPayload,
    responses(
        (status = 201, description = "Feriado cadastrado", body = Holiday),
        (status = 409, description = "Data já passou")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn create_holiday(
    State(app_state): State<AppState>,
    locale: Locale,
    RequireRole(actor, _): RequireRole<Hr>,
    Json(payload): Json<HolidayPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let holiday = Holiday { date: payload.date, name: payload.name };
    let created = app_state
        .calendar_service
        .create_holiday(holiday, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    tracing::info!("📅 Feriado {} cadastrado por {}", created.date, actor.employee_id);
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    put,
    path = "/api/holidays/{date}",
    tag = "Holidays",
    request_body = UpdateHolidayPayload,
    params(
        ("date" = String, Path, description = "Data do feriado (AAAA-MM-DD)")
    ),
    responses(
        (status = 200, description = "Feriado renomeado", body = Holiday),
        (status = 404, description = "Data sem feriado")
    ),
    security(("employee_id" = [], "role" = []))
)]
pub async fn update_holiday(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequireRole<Hr>,
    Path(date): Path<NaiveDate>,
    Json(payload): Json<UpdateHolidayPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::PayloadValidation(e).to_api_error(&locale, &app_state.i18n))?;

    let updated = app_state
        .calendar_service
        .update_holiday(Holiday { date, name: payload.name }, Local::now().date_naive())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n))?;

    Ok(Json(updated))
}
