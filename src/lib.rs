// src/lib.rs

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod engine;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppState;
use crate::docs::ApiDoc;

/// Monta o router completo. Separado do `main` para os testes de HTTP.
pub fn routes(app_state: AppState) -> Router {
    let holiday_routes = Router::new()
        .route(
            "/",
            get(handlers::holidays::list_holidays).post(handlers::holidays::create_holiday),
        )
        .route("/{date}", put(handlers::holidays::update_holiday));

    let employee_routes = Router::new()
        .route("/{employee_id}/leave-types", get(handlers::employees::get_leave_types))
        .route("/{employee_id}/leaves", get(handlers::leaves::list_employee_leaves))
        .route("/{employee_id}/approver", put(handlers::employees::update_approver));

    let leave_routes = Router::new()
        .route("/", post(handlers::leaves::submit_leave))
        .route("/{id}", get(handlers::leaves::get_leave))
        .route("/{id}/decision", put(handlers::leaves::decide_leave))
        .route("/{id}/checks", put(handlers::leaves::update_checks))
        .route("/{id}/cancel", put(handlers::leaves::cancel_leave));

    let compliance_routes = Router::new()
        .route("/{employee_id}", get(handlers::compliance::get_status))
        .route(
            "/{employee_id}/acknowledgments",
            post(handlers::compliance::acknowledge_policy),
        )
        .route("/{employee_id}/warnings", post(handlers::compliance::record_warning));

    let report_routes = Router::new()
        .route(
            "/",
            post(handlers::reports::generate_report).get(handlers::reports::list_reports),
        )
        .route("/door-entry", post(handlers::reports::upload_door_entry))
        .route("/attendance", post(handlers::reports::generate_attendance))
        .route("/{id}", get(handlers::reports::get_report));

    let mapping_routes = Router::new()
        .route("/", get(handlers::reports::list_mappings))
        .route("/{employee_id}", put(handlers::reports::upsert_mapping));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/approvers/{approver_id}/pending", get(handlers::leaves::list_pending))
        .nest("/api/holidays", holiday_routes)
        .nest("/api/employees", employee_routes)
        .nest("/api/leaves", leave_routes)
        .nest("/api/compliance", compliance_routes)
        .nest("/api/reports", report_routes)
        .nest("/api/door-mappings", mapping_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state)
}
