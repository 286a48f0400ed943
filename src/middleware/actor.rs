// src/middleware/actor.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

// Identidade vem do gateway em cabeçalhos; aqui só lemos e validamos o formato.
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";
pub const ROLE_HEADER: &str = "x-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Employee,
    Approver,
    Hr,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "EMPLOYEE" => Some(Role::Employee),
            "APPROVER" => Some(Role::Approver),
            "HR" => Some(Role::Hr),
            _ => None,
        }
    }
}

/// Quem está executando a operação. Passado explicitamente para os serviços.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub employee_id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(employee_id: impl Into<String>, role: Role) -> Self {
        Self { employee_id: employee_id.into(), role }
    }

    pub fn is_hr(&self) -> bool {
        self.role == Role::Hr
    }
}

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let employee_id = header(EMPLOYEE_ID_HEADER);
        let role = header(ROLE_HEADER).as_deref().and_then(Role::parse);

        match (employee_id, role) {
            (Some(employee_id), Some(role)) => Ok(Actor { employee_id, role }),
            _ => {
                let app_state = AppState::from_ref(state);
                let locale = Locale::from_headers(&parts.headers);
                Err(ApiError {
                    status: StatusCode::UNAUTHORIZED,
                    error: app_state.i18n.translate(&locale.0, "error.missing_actor"),
                    details: None,
                })
            }
        }
    }
}
