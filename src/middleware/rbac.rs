// src/middleware/rbac.rs

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
};
use std::marker::PhantomData;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        actor::{Actor, Role},
        i18n::Locale,
    },
};

/// Define qual perfil uma rota exige
pub trait RoleDef: Send + Sync + 'static {
    fn role() -> Role;
}

/// Guardião: rejeita a requisição se o ator não tiver o perfil `T`.
pub struct RequireRole<T>(pub Actor, pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequireRole<T>
where
    T: RoleDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let actor = Actor::from_request_parts(parts, state).await?;

        if actor.role != T::role() {
            let app_state = AppState::from_ref(state);
            let locale = Locale::from_headers(&parts.headers);
            return Err(ApiError {
                status: StatusCode::FORBIDDEN,
                error: app_state.i18n.translate(&locale.0, "error.forbidden_role"),
                details: Some(serde_json::json!({ "requiredRole": T::role() })),
            });
        }

        Ok(RequireRole(actor, PhantomData))
    }
}

// ---
// PERFIS
// ---

pub struct Hr;
impl RoleDef for Hr {
    fn role() -> Role {
        Role::Hr
    }
}
