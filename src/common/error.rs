// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::engine::policy::PolicyViolation;
use crate::engine::state_machine::LeaveTransitionError;
use crate::middleware::i18n::Locale;
use crate::models::report::ReportType;

// Erro de domínio único. Handlers convertem para ApiError (com idioma) via `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    // Violações de regra de negócio: sempre o conjunto completo
    #[error("Pedido viola {} regra(s) de política", .0.len())]
    PolicyRejected(Vec<PolicyViolation>),

    #[error("Erro de validação")]
    PayloadValidation(#[from] validator::ValidationErrors),

    #[error("Dados inválidos: {0}")]
    Validation(String),

    #[error("Estado inválido: {0}")]
    InvalidState(String),

    #[error("Não autorizado: {0}")]
    Unauthorized(String),

    #[error("Não encontrado: {0}")]
    NotFound(String),

    #[error("Geração de {report_type:?} {month}/{year} já está em andamento")]
    GenerationInProgress {
        report_type: ReportType,
        month: i16,
        year: i32,
    },

    #[error("Falha transitória: {0}")]
    TransientFailure(String),

    #[error("Relatório de origem ausente: {0}")]
    MissingSource(String),

    #[error("Erro de banco de dados")]
    Database(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    Internal(#[from] anyhow::Error),
}

impl From<LeaveTransitionError> for AppError {
    fn from(err: LeaveTransitionError) -> Self {
        match err {
            LeaveTransitionError::PolicyRejected(violations) => AppError::PolicyRejected(violations),
            LeaveTransitionError::InvalidState { .. } => AppError::InvalidState(err.to_string()),
            LeaveTransitionError::Unauthorized(reason) => AppError::Unauthorized(reason),
        }
    }
}

impl AppError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::TransientFailure(_)
                | AppError::Database(sqlx::Error::PoolTimedOut)
                | AppError::Database(sqlx::Error::Io(_))
        )
    }

    /// Converte para a resposta HTTP, traduzindo a mensagem para o idioma do cliente.
    pub fn to_api_error(self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        if self.is_retryable() {
            tracing::warn!("⏳ Falha transitória: {}", self);
            return ApiError {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: i18n.translate(lang, "error.transient"),
                details: Some(json!({ "retryable": true, "reason": self.to_string() })),
            };
        }

        match self {
            AppError::PolicyRejected(violations) => {
                let details: Vec<Value> = violations
                    .iter()
                    .map(|v| {
                        let key = format!("violation.{}", v.rule_id.as_str());
                        let message = i18n.lookup(lang, &key).map(str::to_string).unwrap_or_else(|| v.message.clone());
                        json!({ "ruleId": v.rule_id, "message": message, "detail": v.message })
                    })
                    .collect();
                ApiError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    error: i18n.translate(lang, "error.validation"),
                    details: Some(Value::Array(details)),
                }
            }
            AppError::PayloadValidation(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                ApiError {
                    status: StatusCode::UNPROCESSABLE_ENTITY,
                    error: i18n.translate(lang, "error.payload_validation"),
                    details: Some(Value::Object(details)),
                }
            }
            AppError::Validation(reason) => ApiError::with_reason(
                StatusCode::UNPROCESSABLE_ENTITY,
                i18n.translate(lang, "error.validation"),
                reason,
            ),
            AppError::InvalidState(reason) => {
                ApiError::with_reason(StatusCode::CONFLICT, i18n.translate(lang, "error.invalid_state"), reason)
            }
            AppError::Unauthorized(reason) => {
                ApiError::with_reason(StatusCode::FORBIDDEN, i18n.translate(lang, "error.unauthorized"), reason)
            }
            AppError::NotFound(reason) => {
                ApiError::with_reason(StatusCode::NOT_FOUND, i18n.translate(lang, "error.not_found"), reason)
            }
            AppError::MissingSource(reason) => {
                ApiError::with_reason(StatusCode::NOT_FOUND, i18n.translate(lang, "error.missing_source"), reason)
            }
            AppError::GenerationInProgress { report_type, month, year } => ApiError {
                status: StatusCode::CONFLICT,
                error: i18n.translate(lang, "error.generation_in_progress"),
                details: Some(json!({ "reportType": report_type, "month": month, "year": year })),
            },
            ref e => {
                tracing::error!("🔥 Erro Interno do Servidor: {:?}", e);
                ApiError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: i18n.translate(lang, "error.internal"),
                    details: None,
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    fn with_reason(status: StatusCode, error: String, reason: String) -> Self {
        Self { status, error, details: Some(json!({ "reason": reason })) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::policy::RuleId;

    fn store() -> I18nStore {
        I18nStore::embedded().unwrap()
    }

    #[test]
    fn policy_rejection_is_422_with_every_rule() {
        let err = AppError::PolicyRejected(vec![
            PolicyViolation::new(RuleId::WfhMonday, "monday"),
            PolicyViolation::new(RuleId::WfhTenure, "tenure"),
        ]);
        let api = err.to_api_error(&Locale("pt".into()), &store());

        assert_eq!(api.status, StatusCode::UNPROCESSABLE_ENTITY);
        let details = api.details.unwrap();
        assert_eq!(details[0]["ruleId"], "WFH_MONDAY");
        assert_eq!(details[1]["ruleId"], "WFH_TENURE");
        assert_ne!(details[0]["message"], "monday");
    }

    #[test]
    fn transient_failures_are_retryable_503() {
        let api = AppError::TransientFailure("balance source".into()).to_api_error(&Locale("en".into()), &store());
        assert_eq!(api.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api.details.unwrap()["retryable"], true);

        let pool = AppError::Database(sqlx::Error::PoolTimedOut).to_api_error(&Locale("en".into()), &store());
        assert_eq!(pool.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (AppError::InvalidState("x".into()), StatusCode::CONFLICT),
            (AppError::Unauthorized("x".into()), StatusCode::FORBIDDEN),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::MissingSource("x".into()), StatusCode::NOT_FOUND),
            (
                AppError::GenerationInProgress { report_type: ReportType::LeaveReport, month: 6, year: 2025 },
                StatusCode::CONFLICT,
            ),
            (AppError::Internal(anyhow::anyhow!("boom")), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(err.to_api_error(&Locale("en".into()), &store()).status, status);
        }
    }
}
