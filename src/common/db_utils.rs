// src/common/db_utils.rs

use std::future::Future;
use std::time::Duration;

use crate::common::error::AppError;

/// Executa uma chamada externa (banco, fonte de saldo) sob o timeout configurado.
/// Estourar o prazo vira `TransientFailure`, que o cliente pode repetir.
pub(crate) async fn with_timeout<T, F>(limit: Duration, operation: &'static str, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("⏳ '{}' excedeu {}ms", operation, limit.as_millis());
            Err(AppError::TransientFailure(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}
