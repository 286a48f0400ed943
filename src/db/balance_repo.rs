// src/db/balance_repo.rs

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::{common::error::AppError, db::BalanceSource, models::leave::LeaveType};

// leave_balances é alimentada pela folha de pagamento; aqui só leitura.
#[derive(Clone)]
pub struct BalanceRepository {
    pool: PgPool,
}

impl BalanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceSource for BalanceRepository {
    async fn available_balance(&self, employee_id: &str, leave_type: LeaveType) -> Result<Option<Decimal>, AppError> {
        let balance = sqlx::query_scalar::<_, Decimal>(
            "SELECT available FROM leave_balances WHERE employee_id = $1 AND leave_type = $2",
        )
        .bind(employee_id)
        .bind(leave_type)
        .fetch_optional(&self.pool)
        .await?;
        Ok(balance)
    }
}
