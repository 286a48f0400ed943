// src/db/compliance_repo.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    common::error::AppError,
    db::{ComplianceStore, WarningUpdate},
};

#[derive(Clone)]
pub struct ComplianceRepository {
    pool: PgPool,
}

impl ComplianceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ComplianceStore for ComplianceRepository {
    async fn record_acknowledgment(
        &self,
        employee_id: &str,
        policy_id: &str,
    ) -> Result<BTreeMap<String, bool>, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO policy_acknowledgments (employee_id, policy_id, acknowledged, acknowledged_at)
            VALUES ($1, $2, TRUE, NOW())
            ON CONFLICT (employee_id, policy_id)
            DO UPDATE SET acknowledged = TRUE, acknowledged_at = NOW()
            "#,
        )
        .bind(employee_id)
        .bind(policy_id)
        .execute(&mut *tx)
        .await?;

        let acks = sqlx::query_as::<_, (String, bool)>(
            "SELECT policy_id, acknowledged FROM policy_acknowledgments WHERE employee_id = $1",
        )
        .bind(employee_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(acks.into_iter().collect())
    }

    async fn update_warning_count(&self, employee_id: &str, next: &WarningUpdate) -> Result<i16, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO warning_counts (employee_id, warning_count) VALUES ($1, 0) ON CONFLICT DO NOTHING")
            .bind(employee_id)
            .execute(&mut *tx)
            .await?;

        // FOR UPDATE: ticks concorrentes do mesmo colaborador ficam em fila
        let current = sqlx::query_scalar::<_, i16>(
            "SELECT warning_count FROM warning_counts WHERE employee_id = $1 FOR UPDATE",
        )
        .bind(employee_id)
        .fetch_one(&mut *tx)
        .await?;

        // Aceites lidos depois da trava: um aceite concluído antes já aparece aqui
        let acks = sqlx::query_as::<_, (String, bool)>(
            "SELECT policy_id, acknowledged FROM policy_acknowledgments WHERE employee_id = $1",
        )
        .bind(employee_id)
        .fetch_all(&mut *tx)
        .await?;
        let acks: BTreeMap<String, bool> = acks.into_iter().collect();

        let updated = next(current, &acks);
        if updated != current {
            sqlx::query("UPDATE warning_counts SET warning_count = $2, updated_at = NOW() WHERE employee_id = $1")
                .bind(employee_id)
                .bind(updated)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(updated)
    }
}
