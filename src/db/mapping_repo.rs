// src/db/mapping_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{common::error::AppError, db::DoorMappingStore, models::report::DoorEntryMapping};

#[derive(Clone)]
pub struct DoorMappingRepository {
    pool: PgPool,
}

impl DoorMappingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoorMappingStore for DoorMappingRepository {
    async fn upsert_mapping(&self, mapping: &DoorEntryMapping) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO door_entry_mapping (employee_id, door_system_name, door_system_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (employee_id)
            DO UPDATE SET door_system_name = EXCLUDED.door_system_name,
                          door_system_id = EXCLUDED.door_system_id
            "#,
        )
        .bind(&mapping.employee_id)
        .bind(&mapping.door_system_name)
        .bind(&mapping.door_system_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_mappings(&self) -> Result<Vec<DoorEntryMapping>, AppError> {
        let mappings = sqlx::query_as::<_, DoorEntryMapping>(
            "SELECT employee_id, door_system_name, door_system_id FROM door_entry_mapping ORDER BY employee_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(mappings)
    }
}
