// src/db/holiday_repo.rs

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{common::error::AppError, db::HolidayStore, models::holiday::Holiday};

#[derive(Clone)]
pub struct HolidayRepository {
    pool: PgPool,
}

impl HolidayRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayStore for HolidayRepository {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Holiday>, AppError> {
        let holidays = sqlx::query_as::<_, Holiday>(
            "SELECT date, name FROM holidays WHERE date BETWEEN $1 AND $2 ORDER BY date ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(holidays)
    }

    async fn find_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError> {
        let holiday = sqlx::query_as::<_, Holiday>("SELECT date, name FROM holidays WHERE date = $1")
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(holiday)
    }

    async fn insert_holiday(&self, holiday: &Holiday) -> Result<bool, AppError> {
        let result = sqlx::query("INSERT INTO holidays (date, name) VALUES ($1, $2) ON CONFLICT (date) DO NOTHING")
            .bind(holiday.date)
            .bind(&holiday.name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_holiday(&self, holiday: &Holiday) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE holidays SET name = $2 WHERE date = $1")
            .bind(holiday.date)
            .bind(&holiday.name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}
