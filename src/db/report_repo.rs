// src/db/report_repo.rs

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{PeriodLock, ReportStore},
    models::report::{MonthlyReport, ReportPayload, ReportQuery, ReportSummary, ReportType},
};

// Namespace dos advisory locks de geração ("HR" nos bytes altos)
const REPORT_LOCK_CLASS: i32 = 0x4852_0000;

/// Chaves do `pg_try_advisory_xact_lock(int, int)` de um período.
pub fn period_lock_keys(report_type: ReportType, month: i16, year: i32) -> (i32, i32) {
    let kind = match report_type {
        ReportType::LeaveReport => 1,
        ReportType::DoorEntryReport => 2,
        ReportType::AttendanceReport => 3,
    };
    (REPORT_LOCK_CLASS + kind, year.wrapping_mul(100).wrapping_add(i32::from(month)))
}

const REPORT_COLUMNS: &str =
    "id, report_type, period_month, period_year, generated_at, payload, source_file_ref, unmapped";

#[derive(sqlx::FromRow)]
struct ReportRow {
    id: Uuid,
    report_type: ReportType,
    period_month: i16,
    period_year: i32,
    generated_at: NaiveDateTime,
    payload: Json<ReportPayload>,
    source_file_ref: Option<String>,
    unmapped: Json<Vec<String>>,
}

impl From<ReportRow> for MonthlyReport {
    fn from(row: ReportRow) -> Self {
        Self {
            id: row.id,
            report_type: row.report_type,
            period_month: row.period_month,
            period_year: row.period_year,
            generated_at: row.generated_at,
            payload: row.payload.0,
            source_file_ref: row.source_file_ref,
            unmapped: row.unmapped.0,
        }
    }
}

#[derive(Clone)]
pub struct ReportRepository {
    pool: PgPool,
}

impl ReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportStore for ReportRepository {
    async fn try_lock_period(
        &self,
        report_type: ReportType,
        month: i16,
        year: i32,
    ) -> Result<Option<PeriodLock>, AppError> {
        let mut tx = self.pool.begin().await?;
        let (class, period) = period_lock_keys(report_type, month, year);

        // xact lock: some com o rollback quando o PeriodLock cai
        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_xact_lock($1, $2)")
            .bind(class)
            .bind(period)
            .fetch_one(&mut *tx)
            .await?;

        Ok(acquired.then(|| PeriodLock::held_by(tx)))
    }

    async fn insert_report(&self, report: &MonthlyReport) -> Result<(), AppError> {
        // Um único INSERT numa transação: ou o relatório inteiro existe, ou nada.
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO monthly_reports ({REPORT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        ))
        .bind(report.id)
        .bind(report.report_type)
        .bind(report.period_month)
        .bind(report.period_year)
        .bind(report.generated_at)
        .bind(Json(&report.payload))
        .bind(&report.source_file_ref)
        .bind(Json(&report.unmapped))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<MonthlyReport>, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(&format!("SELECT {REPORT_COLUMNS} FROM monthly_reports WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(MonthlyReport::from))
    }

    async fn latest_report(
        &self,
        report_type: ReportType,
        month: i16,
        year: i32,
    ) -> Result<Option<MonthlyReport>, AppError> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "SELECT {REPORT_COLUMNS} FROM monthly_reports \
             WHERE report_type = $1 AND period_month = $2 AND period_year = $3 \
             ORDER BY generated_at DESC LIMIT 1"
        ))
        .bind(report_type)
        .bind(month)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(MonthlyReport::from))
    }

    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<ReportSummary>, AppError> {
        let reports = sqlx::query_as::<_, ReportSummary>(
            r#"
            SELECT id, report_type, period_month, period_year, generated_at, source_file_ref
            FROM monthly_reports
            WHERE ($1::report_type IS NULL OR report_type = $1)
              AND ($2::SMALLINT IS NULL OR period_month = $2)
              AND ($3::INT IS NULL OR period_year = $3)
            ORDER BY generated_at DESC
            "#,
        )
        .bind(query.report_type)
        .bind(query.month)
        .bind(query.year)
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_keys_separate_types_and_periods() {
        let june_leave = period_lock_keys(ReportType::LeaveReport, 6, 2025);
        assert_eq!(june_leave, period_lock_keys(ReportType::LeaveReport, 6, 2025));
        assert_ne!(june_leave, period_lock_keys(ReportType::AttendanceReport, 6, 2025));
        assert_ne!(june_leave, period_lock_keys(ReportType::LeaveReport, 7, 2025));
        assert_ne!(june_leave, period_lock_keys(ReportType::LeaveReport, 6, 2026));
        assert_eq!(june_leave.1, 202506);
    }
}
