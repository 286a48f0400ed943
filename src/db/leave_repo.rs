// src/db/leave_repo.rs

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LeaveStore,
    models::leave::{CompOffTransaction, DurationMode, LeaveRequest, LeaveStatus, LeaveType},
};

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, from_date, to_date, duration_mode, reason,
    hand_over_comments, chargeable_days, approver_id, second_level_approver_id,
    status, approver_comment, decided_by, comp_off_transactions,
    customer_holiday_worked_date, shift_start_from_time, customer_approved,
    logged_time_checked, converted_from, applied_at, decided_at, cancelled_at
"#;

// Linha crua da tabela; as transações de folga ficam em JSONB.
#[derive(sqlx::FromRow)]
struct LeaveRow {
    id: Uuid,
    employee_id: String,
    leave_type: LeaveType,
    from_date: NaiveDate,
    to_date: NaiveDate,
    duration_mode: DurationMode,
    reason: String,
    hand_over_comments: Option<String>,
    chargeable_days: Decimal,
    approver_id: Option<String>,
    second_level_approver_id: Option<String>,
    status: LeaveStatus,
    approver_comment: Option<String>,
    decided_by: Option<String>,
    comp_off_transactions: Json<Vec<CompOffTransaction>>,
    customer_holiday_worked_date: Option<NaiveDate>,
    shift_start_from_time: Option<NaiveTime>,
    customer_approved: bool,
    logged_time_checked: bool,
    converted_from: Option<LeaveType>,
    applied_at: NaiveDateTime,
    decided_at: Option<NaiveDateTime>,
    cancelled_at: Option<NaiveDateTime>,
}

impl From<LeaveRow> for LeaveRequest {
    fn from(row: LeaveRow) -> Self {
        Self {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row.leave_type,
            from_date: row.from_date,
            to_date: row.to_date,
            duration_mode: row.duration_mode,
            reason: row.reason,
            hand_over_comments: row.hand_over_comments,
            chargeable_days: row.chargeable_days,
            approver_id: row.approver_id,
            second_level_approver_id: row.second_level_approver_id,
            status: row.status,
            approver_comment: row.approver_comment,
            decided_by: row.decided_by,
            comp_off_transactions: row.comp_off_transactions.0,
            customer_holiday_worked_date: row.customer_holiday_worked_date,
            shift_start_from_time: row.shift_start_from_time,
            customer_approved: row.customer_approved,
            logged_time_checked: row.logged_time_checked,
            converted_from: row.converted_from,
            applied_at: row.applied_at,
            decided_at: row.decided_at,
            cancelled_at: row.cancelled_at,
        }
    }
}

#[derive(Clone)]
pub struct LeaveRepository {
    pool: PgPool,
}

impl LeaveRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_where(&self, clause: &str, arg: &str) -> Result<Vec<LeaveRequest>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!("SELECT {LEAVE_COLUMNS} FROM leave_requests {clause}"))
            .bind(arg)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(LeaveRequest::from).collect())
    }
}

#[async_trait]
impl LeaveStore for LeaveRepository {
    async fn insert_leave(&self, r: &LeaveRequest) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // FOR SHARE: uma troca de aprovador concorrente espera o commit
        // (e religa o pedido) ou já terminou (e a comparação falha)
        let current_approver = sqlx::query_scalar::<_, String>(
            "SELECT approver_id FROM employee_approver_map WHERE employee_id = $1 FOR SHARE",
        )
        .bind(&r.employee_id)
        .fetch_optional(&mut *tx)
        .await?;

        if current_approver.as_deref() != r.approver_id.as_deref() {
            return Ok(false);
        }

        sqlx::query(&format!(
            "INSERT INTO leave_requests ({LEAVE_COLUMNS}) VALUES \
             ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)"
        ))
        .bind(r.id)
        .bind(&r.employee_id)
        .bind(r.leave_type)
        .bind(r.from_date)
        .bind(r.to_date)
        .bind(r.duration_mode)
        .bind(&r.reason)
        .bind(&r.hand_over_comments)
        .bind(r.chargeable_days)
        .bind(&r.approver_id)
        .bind(&r.second_level_approver_id)
        .bind(r.status)
        .bind(&r.approver_comment)
        .bind(&r.decided_by)
        .bind(Json(&r.comp_off_transactions))
        .bind(r.customer_holiday_worked_date)
        .bind(r.shift_start_from_time)
        .bind(r.customer_approved)
        .bind(r.logged_time_checked)
        .bind(r.converted_from)
        .bind(r.applied_at)
        .bind(r.decided_at)
        .bind(r.cancelled_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_leave(&self, id: Uuid) -> Result<Option<LeaveRequest>, AppError> {
        let row = sqlx::query_as::<_, LeaveRow>(&format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(LeaveRequest::from))
    }

    async fn leaves_for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        self.fetch_where("WHERE employee_id = $1 ORDER BY from_date DESC", employee_id)
            .await
    }

    async fn pending_for_approver(&self, approver_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        self.fetch_where(
            "WHERE status = 'PENDING' AND (approver_id = $1 OR second_level_approver_id = $1) ORDER BY applied_at ASC",
            approver_id,
        )
        .await
    }

    async fn leaves_overlapping(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<LeaveRequest>, AppError> {
        let rows = sqlx::query_as::<_, LeaveRow>(&format!(
            "SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE from_date <= $2 AND to_date >= $1 ORDER BY employee_id, from_date"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(LeaveRequest::from).collect())
    }

    async fn update_leave_if(
        &self,
        r: &LeaveRequest,
        expected_status: LeaveStatus,
        expected_approver: Option<&str>,
    ) -> Result<bool, AppError> {
        // O WHERE é o compare-and-set: duas decisões concorrentes não passam juntas.
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = $2,
                approver_comment = $3,
                decided_by = $4,
                decided_at = $5,
                cancelled_at = $6,
                customer_approved = $7,
                logged_time_checked = $8
            WHERE id = $1
              AND status = $9
              AND ($10::TEXT IS NULL OR approver_id = $10)
            "#,
        )
        .bind(r.id)
        .bind(r.status)
        .bind(&r.approver_comment)
        .bind(&r.decided_by)
        .bind(r.decided_at)
        .bind(r.cancelled_at)
        .bind(r.customer_approved)
        .bind(r.logged_time_checked)
        .bind(expected_status)
        .bind(expected_approver)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
