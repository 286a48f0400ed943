// src/db/employee_repo.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::{common::error::AppError, db::EmployeeStore, models::employee::Employee};

const SELECT_EMPLOYEE: &str = r#"
    SELECT e.employee_id, e.name, e.joining_date, e.is_lateral_hire,
           m.approver_id,
           COALESCE(w.warning_count, 0::SMALLINT) AS warning_count
    FROM employees e
    LEFT JOIN employee_approver_map m ON m.employee_id = e.employee_id
    LEFT JOIN warning_counts w ON w.employee_id = e.employee_id
"#;

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    employee_id: String,
    name: String,
    joining_date: NaiveDate,
    is_lateral_hire: bool,
    approver_id: Option<String>,
    warning_count: i16,
}

impl EmployeeRow {
    fn into_employee(self, policy_acknowledgments: BTreeMap<String, bool>) -> Employee {
        Employee {
            employee_id: self.employee_id,
            name: self.name,
            joining_date: self.joining_date,
            is_lateral_hire: self.is_lateral_hire,
            approver_id: self.approver_id,
            warning_count: self.warning_count,
            policy_acknowledgments,
        }
    }
}

// Cadastro (employees) + aprovador (employee_approver_map) + avisos (warning_counts)
#[derive(Clone)]
pub struct EmployeeRepository {
    pool: PgPool,
}

impl EmployeeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeStore for EmployeeRepository {
    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        let row = sqlx::query_as::<_, EmployeeRow>(&format!("{SELECT_EMPLOYEE} WHERE e.employee_id = $1"))
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let acks = sqlx::query_as::<_, (String, bool)>(
            "SELECT policy_id, acknowledged FROM policy_acknowledgments WHERE employee_id = $1",
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_employee(acks.into_iter().collect())))
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(&format!("{SELECT_EMPLOYEE} ORDER BY e.employee_id"))
            .fetch_all(&self.pool)
            .await?;

        let acks = sqlx::query_as::<_, (String, String, bool)>(
            "SELECT employee_id, policy_id, acknowledged FROM policy_acknowledgments",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut by_employee: HashMap<String, BTreeMap<String, bool>> = HashMap::new();
        for (employee_id, policy_id, acknowledged) in acks {
            by_employee.entry(employee_id).or_default().insert(policy_id, acknowledged);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let acks = by_employee.remove(&row.employee_id).unwrap_or_default();
                row.into_employee(acks)
            })
            .collect())
    }

    async fn reassign_approver(&self, employee_id: &str, new_approver_id: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO employee_approver_map (employee_id, approver_id, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (employee_id)
            DO UPDATE SET approver_id = EXCLUDED.approver_id, updated_at = NOW()
            "#,
        )
        .bind(employee_id)
        .bind(new_approver_id)
        .execute(&mut *tx)
        .await?;

        // Pedidos pendentes acompanham o novo aprovador; decisões em andamento
        // com o aprovador antigo falham no compare-and-set.
        // O segundo nível, quando existe, vira o aprovador do novo aprovador.
        let rebound = sqlx::query(
            r#"
            UPDATE leave_requests
            SET approver_id = $2,
                second_level_approver_id = CASE
                    WHEN second_level_approver_id IS NULL THEN NULL
                    ELSE COALESCE(
                        (SELECT m.approver_id FROM employee_approver_map m
                         WHERE m.employee_id = $2 AND m.approver_id <> $2),
                        $2
                    )
                END
            WHERE employee_id = $1 AND status = 'PENDING' AND approver_id IS DISTINCT FROM $2
            "#,
        )
        .bind(employee_id)
        .bind(new_approver_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;
        Ok(rebound)
    }
}
