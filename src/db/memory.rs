// src/db/memory.rs

//! Implementação em memória de todos os repositórios.
//!
//! Usada pelos testes de integração e pelo modo dev (sem DATABASE_URL).
//! Um único `RwLock` protege tudo, então cada operação é atômica como
//! uma transação do Postgres.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{
        BalanceSource, ComplianceStore, DoorMappingStore, EmployeeStore, HolidayStore, LeaveStore, PeriodLock,
        ReportStore, WarningUpdate,
    },
    models::{
        employee::Employee,
        holiday::Holiday,
        leave::{LeaveRequest, LeaveStatus, LeaveType},
        report::{DoorEntryMapping, MonthlyReport, ReportQuery, ReportSummary, ReportType},
    },
};

// --- Seed (JSON) ---

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub employees: Vec<SeedEmployee>,
    #[serde(default)]
    pub holidays: Vec<Holiday>,
    #[serde(default)]
    pub balances: Vec<SeedBalance>,
    #[serde(default)]
    pub door_mappings: Vec<DoorEntryMapping>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedEmployee {
    pub employee_id: String,
    pub name: String,
    pub joining_date: NaiveDate,
    #[serde(default)]
    pub is_lateral_hire: bool,
    pub approver_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedBalance {
    pub employee_id: String,
    pub leave_type: LeaveType,
    pub available: Decimal,
}

impl Seed {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path).with_context(|| format!("lendo seed {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("seed inválido em {}", path.display()))
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    employees: BTreeMap<String, Employee>,
    holidays: BTreeMap<NaiveDate, Holiday>,
    leaves: BTreeMap<Uuid, LeaveRequest>,
    balances: HashMap<(String, LeaveType), Decimal>,
    reports: Vec<MonthlyReport>,
    mappings: BTreeMap<String, DoorEntryMapping>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: Seed) -> Self {
        let mut state = MemoryState::default();

        for e in seed.employees {
            state.employees.insert(
                e.employee_id.clone(),
                Employee {
                    employee_id: e.employee_id,
                    name: e.name,
                    joining_date: e.joining_date,
                    is_lateral_hire: e.is_lateral_hire,
                    approver_id: e.approver_id,
                    warning_count: 0,
                    policy_acknowledgments: BTreeMap::new(),
                },
            );
        }
        for h in seed.holidays {
            state.holidays.insert(h.date, h);
        }
        for b in seed.balances {
            state.balances.insert((b.employee_id, b.leave_type), b.available);
        }
        for m in seed.door_mappings {
            state.mappings.insert(m.employee_id.clone(), m);
        }

        Self { state: RwLock::new(state) }
    }

    // --- Helpers de carga (testes e seed) ---

    pub async fn put_employee(&self, employee: Employee) {
        self.state.write().await.employees.insert(employee.employee_id.clone(), employee);
    }

    pub async fn put_holiday(&self, holiday: Holiday) {
        self.state.write().await.holidays.insert(holiday.date, holiday);
    }

    pub async fn set_balance(&self, employee_id: &str, leave_type: LeaveType, available: Decimal) {
        self.state
            .write()
            .await
            .balances
            .insert((employee_id.to_string(), leave_type), available);
    }

    pub async fn put_leave(&self, request: LeaveRequest) {
        self.state.write().await.leaves.insert(request.id, request);
    }

    pub async fn count_reports(&self, report_type: ReportType, month: i16, year: i32) -> usize {
        self.state
            .read()
            .await
            .reports
            .iter()
            .filter(|r| r.report_type == report_type && r.period_month == month && r.period_year == year)
            .count()
    }
}

#[async_trait]
impl EmployeeStore for InMemoryStore {
    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, AppError> {
        Ok(self.state.read().await.employees.get(employee_id).cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.state.read().await.employees.values().cloned().collect())
    }

    async fn reassign_approver(&self, employee_id: &str, new_approver_id: &str) -> Result<u64, AppError> {
        let mut state = self.state.write().await;

        let second_level = state
            .employees
            .get(new_approver_id)
            .and_then(|approver| approver.approver_id.clone())
            .filter(|second| second != new_approver_id)
            .unwrap_or_else(|| new_approver_id.to_string());

        let employee = state
            .employees
            .get_mut(employee_id)
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))?;
        employee.approver_id = Some(new_approver_id.to_string());

        let mut rebound = 0;
        for request in state.leaves.values_mut() {
            if request.employee_id == employee_id
                && request.status == LeaveStatus::Pending
                && request.approver_id.as_deref() != Some(new_approver_id)
            {
                request.approver_id = Some(new_approver_id.to_string());
                if request.second_level_approver_id.is_some() {
                    request.second_level_approver_id = Some(second_level.clone());
                }
                rebound += 1;
            }
        }
        Ok(rebound)
    }
}

#[async_trait]
impl HolidayStore for InMemoryStore {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Holiday>, AppError> {
        if to < from {
            return Ok(Vec::new());
        }
        Ok(self.state.read().await.holidays.range(from..=to).map(|(_, h)| h.clone()).collect())
    }

    async fn find_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError> {
        Ok(self.state.read().await.holidays.get(&date).cloned())
    }

    async fn insert_holiday(&self, holiday: &Holiday) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.holidays.contains_key(&holiday.date) {
            return Ok(false);
        }
        state.holidays.insert(holiday.date, holiday.clone());
        Ok(true)
    }

    async fn update_holiday(&self, holiday: &Holiday) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        match state.holidays.get_mut(&holiday.date) {
            Some(existing) => {
                existing.name = holiday.name.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl LeaveStore for InMemoryStore {
    async fn insert_leave(&self, request: &LeaveRequest) -> Result<bool, AppError> {
        let mut state = self.state.write().await;

        let current_approver = state
            .employees
            .get(&request.employee_id)
            .and_then(|e| e.approver_id.as_deref());
        if current_approver != request.approver_id.as_deref() {
            return Ok(false);
        }

        state.leaves.insert(request.id, request.clone());
        Ok(true)
    }

    async fn find_leave(&self, id: Uuid) -> Result<Option<LeaveRequest>, AppError> {
        Ok(self.state.read().await.leaves.get(&id).cloned())
    }

    async fn leaves_for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        let state = self.state.read().await;
        let mut leaves: Vec<LeaveRequest> = state
            .leaves
            .values()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        leaves.sort_by(|a, b| b.from_date.cmp(&a.from_date));
        Ok(leaves)
    }

    async fn pending_for_approver(&self, approver_id: &str) -> Result<Vec<LeaveRequest>, AppError> {
        let state = self.state.read().await;
        let mut leaves: Vec<LeaveRequest> = state
            .leaves
            .values()
            .filter(|r| {
                r.status == LeaveStatus::Pending
                    && (r.approver_id.as_deref() == Some(approver_id)
                        || r.second_level_approver_id.as_deref() == Some(approver_id))
            })
            .cloned()
            .collect();
        leaves.sort_by_key(|r| r.applied_at);
        Ok(leaves)
    }

    async fn leaves_overlapping(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<LeaveRequest>, AppError> {
        let state = self.state.read().await;
        Ok(state.leaves.values().filter(|r| r.overlaps(from, to)).cloned().collect())
    }

    async fn update_leave_if(
        &self,
        updated: &LeaveRequest,
        expected_status: LeaveStatus,
        expected_approver: Option<&str>,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let Some(current) = state.leaves.get_mut(&updated.id) else {
            return Ok(false);
        };

        let approver_matches = expected_approver.is_none_or(|a| current.approver_id.as_deref() == Some(a));
        if current.status != expected_status || !approver_matches {
            return Ok(false);
        }

        *current = updated.clone();
        Ok(true)
    }
}

#[async_trait]
impl BalanceSource for InMemoryStore {
    async fn available_balance(&self, employee_id: &str, leave_type: LeaveType) -> Result<Option<Decimal>, AppError> {
        Ok(self
            .state
            .read()
            .await
            .balances
            .get(&(employee_id.to_string(), leave_type))
            .copied())
    }
}

#[async_trait]
impl ComplianceStore for InMemoryStore {
    async fn record_acknowledgment(
        &self,
        employee_id: &str,
        policy_id: &str,
    ) -> Result<BTreeMap<String, bool>, AppError> {
        let mut state = self.state.write().await;
        let employee = state
            .employees
            .get_mut(employee_id)
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))?;
        employee.policy_acknowledgments.insert(policy_id.to_string(), true);
        Ok(employee.policy_acknowledgments.clone())
    }

    async fn update_warning_count(&self, employee_id: &str, next: &WarningUpdate) -> Result<i16, AppError> {
        let mut state = self.state.write().await;
        let employee = state
            .employees
            .get_mut(employee_id)
            .ok_or_else(|| AppError::NotFound(format!("employee {employee_id}")))?;
        employee.warning_count = next(employee.warning_count, &employee.policy_acknowledgments);
        Ok(employee.warning_count)
    }
}

#[async_trait]
impl ReportStore for InMemoryStore {
    async fn try_lock_period(
        &self,
        _report_type: ReportType,
        _month: i16,
        _year: i32,
    ) -> Result<Option<PeriodLock>, AppError> {
        Ok(Some(PeriodLock::local()))
    }

    async fn insert_report(&self, report: &MonthlyReport) -> Result<(), AppError> {
        self.state.write().await.reports.push(report.clone());
        Ok(())
    }

    async fn find_report(&self, id: Uuid) -> Result<Option<MonthlyReport>, AppError> {
        Ok(self.state.read().await.reports.iter().find(|r| r.id == id).cloned())
    }

    async fn latest_report(
        &self,
        report_type: ReportType,
        month: i16,
        year: i32,
    ) -> Result<Option<MonthlyReport>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .reports
            .iter()
            .filter(|r| r.report_type == report_type && r.period_month == month && r.period_year == year)
            .max_by_key(|r| r.generated_at)
            .cloned())
    }

    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<ReportSummary>, AppError> {
        let state = self.state.read().await;
        let mut reports: Vec<ReportSummary> = state
            .reports
            .iter()
            .filter(|r| query.report_type.is_none_or(|t| r.report_type == t))
            .filter(|r| query.month.is_none_or(|m| r.period_month == m))
            .filter(|r| query.year.is_none_or(|y| r.period_year == y))
            .map(ReportSummary::from)
            .collect();
        reports.sort_by(|a, b| b.generated_at.cmp(&a.generated_at));
        Ok(reports)
    }
}

#[async_trait]
impl DoorMappingStore for InMemoryStore {
    async fn upsert_mapping(&self, mapping: &DoorEntryMapping) -> Result<(), AppError> {
        self.state
            .write()
            .await
            .mappings
            .insert(mapping.employee_id.clone(), mapping.clone());
        Ok(())
    }

    async fn list_mappings(&self) -> Result<Vec<DoorEntryMapping>, AppError> {
        Ok(self.state.read().await.mappings.values().cloned().collect())
    }
}
