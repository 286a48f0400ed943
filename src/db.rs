// src/db.rs

//! Contratos de persistência. Cada tabela tem um repositório Postgres e o
//! `InMemoryStore` implementa todos (testes e modo dev sem DATABASE_URL).

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{
    employee::Employee,
    holiday::Holiday,
    leave::{LeaveRequest, LeaveStatus, LeaveType},
    report::{DoorEntryMapping, MonthlyReport, ReportQuery, ReportSummary, ReportType},
};

pub mod balance_repo;
pub mod compliance_repo;
pub mod employee_repo;
pub mod holiday_repo;
pub mod leave_repo;
pub mod mapping_repo;
pub mod memory;
pub mod report_repo;

pub use balance_repo::BalanceRepository;
pub use compliance_repo::ComplianceRepository;
pub use employee_repo::EmployeeRepository;
pub use holiday_repo::HolidayRepository;
pub use leave_repo::LeaveRepository;
pub use mapping_repo::DoorMappingRepository;
pub use memory::InMemoryStore;
pub use report_repo::ReportRepository;

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    async fn find_employee(&self, employee_id: &str) -> Result<Option<Employee>, AppError>;

    async fn list_employees(&self) -> Result<Vec<Employee>, AppError>;

    /// Troca o aprovador e religa os pedidos pendentes, tudo numa transação.
    /// O segundo nível dos pedidos religados passa a ser o aprovador do novo
    /// aprovador (ou ele mesmo, no topo da cadeia).
    /// Retorna quantos pedidos pendentes passaram para o novo aprovador.
    async fn reassign_approver(&self, employee_id: &str, new_approver_id: &str) -> Result<u64, AppError>;
}

#[async_trait]
pub trait HolidayStore: Send + Sync {
    async fn holidays_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<Holiday>, AppError>;

    async fn find_holiday(&self, date: NaiveDate) -> Result<Option<Holiday>, AppError>;

    /// false quando já existe feriado na data
    async fn insert_holiday(&self, holiday: &Holiday) -> Result<bool, AppError>;

    /// false quando não existe feriado na data
    async fn update_holiday(&self, holiday: &Holiday) -> Result<bool, AppError>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    /// Insere o pedido só se `request.approver_id` ainda for o aprovador atual
    /// do colaborador. false = houve troca de aprovador desde a leitura.
    async fn insert_leave(&self, request: &LeaveRequest) -> Result<bool, AppError>;

    async fn find_leave(&self, id: Uuid) -> Result<Option<LeaveRequest>, AppError>;

    async fn leaves_for_employee(&self, employee_id: &str) -> Result<Vec<LeaveRequest>, AppError>;

    async fn pending_for_approver(&self, approver_id: &str) -> Result<Vec<LeaveRequest>, AppError>;

    async fn leaves_overlapping(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<LeaveRequest>, AppError>;

    /// Compare-and-set: grava `updated` apenas se o registro ainda estiver em
    /// `expected_status` (e com `expected_approver`, quando informado).
    /// false = outro processo mudou o pedido antes.
    async fn update_leave_if(
        &self,
        updated: &LeaveRequest,
        expected_status: LeaveStatus,
        expected_approver: Option<&str>,
    ) -> Result<bool, AppError>;
}

/// Saldo de licença (sistema de folha). None = sem saldo cadastrado.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn available_balance(&self, employee_id: &str, leave_type: LeaveType) -> Result<Option<Decimal>, AppError>;
}

/// Recebe o contador atual e os aceites do colaborador, lidos sob a mesma trava.
pub type WarningUpdate = dyn Fn(i16, &BTreeMap<String, bool>) -> i16 + Send + Sync;

#[async_trait]
pub trait ComplianceStore: Send + Sync {
    /// Marca a política como aceita e devolve o mapa atualizado do colaborador.
    async fn record_acknowledgment(
        &self,
        employee_id: &str,
        policy_id: &str,
    ) -> Result<BTreeMap<String, bool>, AppError>;

    /// Lê contador e aceites, aplica `next` e grava, tudo de forma atômica.
    async fn update_warning_count(&self, employee_id: &str, next: &WarningUpdate) -> Result<i16, AppError>;
}

/// Trava de geração de um período, válida entre instâncias.
/// No Postgres segura a transação do advisory lock; solta no drop.
pub struct PeriodLock {
    _tx: Option<Transaction<'static, Postgres>>,
}

impl PeriodLock {
    // Processo único: o GenerationGuard já basta
    pub fn local() -> Self {
        Self { _tx: None }
    }

    pub fn held_by(tx: Transaction<'static, Postgres>) -> Self {
        Self { _tx: Some(tx) }
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// None = outra instância está gerando o mesmo período.
    async fn try_lock_period(
        &self,
        report_type: ReportType,
        month: i16,
        year: i32,
    ) -> Result<Option<PeriodLock>, AppError>;

    async fn insert_report(&self, report: &MonthlyReport) -> Result<(), AppError>;

    async fn find_report(&self, id: Uuid) -> Result<Option<MonthlyReport>, AppError>;

    async fn latest_report(
        &self,
        report_type: ReportType,
        month: i16,
        year: i32,
    ) -> Result<Option<MonthlyReport>, AppError>;

    async fn list_reports(&self, query: &ReportQuery) -> Result<Vec<ReportSummary>, AppError>;
}

#[async_trait]
pub trait DoorMappingStore: Send + Sync {
    async fn upsert_mapping(&self, mapping: &DoorEntryMapping) -> Result<(), AppError>;

    async fn list_mappings(&self) -> Result<Vec<DoorEntryMapping>, AppError>;
}

/// Conjunto de repositórios usado pelos serviços.
#[derive(Clone)]
pub struct Stores {
    pub employees: Arc<dyn EmployeeStore>,
    pub holidays: Arc<dyn HolidayStore>,
    pub leaves: Arc<dyn LeaveStore>,
    pub balances: Arc<dyn BalanceSource>,
    pub compliance: Arc<dyn ComplianceStore>,
    pub reports: Arc<dyn ReportStore>,
    pub mappings: Arc<dyn DoorMappingStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            employees: Arc::new(EmployeeRepository::new(pool.clone())),
            holidays: Arc::new(HolidayRepository::new(pool.clone())),
            leaves: Arc::new(LeaveRepository::new(pool.clone())),
            balances: Arc::new(BalanceRepository::new(pool.clone())),
            compliance: Arc::new(ComplianceRepository::new(pool.clone())),
            reports: Arc::new(ReportRepository::new(pool.clone())),
            mappings: Arc::new(DoorMappingRepository::new(pool)),
        }
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            employees: store.clone(),
            holidays: store.clone(),
            leaves: store.clone(),
            balances: store.clone(),
            compliance: store.clone(),
            reports: store.clone(),
            mappings: store,
        }
    }
}
