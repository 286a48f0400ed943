// src/config.rs

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::{
    common::i18n::I18nStore,
    db::{memory::Seed, InMemoryStore, Stores},
    services::{
        approver_service::ApproverService, calendar_service::CalendarService,
        compliance_service::ComplianceService, leave_service::LeaveService, report_service::ReportService,
    },
};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_STORE_TIMEOUT_MS: u64 = 3000;
const DEFAULT_REQUIRED_POLICIES: &str = "leave-policy,wfh-policy,code-of-conduct";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Configuração lida do ambiente (com `.env` opcional).
#[derive(Debug, Clone)]
pub struct Settings {
    // Sem DATABASE_URL a aplicação sobe com o store em memória
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub store_timeout: Duration,
    pub required_policies: Vec<String>,
    pub db_max_connections: u32,
    pub seed_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
            required_policies: parse_policies(DEFAULT_REQUIRED_POLICIES),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            seed_file: None,
        }
    }
}

fn parse_policies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR inválido")?;

        let store_timeout_ms = match non_empty("STORE_TIMEOUT_MS") {
            Some(raw) => raw.parse().context("STORE_TIMEOUT_MS deve ser um número de milissegundos")?,
            None => DEFAULT_STORE_TIMEOUT_MS,
        };

        let db_max_connections = match non_empty("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse().context("DB_MAX_CONNECTIONS deve ser um número")?,
            None => DEFAULT_DB_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL"),
            bind_addr,
            store_timeout: Duration::from_millis(store_timeout_ms),
            required_policies: parse_policies(
                &non_empty("REQUIRED_POLICIES").unwrap_or_else(|| DEFAULT_REQUIRED_POLICIES.to_string()),
            ),
            db_max_connections,
            seed_file: non_empty("SEED_FILE").map(PathBuf::from),
        })
    }
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub i18n: Arc<I18nStore>,
    pub calendar_service: CalendarService,
    pub approver_service: ApproverService,
    pub leave_service: LeaveService,
    pub compliance_service: ComplianceService,
    pub report_service: ReportService,
}

impl AppState {
    /// Monta o grafo de dependências a partir dos repositórios escolhidos.
    pub fn build(settings: Settings, stores: Stores, i18n: I18nStore) -> Self {
        let timeout = settings.store_timeout;

        let calendar_service = CalendarService::new(stores.holidays.clone(), timeout);
        let approver_service = ApproverService::new(stores.employees.clone(), timeout);
        let leave_service = LeaveService::new(
            stores.leaves.clone(),
            stores.balances.clone(),
            approver_service.clone(),
            calendar_service.clone(),
            timeout,
        );
        let compliance_service = ComplianceService::new(
            stores.compliance.clone(),
            approver_service.clone(),
            settings.required_policies.clone(),
            timeout,
        );
        let report_service = ReportService::new(
            stores.reports.clone(),
            stores.leaves.clone(),
            stores.mappings.clone(),
            approver_service.clone(),
            calendar_service.clone(),
            timeout,
        );

        Self {
            settings: Arc::new(settings),
            i18n: Arc::new(i18n),
            calendar_service,
            approver_service,
            leave_service,
            compliance_service,
            report_service,
        }
    }

    // A assinatura retorna Result: falha de configuração impede o servidor de subir.
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let i18n = I18nStore::embedded().context("catálogo de traduções inválido")?;

        let stores = match settings.database_url.as_deref() {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(settings.db_max_connections)
                    .acquire_timeout(settings.store_timeout)
                    .connect(database_url)
                    .await
                    .context("falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Stores::postgres(db_pool)
            }
            None => {
                let seed = match settings.seed_file.as_deref() {
                    Some(path) => Seed::from_file(path)?,
                    None => Seed::default(),
                };
                tracing::warn!(
                    "⚠️ DATABASE_URL não definida: usando store em memória ({} colaborador(es) no seed)",
                    seed.employees.len()
                );
                Stores::in_memory(Arc::new(InMemoryStore::from_seed(seed)))
            }
        };

        Ok(Self::build(settings, stores, i18n))
    }
}
