// src/services/generation_guard.rs

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::{common::error::AppError, models::report::ReportType};

type PeriodKey = (ReportType, i16, i32);

/// Serializa a geração por (tipo, mês, ano) dentro do processo: a segunda
/// tentativa concorrente recebe `GenerationInProgress` em vez de esperar.
/// Entre réplicas vale o `ReportStore::try_lock_period`.
#[derive(Debug, Clone, Default)]
pub struct GenerationGuard {
    in_flight: Arc<Mutex<HashSet<PeriodKey>>>,
}

/// Libera o período quando sai de escopo (inclusive em erro ou cancelamento da task).
#[derive(Debug)]
pub struct GenerationPermit {
    key: PeriodKey,
    in_flight: Arc<Mutex<HashSet<PeriodKey>>>,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, report_type: ReportType, month: i16, year: i32) -> Result<GenerationPermit, AppError> {
        let key = (report_type, month, year);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);

        if !in_flight.insert(key) {
            return Err(AppError::GenerationInProgress { report_type, month, year });
        }

        Ok(GenerationPermit { key, in_flight: Arc::clone(&self.in_flight) })
    }
}

impl Drop for GenerationPermit {
    fn drop(&mut self) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
