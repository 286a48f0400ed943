// src/engine.rs

//! Núcleo de regras, sem I/O. Serviços chamam daqui e persistem o resultado.

pub mod calendar;
pub mod compliance;
pub mod day_calculator;
pub mod leave_report;
pub mod policy;
pub mod reconciliation;
pub mod state_machine;
