// src/handlers.rs

pub mod compliance;
pub mod employees;
pub mod holidays;
pub mod leaves;
pub mod reports;
