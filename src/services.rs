// src/services.rs

pub mod approver_service;
pub mod calendar_service;
pub mod compliance_service;
pub mod generation_guard;
pub mod leave_service;
pub mod report_service;
