// src/middleware.rs

pub mod actor;
pub mod i18n;
pub mod rbac;
