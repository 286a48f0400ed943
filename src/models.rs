pub mod compliance;
pub mod employee;
pub mod holiday;
pub mod leave;
pub mod report;
