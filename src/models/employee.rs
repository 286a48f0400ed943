// src/models/employee.rs

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::leave::LeaveType;

// O cadastro vem do onboarding do RH (serviço externo); aqui só lemos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[schema(example = "EMP001")]
    pub employee_id: String,
    #[schema(example = "Ana Souza")]
    pub name: String,
    #[schema(example = "2024-02-01")]
    pub joining_date: NaiveDate,
    pub is_lateral_hire: bool,
    #[schema(example = "EMP010")]
    pub approver_id: Option<String>,
    #[schema(example = 1)]
    pub warning_count: i16,
    pub policy_acknowledgments: BTreeMap<String, bool>,
}

impl Employee {
    /// Dias completos de casa na data informada.
    pub fn tenure_days(&self, today: NaiveDate) -> i64 {
        (today - self.joining_date).num_days()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaveTypesResponse {
    pub leave_types: Vec<LeaveType>,
    #[schema(example = "EMP010")]
    pub approver_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateApproverPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "EMP020")]
    pub new_approver_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproverResponse {
    pub employee_id: String,
    pub approver_id: String,
    // Pedidos pendentes que passaram para o novo aprovador
    pub rebound_requests: u64,
}
