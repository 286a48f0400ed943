// src/models/compliance.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgePolicyPayload {
    #[validate(length(min = 1, max = 80, message = "required"))]
    #[schema(example = "wfh-policy")]
    pub policy_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WarningResponse {
    #[schema(example = 2)]
    pub warning_count: i16,
    // Quatro avisos: o serviço de ciclo de vida da conta precisa agir
    pub escalated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceStatus {
    pub employee_id: String,
    pub pending_policies: Vec<String>,
    pub fully_acknowledged: bool,
    pub warning_count: i16,
    pub escalated: bool,
}
