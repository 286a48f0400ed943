// src/models/holiday.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Holiday {
    #[schema(example = "2025-01-26")]
    pub date: NaiveDate,
    #[schema(example = "Republic Day")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolidayPayload {
    #[schema(example = "2025-08-15")]
    pub date: NaiveDate,

    #[validate(length(min = 1, max = 120, message = "required"))]
    #[schema(example = "Independence Day")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct HolidayQuery {
    #[validate(range(min = 1970, max = 2100))]
    pub from_year: i32,
    #[validate(range(min = 1970, max = 2100))]
    pub to_year: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHolidayPayload {
    #[validate(length(min = 1, max = 120, message = "required"))]
    #[schema(example = "Independence Day (observed)")]
    pub name: String,
}
