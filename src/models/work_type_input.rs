use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Input for creating a work type
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWorkTypeInput {
    pub name: String,
    pub short_name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub deduction: f64,
    #[serde(default = "default_true")]
    pub is_working_day: bool,
    #[serde(default)]
    pub sort_order: i32,
}

/// Input for updating a work type
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateWorkTypeInput {
    pub name: Option<String>,
    pub short_name: Option<String>,
    pub color: Option<String>,
    pub deduction: Option<f64>,
    pub is_working_day: Option<bool>,
    pub sort_order: Option<i32>,
}

/// Response for work type mutations
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkTypeMutationResponse {
    pub success: bool,
    pub message: Option<String>,
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_true() -> bool {
    true
}
