use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Phase {
    pub id: i64,
    #[serde(rename = "phaseNo")]
    pub phase_no: i32,
    pub title: String,
}

/// Heading shown above a phase's profile sections
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PhaseSummary {
    pub title: String,
    #[serde(rename = "phaseNo")]
    pub phase_no: i32,
}
