use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Potential {
    pub id: i64,
    #[serde(rename = "phaseId")]
    pub phase_id: i64,
    pub category: Option<String>,
    pub title: String,
    pub description: Option<String>,
    /// Most recently saved rating, if any
    pub rating: Option<i32>,
}
