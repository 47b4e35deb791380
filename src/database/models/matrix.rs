use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatrixCategory {
    pub id: i64,
    pub phase_id: i64,
    pub category_type: String,
    pub category_title: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub detail_text: Option<String>,
}
