use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductDevelopmentSection {
    pub id: i64,
    pub section_title: String,
    pub content: Option<String>,
    pub reference_text: Option<String>,
    pub icon_name: Option<String>,
    pub updated_at: DateTime<Utc>,
}
