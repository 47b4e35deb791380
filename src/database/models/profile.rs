use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileSection {
    pub id: i64,
    pub phase_id: i64,
    pub section_title: String,
    pub content: Option<String>,
    pub reference_text: Option<String>,
    pub section_icon: Option<String>,
    pub display_order: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProfileSectionWithPhase {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub section: ProfileSection,
    pub phase_title: String,
    #[serde(rename = "phaseNo")]
    pub phase_no: i32,
}
