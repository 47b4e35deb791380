use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// bcrypt hash
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
}
