pub mod auth;
pub mod json;
pub mod response;

pub use auth::{ensure_owner, require_admin, require_authenticated};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
