use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::database::DatabaseManager;
use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET / - service banner
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Phase Matrix API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Phased product-development matrix service",
        "endpoints": {
            "home": "/, /health (public)",
            "users": "/users/login (public), /users/:id (protected, owner only)",
            "phases": "/phases[/:phase_id] (public read, protected write)",
            "subphases": "/phases/:phase_id/subphases[/:id] (public read, protected write)",
            "potential": "/potential[/:id] (public read, protected write), /potential/:id/rating (admin)",
            "matrix": "/matrix/phase/:phase_id (public), /matrix/categories[/:id], /matrix/category-titles/:phase_id (protected)",
            "profile": "/profile/:phase_id (public), /profile/:phase_id/section[/:section_id] (protected)",
            "product_development": "/product-development-sections[/:id] (public read, protected write)"
        }
    }))
}

/// GET /health - 503 when the database does not answer
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();

    match DatabaseManager::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
