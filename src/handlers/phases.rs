use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::required_text;
use crate::database::models::Phase;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PhaseTitle {
    pub title: Option<String>,
}

/// GET /phases
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Phase>> {
    let phases = sqlx::query_as::<_, Phase>(
        "SELECT id, phase_no, title FROM phases ORDER BY phase_no, id",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(phases))
}

/// GET /phases/:phase_id
pub async fn get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Phase> {
    let phase = sqlx::query_as::<_, Phase>("SELECT id, phase_no, title FROM phases WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Phase not found."))?;

    Ok(ApiResponse::success(phase))
}

/// PATCH /phases/:phase_id - retitle a phase
pub async fn update_title(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<PhaseTitle>,
) -> ApiResult<Value> {
    let title = required_text(body.title, "title", "Title is required.")?;

    let result = sqlx::query("UPDATE phases SET title = $1 WHERE id = $2")
        .bind(&title)
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Phase not found."));
    }

    tracing::info!(phase_id = id, "Phase title updated");
    Ok(ApiResponse::success(
        json!({ "message": "Phase title updated successfully" }),
    ))
}
