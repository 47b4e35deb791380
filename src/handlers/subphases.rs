use axum::extract::{Path, State};
use serde_json::{json, Value};

use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::ordering::{NewSubphase, Subphase, SubphaseUpdate};
use crate::state::AppState;

/// GET /phases/:phase_id/subphases - children in order, each with ordered details
pub async fn list(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
) -> ApiResult<Vec<Subphase>> {
    let subphases = state.subphases.list(phase_id).await?;
    Ok(ApiResponse::success(subphases))
}

/// POST /phases/:phase_id/subphases
///
/// Expected Input:
/// ```json
/// { "name": "string", "details": ["first line", "second line"] }
/// ```
///
/// The new subphase lands after every existing sibling.
pub async fn create(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
    ApiJson(body): ApiJson<NewSubphase>,
) -> ApiResult<Value> {
    let id = state.subphases.append(phase_id, body).await?;
    Ok(ApiResponse::created(json!({
        "message": "Subphase created successfully",
        "id": id
    })))
}

/// PATCH /phases/:phase_id/subphases/:id - rename and/or replace the detail list
pub async fn update(
    State(state): State<AppState>,
    Path((phase_id, id)): Path<(i64, i64)>,
    ApiJson(changes): ApiJson<SubphaseUpdate>,
) -> ApiResult<Value> {
    state.subphases.update(phase_id, id, changes).await?;
    Ok(ApiResponse::success(
        json!({ "message": "Subphase updated successfully" }),
    ))
}

/// DELETE /phases/:phase_id/subphases/:id - remove and close the ordering gap
pub async fn delete(
    State(state): State<AppState>,
    Path((phase_id, id)): Path<(i64, i64)>,
) -> ApiResult<Value> {
    state.subphases.remove_and_compact(phase_id, id).await?;
    Ok(ApiResponse::success(
        json!({ "message": "Subphase deleted successfully" }),
    ))
}
