use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{missing_parent, no_fields, optional_text, required_text};
use crate::auth::AuthUser;
use crate::database::models::Potential;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPotential {
    pub phase_id: Option<i64>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PotentialUpdate {
    pub category: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: Option<Value>,
}

/// GET /potential/:phase_id - potentials with their latest rating
pub async fn list(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
) -> ApiResult<Vec<Potential>> {
    let potentials = sqlx::query_as::<_, Potential>(
        r#"
        SELECT p.id, p.phase_id, p.category, p.title, p.description,
               (SELECT pr.rating
                FROM potential_ratings pr
                WHERE pr.potential_id = p.id
                ORDER BY pr.updated_at DESC, pr.id DESC
                LIMIT 1) AS rating
        FROM potential p
        WHERE p.phase_id = $1
        ORDER BY p.id
        "#,
    )
    .bind(phase_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(potentials))
}

/// POST /potential
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPotential>,
) -> ApiResult<Value> {
    let phase_id = body
        .phase_id
        .ok_or_else(|| ApiError::invalid_field("phaseId", "Phase ID is required."))?;
    let title = required_text(body.title, "title", "Title is required.")?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO potential (phase_id, category, title, description)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#,
    )
    .bind(phase_id)
    .bind(body.category.as_deref())
    .bind(&title)
    .bind(body.description.as_deref())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| missing_parent(e, "Phase not found."))?;

    tracing::info!(phase_id, potential_id = id, "Potential created");
    Ok(ApiResponse::created(json!({
        "message": "Potential created successfully",
        "id": id
    })))
}

/// PATCH /potential/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<PotentialUpdate>,
) -> ApiResult<Value> {
    if body.category.is_none() && body.title.is_none() && body.description.is_none() {
        return Err(no_fields());
    }
    let title = optional_text(body.title, "title", "Title cannot be blank.")?;

    let result = sqlx::query(
        r#"
        UPDATE potential
        SET category = COALESCE($1, category),
            title = COALESCE($2, title),
            description = COALESCE($3, description)
        WHERE id = $4
        "#,
    )
    .bind(body.category.as_deref())
    .bind(title.as_deref())
    .bind(body.description.as_deref())
    .bind(id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Potential not found."));
    }

    Ok(ApiResponse::success(
        json!({ "message": "Potential updated successfully" }),
    ))
}

/// DELETE /potential/:id - ratings go with it
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM potential WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Potential not found."));
    }

    tracing::info!(potential_id = id, "Potential deleted");
    Ok(ApiResponse::success(
        json!({ "message": "Potential deleted successfully" }),
    ))
}

/// POST /potential/:id/rating - admin only
///
/// Expected Input:
/// ```json
/// { "rating": 4 }
/// ```
///
/// One rating per (potential, user); rating again overwrites the earlier value.
pub async fn rate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<RatingRequest>,
) -> ApiResult<Value> {
    let rating = validate_rating(body.rating.as_ref())?;

    sqlx::query(
        r#"
        INSERT INTO potential_ratings (potential_id, user_id, rating)
        VALUES ($1, $2, $3)
        ON CONFLICT (potential_id, user_id)
        DO UPDATE SET rating = EXCLUDED.rating, updated_at = now()
        "#,
    )
    .bind(id)
    .bind(auth.user_id)
    .bind(rating)
    .execute(&state.pool)
    .await
    .map_err(|e| missing_parent(e, "Potential not found."))?;

    tracing::info!(potential_id = id, user_id = auth.user_id, rating, "Potential rated");
    Ok(ApiResponse::success(json!({
        "message": "Rating saved successfully",
        "rating": rating
    })))
}

/// Accepts only whole numbers in 1..=5
fn validate_rating(raw: Option<&Value>) -> Result<i32, ApiError> {
    raw.and_then(Value::as_i64)
        .filter(|r| RATING_RANGE.contains(r))
        .and_then(|r| i32::try_from(r).ok())
        .ok_or_else(|| ApiError::invalid_field("rating", "Rating must be between 1 and 5."))
}
