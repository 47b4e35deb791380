use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{missing_parent, no_fields, required_text};
use crate::database::models::MatrixCategory;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MatrixView {
    pub categories: BTreeMap<String, Vec<MatrixCategory>>,
}

#[derive(Debug, Deserialize)]
pub struct NewMatrixCategory {
    pub phase_id: Option<i64>,
    pub category_type: Option<String>,
    pub category_title: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub detail_text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MatrixContentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub detail_text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTitleUpdate {
    pub category_type: Option<String>,
    pub title: Option<String>,
}

/// GET /matrix/phase/:phase_id - rows grouped by category type
pub async fn for_phase(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
) -> ApiResult<MatrixView> {
    let rows = sqlx::query_as::<_, MatrixCategory>(
        r#"
        SELECT id, phase_id, category_type, category_title, title, description, detail_text
        FROM matrix_categories
        WHERE phase_id = $1
        ORDER BY category_type, id
        "#,
    )
    .bind(phase_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(MatrixView {
        categories: group_by_type(rows),
    }))
}

/// POST /matrix/categories
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewMatrixCategory>,
) -> ApiResult<Value> {
    let phase_id = body
        .phase_id
        .ok_or_else(|| ApiError::invalid_field("phase_id", "Phase ID is required."))?;
    let category_type = required_text(
        body.category_type,
        "category_type",
        "Category type is required.",
    )?;

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO matrix_categories
            (phase_id, category_type, category_title, title, description, detail_text)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(phase_id)
    .bind(&category_type)
    .bind(body.category_title.as_deref())
    .bind(body.title.as_deref())
    .bind(body.description.as_deref())
    .bind(body.detail_text.as_deref())
    .fetch_one(&state.pool)
    .await
    .map_err(|e| missing_parent(e, "Phase not found."))?;

    tracing::info!(phase_id, matrix_category_id = id, "Matrix category created");
    Ok(ApiResponse::created(json!({
        "message": "Matrix category created successfully",
        "id": id
    })))
}

/// PATCH /matrix/categories/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<MatrixContentUpdate>,
) -> ApiResult<Value> {
    if body.title.is_none() && body.description.is_none() && body.detail_text.is_none() {
        return Err(no_fields());
    }

    let result = sqlx::query(
        r#"
        UPDATE matrix_categories
        SET title = COALESCE($1, title),
            description = COALESCE($2, description),
            detail_text = COALESCE($3, detail_text)
        WHERE id = $4
        "#,
    )
    .bind(body.title.as_deref())
    .bind(body.description.as_deref())
    .bind(body.detail_text.as_deref())
    .bind(id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Matrix category not found."));
    }

    Ok(ApiResponse::success(
        json!({ "message": "Matrix category updated successfully" }),
    ))
}

/// DELETE /matrix/categories/:id
pub async fn delete(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    let result = sqlx::query("DELETE FROM matrix_categories WHERE id = $1")
        .bind(id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Matrix category not found."));
    }

    Ok(ApiResponse::success(
        json!({ "message": "Matrix category deleted successfully" }),
    ))
}

/// PATCH /matrix/category-titles/:phase_id - retitle every row of one category type
pub async fn update_category_title(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
    ApiJson(body): ApiJson<CategoryTitleUpdate>,
) -> ApiResult<Value> {
    let category_type = required_text(
        body.category_type,
        "categoryType",
        "Category type and title are required.",
    )?;
    let title = required_text(body.title, "title", "Category type and title are required.")?;

    let result = sqlx::query(
        "UPDATE matrix_categories SET category_title = $1 WHERE phase_id = $2 AND category_type = $3",
    )
    .bind(&title)
    .bind(phase_id)
    .bind(&category_type)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("No matrix categories found for this phase and type."));
    }

    tracing::info!(phase_id, %category_type, rows = result.rows_affected(), "Category title updated");
    Ok(ApiResponse::success(json!({
        "message": "Category title updated successfully",
        "updated": result.rows_affected()
    })))
}

/// Buckets rows under their `category_type`, keeping row order within a bucket
fn group_by_type(rows: Vec<MatrixCategory>) -> BTreeMap<String, Vec<MatrixCategory>> {
    let mut grouped: BTreeMap<String, Vec<MatrixCategory>> = BTreeMap::new();
    for row in rows {
        grouped.entry(row.category_type.clone()).or_default().push(row);
    }
    grouped
}
