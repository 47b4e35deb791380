use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{no_fields, optional_text};
use crate::database::models::ProductDevelopmentSection;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SectionUpdate {
    pub section_title: Option<String>,
    pub content: Option<String>,
    pub reference_text: Option<String>,
    pub icon_name: Option<String>,
}

impl SectionUpdate {
    fn is_empty(&self) -> bool {
        self.section_title.is_none()
            && self.content.is_none()
            && self.reference_text.is_none()
            && self.icon_name.is_none()
    }
}

/// GET /product-development-sections
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<ProductDevelopmentSection>> {
    let sections = sqlx::query_as::<_, ProductDevelopmentSection>(
        r#"
        SELECT id, section_title, content, reference_text, icon_name, updated_at
        FROM product_development_sections
        ORDER BY id
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(sections))
}

/// PATCH /product-development-sections/:id - returns the updated row
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<SectionUpdate>,
) -> ApiResult<Value> {
    if body.is_empty() {
        return Err(no_fields());
    }
    let section_title = optional_text(
        body.section_title,
        "section_title",
        "Section title cannot be blank.",
    )?;

    let section = sqlx::query_as::<_, ProductDevelopmentSection>(
        r#"
        UPDATE product_development_sections
        SET section_title = COALESCE($1, section_title),
            content = COALESCE($2, content),
            reference_text = COALESCE($3, reference_text),
            icon_name = COALESCE($4, icon_name),
            updated_at = now()
        WHERE id = $5
        RETURNING id, section_title, content, reference_text, icon_name, updated_at
        "#,
    )
    .bind(section_title.as_deref())
    .bind(body.content.as_deref())
    .bind(body.reference_text.as_deref())
    .bind(body.icon_name.as_deref())
    .bind(id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Section not found"))?;

    tracing::info!(section_id = id, "Product development section updated");
    Ok(ApiResponse::success(json!({
        "message": "Section updated successfully",
        "section": section
    })))
}
