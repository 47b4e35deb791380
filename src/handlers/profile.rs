use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{missing_parent, no_fields, optional_text, required_text};
use crate::database::models::{PhaseSummary, ProfileSection, ProfileSectionWithPhase};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

const SECTION_COLUMNS: &str =
    "id, phase_id, section_title, content, reference_text, section_icon, display_order, updated_at";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub phase_details: PhaseSummary,
    pub sections: Vec<ProfileSectionWithPhase>,
}

#[derive(Debug, Deserialize)]
pub struct NewProfileSection {
    pub section_title: Option<String>,
    pub content: Option<String>,
    pub reference_text: Option<String>,
    pub section_icon: Option<String>,
    pub display_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileSectionUpdate {
    pub section_title: Option<String>,
    pub content: Option<String>,
    pub reference_text: Option<String>,
}

/// GET /profile/:phase_id
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "phaseDetails": { "title": "Discovery", "phaseNo": 1 },
///     "sections": [{ "id": 3, "section_title": "...", "phase_title": "Discovery", "phaseNo": 1, ... }]
///   }
/// }
/// ```
pub async fn for_phase(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
) -> ApiResult<ProfileView> {
    let sections = sqlx::query_as::<_, ProfileSectionWithPhase>(
        r#"
        SELECT ps.id, ps.phase_id, ps.section_title, ps.content, ps.reference_text,
               ps.section_icon, ps.display_order, ps.updated_at,
               p.title AS phase_title, p.phase_no
        FROM profile_sections ps
        JOIN phases p ON p.id = ps.phase_id
        WHERE ps.phase_id = $1
        ORDER BY ps.display_order, ps.id
        "#,
    )
    .bind(phase_id)
    .fetch_all(&state.pool)
    .await?;

    let Some(first) = sections.first() else {
        return Err(ApiError::not_found("No profile sections found for this phase"));
    };

    let phase_details = PhaseSummary {
        title: first.phase_title.clone(),
        phase_no: first.phase_no,
    };

    Ok(ApiResponse::success(ProfileView {
        phase_details,
        sections,
    }))
}

/// POST /profile/:phase_id/section - appended after the last section unless
/// `display_order` is given
pub async fn create_section(
    State(state): State<AppState>,
    Path(phase_id): Path<i64>,
    ApiJson(body): ApiJson<NewProfileSection>,
) -> ApiResult<Value> {
    let section_title = required_text(
        body.section_title,
        "section_title",
        "Section title is required.",
    )?;

    let section = sqlx::query_as::<_, ProfileSection>(&format!(
        r#"
        INSERT INTO profile_sections
            (phase_id, section_title, content, reference_text, section_icon, display_order)
        VALUES ($1, $2, $3, $4, $5,
                COALESCE($6, (SELECT COALESCE(MAX(display_order), 0) + 1
                              FROM profile_sections WHERE phase_id = $1)))
        RETURNING {}
        "#,
        SECTION_COLUMNS
    ))
    .bind(phase_id)
    .bind(&section_title)
    .bind(body.content.as_deref())
    .bind(body.reference_text.as_deref())
    .bind(body.section_icon.as_deref())
    .bind(body.display_order)
    .fetch_one(&state.pool)
    .await
    .map_err(|e| missing_parent(e, "Phase not found."))?;

    tracing::info!(phase_id, section_id = section.id, "Profile section created");
    Ok(ApiResponse::created(json!({
        "message": "Section created successfully",
        "section": section
    })))
}

/// PATCH /profile/:phase_id/section/:section_id
pub async fn update_section(
    State(state): State<AppState>,
    Path((phase_id, section_id)): Path<(i64, i64)>,
    ApiJson(body): ApiJson<ProfileSectionUpdate>,
) -> ApiResult<Value> {
    if body.section_title.is_none() && body.content.is_none() && body.reference_text.is_none() {
        return Err(no_fields());
    }
    let section_title = optional_text(
        body.section_title,
        "section_title",
        "Section title cannot be blank.",
    )?;

    let section = sqlx::query_as::<_, ProfileSection>(&format!(
        r#"
        UPDATE profile_sections
        SET section_title = COALESCE($1, section_title),
            content = COALESCE($2, content),
            reference_text = COALESCE($3, reference_text),
            updated_at = now()
        WHERE id = $4 AND phase_id = $5
        RETURNING {}
        "#,
        SECTION_COLUMNS
    ))
    .bind(section_title.as_deref())
    .bind(body.content.as_deref())
    .bind(body.reference_text.as_deref())
    .bind(section_id)
    .bind(phase_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| ApiError::not_found("Section not found"))?;

    Ok(ApiResponse::success(json!({
        "message": "Section updated successfully",
        "section": section
    })))
}
