use axum::{
    extract::{Path, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{no_fields, optional_text, required_text};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::{AuthUser, Role};
use crate::database::models::User;
use crate::error::{sqlstate, ApiError, UNIQUE_VIOLATION};
use crate::middleware::{ensure_owner, ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub new_username: Option<String>,
    pub new_password: Option<String>,
}

/// POST /users/login - exchange credentials for a one-hour bearer token
///
/// Expected Input:
/// ```json
/// { "username": "string", "password": "string" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// { "success": true, "data": { "token": "eyJhbGciOiJSUzI1NiI..." } }
/// ```
///
/// Unknown usernames and wrong passwords both answer 401 with the same message.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<Value> {
    let (username, password) = match (body.username, body.password) {
        (Some(u), Some(p)) if !u.trim().is_empty() && !p.is_empty() => (u.trim().to_string(), p),
        _ => return Err(ApiError::bad_request("Username and password are required.")),
    };

    let user = find_by_username(&state, &username).await?;
    let Some(user) = user else {
        tracing::info!("Login rejected: unknown user");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    if !verify_password(password, user.password.clone()).await? {
        tracing::info!(user_id = user.id, "Login rejected: bad password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let role = parse_role(&user)?;
    let token = state.tokens.issue(AuthUser {
        user_id: user.id,
        role,
    })?;

    tracing::info!(user_id = user.id, role = %role, "User logged in");
    Ok(ApiResponse::success(json!({ "token": token })))
}

/// PATCH /users/:id - change own username and/or password
///
/// The current username and password must accompany the change.
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    ApiJson(body): ApiJson<CredentialUpdate>,
) -> ApiResult<Value> {
    ensure_owner(&auth, id)?;

    let new_username = optional_text(body.new_username, "newUsername", "Username cannot be blank.")?;
    let new_password = body.new_password.filter(|p| !p.is_empty());
    if new_username.is_none() && new_password.is_none() {
        return Err(no_fields());
    }

    let username = required_text(
        body.username,
        "username",
        "Current username and password are required.",
    )?;
    let password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::bad_request("Current username and password are required."))?;

    let user = find_by_username(&state, &username)
        .await?
        .filter(|user| user.id == id)
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    if !verify_password(password, user.password.clone()).await? {
        tracing::info!(user_id = id, "Credential update rejected: bad password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let new_hash = match new_password {
        Some(plain) => Some(hash_password(plain).await?),
        None => None,
    };

    sqlx::query(
        r#"
        UPDATE users
        SET username = COALESCE($1, username),
            password = COALESCE($2, password),
            updated_at = now()
        WHERE id = $3
        "#,
    )
    .bind(new_username.as_deref())
    .bind(new_hash.as_deref())
    .bind(id)
    .execute(&state.pool)
    .await
    .map_err(|e| match sqlstate(&e).as_deref() {
        Some(UNIQUE_VIOLATION) => ApiError::conflict("Username is already taken."),
        _ => ApiError::from(e),
    })?;

    tracing::info!(user_id = id, "User credentials updated");
    Ok(ApiResponse::success(
        json!({ "message": "User updated successfully" }),
    ))
}

async fn find_by_username(state: &AppState, username: &str) -> Result<Option<User>, ApiError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password, role FROM users WHERE username = $1",
    )
    .bind(username)
    .fetch_optional(&state.pool)
    .await?;
    Ok(user)
}

fn parse_role(user: &User) -> Result<Role, ApiError> {
    user.role.parse::<Role>().map_err(|_| {
        tracing::error!(user_id = user.id, role = %user.role, "Stored user has an unknown role");
        ApiError::internal_server_error("An error occurred while processing your request")
    })
}
