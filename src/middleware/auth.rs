use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

const TOKEN_REQUIRED: &str = "A token is required for authentication";
const INVALID_TOKEN: &str = "Invalid Token";
const ADMINS_ONLY: &str = "Forbidden: Admins only.";
const NOT_OWNER: &str = "You are not allowed to update this resource";

/// Validates the bearer token and injects the caller's `AuthUser` into the
/// request extensions.
///
/// A missing token answers 403, anything wrong with a present token answers a
/// uniform 401.
pub async fn require_authenticated(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = {
        let token = extract_bearer_token(request.headers())
            .ok_or_else(|| ApiError::forbidden(TOKEN_REQUIRED))?;
        state
            .tokens
            .verify(token)
            .map_err(|_| ApiError::unauthorized(INVALID_TOKEN))?
    };

    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

/// Must be layered inside `require_authenticated`
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<AuthUser>() {
        Some(user) if user.is_admin() => Ok(next.run(request).await),
        Some(user) => {
            tracing::warn!(user_id = user.user_id, "Non-admin rejected from admin route");
            Err(ApiError::forbidden(ADMINS_ONLY))
        }
        None => Err(ApiError::forbidden(TOKEN_REQUIRED)),
    }
}

/// Self-service routes may only touch resources owned by the caller
pub fn ensure_owner(user: &AuthUser, owner_id: i64) -> Result<(), ApiError> {
    if user.user_id != owner_id {
        tracing::warn!(
            user_id = user.user_id,
            owner_id,
            "Ownership check failed"
        );
        return Err(ApiError::unauthorized(NOT_OWNER));
    }
    Ok(())
}

/// Token from an `Authorization: Bearer <token>` header, if one is present
fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(axum::http::header::AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');
    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}
