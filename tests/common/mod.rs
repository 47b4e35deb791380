#![allow(dead_code)]

use anyhow::Result;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tower::ServiceExt;

use phase_matrix_api::auth::TokenService;
use phase_matrix_api::config::AppConfig;
use phase_matrix_api::database::DatabaseManager;
use phase_matrix_api::routes;
use phase_matrix_api::state::AppState;

const PRIVATE_KEY: &str = include_str!("../../src/testing/keys/primary.private.pem");
const PUBLIC_KEY: &str = include_str!("../../src/testing/keys/primary.public.pem");

/// Migrated pool for `TEST_DATABASE_URL`, or `None` when no database is
/// configured so callers can return early
pub async fn test_pool() -> Result<Option<PgPool>> {
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set; skipping database test");
        return Ok(None);
    };

    let pool = PgPoolOptions::new().max_connections(5).connect(&url).await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Some(pool))
}

pub fn token_service() -> Result<TokenService> {
    Ok(TokenService::from_pem(
        PRIVATE_KEY.as_bytes(),
        PUBLIC_KEY.as_bytes(),
    )?)
}

pub fn app(pool: PgPool) -> Result<Router> {
    let state = AppState::new(pool, token_service()?, AppConfig::from_env());
    Ok(routes::app(state))
}

/// Fresh phase with the next free phase number
pub async fn create_phase(pool: &PgPool, title: &str) -> Result<i64> {
    let mut tx = pool.begin().await?;
    sqlx::query("LOCK TABLE phases IN SHARE ROW EXCLUSIVE MODE")
        .execute(&mut *tx)
        .await?;
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO phases (phase_no, title)
        VALUES ((SELECT COALESCE(MAX(phase_no), 0) + 1 FROM phases), $1)
        RETURNING id
        "#,
    )
    .bind(title)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;
    Ok(id)
}

pub async fn create_user(pool: &PgPool, username: &str, password_hash: &str, role: &str) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (username, password, role) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(username)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Ok((status, value))
}
