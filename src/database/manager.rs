use sqlx::{migrate::MigrateError, postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    #[error(transparent)]
    Migration(#[from] MigrateError),
}

/// Owns pool construction, migrations and health probing for the one
/// application database
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool sized and timed by the database config
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool for {}:{} (max {} connections)",
            config.host, config.port, config.max_connections
        );
        Ok(pool)
    }

    /// `DATABASE_URL` wins when set. Otherwise the URL is assembled from the
    /// discrete host/port/user/password/schema settings.
    pub fn connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if let Some(raw) = &config.url {
            let url = url::Url::parse(raw).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
            return Ok(url.into());
        }

        let user = config
            .user
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_USER"))?;
        let name = config
            .name
            .as_deref()
            .ok_or(DatabaseError::ConfigMissing("DATABASE_SCHEMA"))?;

        let mut url =
            url::Url::parse("postgres://localhost").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_host(Some(&config.host))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_port(Some(config.port))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(user)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_password(config.password.as_deref())
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_path(&format!("/{}", name));

        Ok(url.into())
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
