use anyhow::Context;
use tracing::info;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::routes;
use crate::state::AppState;

pub async fn handle(config: AppConfig) -> anyhow::Result<()> {
    let tokens = TokenService::from_config(&config.security)
        .context("failed to load RS256 key pair")?;

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;

    if config.database.run_migrations {
        DatabaseManager::migrate(&pool).await?;
    }

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    let state = AppState::new(pool.clone(), tokens, config);
    let app = routes::app(state);

    info!("Phase Matrix API listening on http://{}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
