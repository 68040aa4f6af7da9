use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use common::database::{Database, DatabaseConfig, health_check};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use users::{
    repositories::PgUserRepository, routes::create_router, settings::Settings, state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment files are optional
    dotenvy::from_filename("config.env").ok();
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting users service");

    let settings = Settings::from_env().context("Failed to load service settings")?;
    let db_config = DatabaseConfig::from_env().context("Failed to load database settings")?;

    // Any storage failure during startup is fatal
    let database = Database::new(db_config);
    let pool = database
        .connect()
        .await
        .context("Database connection failed")?;
    database
        .ensure_schema()
        .await
        .context("Failed to create users table")?;

    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let user_repository = Arc::new(PgUserRepository::new(pool));
    let bind_address = settings.bind_address();
    let environment = settings.environment.clone();

    let app_state = AppState::new(user_repository, settings);
    let purge_task = app_state.rate_limiter.spawn_purge_task();

    // Start the web server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;
    info!("Users service listening on http://{}", bind_address);
    info!("Environment: {}", environment);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    purge_task.abort();
    database.close().await;
    info!("Server shutdown complete");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("SIGINT received. Shutting down gracefully...");
        }
        _ = terminate => {
            warn!("SIGTERM received. Shutting down gracefully...");
        }
    }
}
