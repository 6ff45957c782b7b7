//! Study Assistant Backend Server
//!
//! Serves registration, login, token refresh and logout for the web app and
//! the browser extension.

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;

use study_assistant_server::auth::AuthService;
use study_assistant_server::config::Config;
use study_assistant_server::store::{CredentialStore, MemoryCredentialStore, PgCredentialStore};
use study_assistant_server::{db, jobs, middleware, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(
        environment = config.environment.as_str(),
        database = %config.database_url_masked(),
        "Starting study assistant server"
    );

    let store: Arc<dyn CredentialStore> = match &config.database_url {
        Some(database_url) => {
            tracing::info!("Connecting to database...");
            let pool = db::create_pool(database_url, config.db_max_connections)
                .await
                .context("database connection failed")?;
            db::run_migrations(&pool)
                .await
                .context("database migrations failed")?;
            Arc::new(PgCredentialStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory credential store");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let auth_service = Arc::new(AuthService::new(store, &config.jwt_secret));
    let app_state = AppState::new(auth_service.clone());

    // Start expired refresh token sweep
    let mut scheduler = jobs::start_refresh_sweep(auth_service, &config.refresh_sweep_schedule)
        .await
        .context("failed to start refresh token sweep")?;

    let mut app = routes::app_router(app_state, routes::cors_layer(&config.cors_allowed_origins));
    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = ?e, "Scheduler did not shut down cleanly");
    }

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
