//! LoanDesk Backend Server
//!
//! Serves the loan catalog, dynamic application forms, OTP verification,
//! application intake and the admin review workflow.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use loandesk_server::blob::{LocalBlobStore, URL_PREFIX};
use loandesk_server::config::{Config, StoreBackend};
use loandesk_server::notify::{HttpEmailNotifier, LogNotifier, Notifier};
use loandesk_server::store::Repositories;
use loandesk_server::{api_router, db, middleware, AppState};

const OTP_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting LoanDesk server");

    let repos = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
            Repositories::postgres(pool)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on restart");
            Repositories::memory()
        }
    };

    let blobs = Arc::new(LocalBlobStore::new(config.upload_dir.clone()).await?);

    let notifier: Arc<dyn Notifier> = match &config.email.api_url {
        Some(url) => Arc::new(HttpEmailNotifier::new(
            url.clone(),
            config.email.api_key.clone(),
            config.email.from.clone(),
        )),
        None => {
            tracing::warn!("EMAIL_API_URL not set, emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let state = AppState::new(&config, repos, blobs, notifier);

    // Expired OTP challenges are purged hourly
    let purge_auth = state.auth_service.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OTP_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_auth.otp().purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "Purged expired OTP challenges"),
                Err(e) => tracing::error!(error = %e, "OTP purge failed"),
            }
        }
    });

    let limiter = state.otp_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup(Duration::from_secs(600)).await;
        }
    });

    let mut app = api_router(state)
        .nest_service(URL_PREFIX.trim_end_matches('/'), ServeDir::new(&config.upload_dir))
        .layer(configure_cors(config.cors_allowed_origins.as_deref()));
    if config.environment.is_production() {
        app = app.layer(axum::middleware::from_fn(middleware::hsts_header));
    }

    let addr = SocketAddr::from((config.host, config.port));
    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let allowed_origins = allowed_origins.unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
