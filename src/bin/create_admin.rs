//! Create or promote an admin account
//!
//! Usage: `create-admin <email> [name]`

use anyhow::{bail, Context};
use std::sync::Arc;

use loandesk_server::auth::AuthService;
use loandesk_server::config::{Config, StoreBackend};
use loandesk_server::db;
use loandesk_server::notify::LogNotifier;
use loandesk_server::otp::OtpService;
use loandesk_server::store::Repositories;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let Some(email) = args.next() else {
        bail!("usage: create-admin <email> [name]");
    };
    let name = args.next();

    let config = Config::from_env().context("Failed to load configuration")?;
    if config.store_backend != StoreBackend::Postgres {
        bail!("create-admin needs STORE_BACKEND=postgres");
    }

    let pool = db::create_pool(&config).await?;
    db::run_migrations(&pool).await?;
    let repos = Repositories::postgres(pool);

    let otp = OtpService::new(repos.otps.clone(), Arc::new(LogNotifier), config.otp_ttl_seconds);
    let auth = AuthService::new(
        repos.users,
        otp,
        config.jwt_secret.clone(),
        config.jwt_access_token_ttl_seconds,
        false,
    );

    let user = auth
        .ensure_admin(&email, name)
        .await
        .context("Failed to create admin")?;
    println!("Admin ready: {} ({})", user.email, user.id);
    Ok(())
}
