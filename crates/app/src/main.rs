mod config;
mod seed;

use anyhow::Context;
use blivalley_core::Clock;
use clap::Parser;
use services::{AppServices, TokenIssuer};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{Args, Command, normalize_sqlite_url, prepare_sqlite_file, token_ttl};

fn token_issuer(args: &Args, clock: Clock) -> anyhow::Result<TokenIssuer> {
    let ttl = token_ttl(args.token_ttl_hours)?;
    Ok(match args.jwt_secret.as_deref().filter(|s| !s.is_empty()) {
        Some(secret) => TokenIssuer::new(secret.as_bytes(), ttl, clock),
        None => {
            warn!("BLIVALLEY_JWT_SECRET not set; tokens will not survive a restart");
            TokenIssuer::ephemeral(ttl, clock)
        }
    })
}

async fn serve(args: &Args, services: AppServices) -> anyhow::Result<()> {
    let listener = TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, api::router(services))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,api=info,services=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let clock = Clock::system();
    let tokens = token_issuer(&args, clock.clone())?;

    let db_url = normalize_sqlite_url(&args.db_url);
    prepare_sqlite_file(&db_url)?;

    let services = AppServices::new_sqlite(&db_url, clock, tokens)
        .await
        .with_context(|| format!("opening {db_url}"))?;
    info!(%db_url, "database ready");

    match args.command() {
        Command::Serve => serve(&args, services).await,
        Command::Seed { email, password } => seed::run(&services, &email, &password).await,
    }
}
