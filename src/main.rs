use clap::Parser;
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::fmt::Display;
use std::time::Duration;

use ledgerbridge::config::Config;
use ledgerbridge::db::{create_pool, init_db, queries, AppState};
use ledgerbridge::error::ReconcileError;
use ledgerbridge::handlers;

#[derive(Parser, Debug)]
#[command(name = "ledgerbridge")]
#[command(about = "Reconciles Hotmart purchase webhooks into Conta Azul sales")]
struct Cli {
    /// Print the stored OAuth credential's version and expiry, then exit
    #[arg(long)]
    credential_status: bool,
}

fn exit_with(context: &str, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    std::process::exit(1);
}

/// Report whether the authorization handshake has been completed and when
/// the current access token expires. Never prints token material.
fn print_credential_status(state: &AppState) {
    let provider = state.pipeline.credentials().store().provider();
    match state.pipeline.credentials().store().read() {
        Ok(credential) => {
            let expires_at = DateTime::<Utc>::from_timestamp(credential.expires_at, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| credential.expires_at.to_string());
            let now = Utc::now().timestamp();
            let margin = state.config.oauth.expiry_margin_secs;

            println!("Provider:   {}", provider);
            println!("Version:    {}", credential.version);
            println!("Expires at: {}", expires_at);
            println!(
                "Status:     {}",
                if credential.is_fresh(now, margin) {
                    "valid"
                } else {
                    "expired (will refresh on next use)"
                }
            );
        }
        Err(ReconcileError::CredentialUnavailable(_)) => {
            println!("Provider:   {}", provider);
            println!("Status:     not authorized (visit /oauth/authorize)");
        }
        Err(e) => exit_with("Failed to read credential", e),
    }
}

/// Spawns a background task that periodically removes OAuth states older
/// than the configured TTL. Runs every 5 minutes.
fn spawn_cleanup_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(5 * 60);
        let ttl = state.config.oauth.state_ttl_secs;

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::purge_expired_oauth_states(&conn, ttl) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Purged {} expired OAuth states", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to purge OAuth states: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for cleanup: {}", e);
                }
            }
        }
    });

    tracing::info!("Background cleanup task started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerbridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| exit_with("Invalid configuration", e));

    if config.webhook_hottok.is_none() {
        tracing::warn!("HOTMART_HOTTOK is not set; webhook requests are not authenticated");
    }

    let db_pool = create_pool(&config.database_path)
        .unwrap_or_else(|e| exit_with("Failed to create database pool", e));
    {
        let conn = db_pool
            .get()
            .unwrap_or_else(|e| exit_with("Failed to get connection", e));
        init_db(&conn).unwrap_or_else(|e| exit_with("Failed to initialize database", e));
    }

    let state = ledgerbridge::build_state(config, db_pool);

    if cli.credential_status {
        print_credential_status(&state);
        return;
    }

    spawn_cleanup_task(state.clone());

    let addr = state.config.addr();
    let app = handlers::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| exit_with("Failed to bind to address", e));

    tracing::info!("Ledgerbridge listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        exit_with("Server error", e);
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
