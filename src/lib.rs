//! Ledgerbridge - turns Hotmart purchase webhooks into Conta Azul sales
//!
//! Each completed purchase resolves (or creates) the customer and service in
//! the accounting system and records a sale, using an OAuth2 credential that
//! is refreshed safely across concurrent invocations.

pub mod accounting;
pub mod config;
pub mod db;
pub mod documents;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod reconcile;

use std::sync::Arc;

use config::Config;
use db::{AppState, DbPool};
use oauth::{CredentialManager, CredentialStore, TokenClient};
use reconcile::{EntityResolver, ReconciliationPipeline, SaleBuilder};

/// Wire every component from one immutable configuration.
pub fn build_state(config: Config, db: DbPool) -> AppState {
    let http = accounting::http_client(config.accounting.request_timeout);

    let credentials = CredentialManager::new(
        CredentialStore::new(db.clone(), config.oauth.provider.clone()),
        TokenClient::new(&config.oauth, http.clone()),
        config.oauth.expiry_margin_secs,
    )
    .with_refresh_lease(config.oauth.refresh_lease_secs);
    let accounting = accounting::AccountingClient::new(&config.accounting.api_base_url, http);
    let pipeline = ReconciliationPipeline::new(
        credentials,
        EntityResolver::new(accounting.clone(), config.accounting.clone()),
        SaleBuilder::new(&config.accounting),
        accounting,
    );

    AppState {
        db,
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
    }
}
