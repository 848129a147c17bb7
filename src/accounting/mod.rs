mod client;

pub use client::AccountingClient;

use std::time::Duration;

use reqwest::Client;

/// Shared HTTP client for all outbound calls. Every request is bounded by
/// `timeout`.
pub fn http_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("Failed to build HTTP client with timeout, using default: {}", e);
            Client::new()
        })
}
