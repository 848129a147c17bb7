use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{CredentialStore, TokenClient};
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::Credential;

/// Hands out valid access tokens, refreshing the stored credential when it
/// has expired.
///
/// Refresh tokens are rotated by the provider, so "read expired, refresh,
/// write" is a critical section: two refreshes from the same refresh token
/// strand the integration. Inside one process the section is serialized by
/// `refresh_lock`. Across processes only the holder of the stored refresh
/// lease calls the token endpoint; everyone else polls the store until the
/// holder's credential lands or its lease runs out. The write itself is still
/// a compare-and-swap on the credential version, and a caller that loses it
/// re-reads and uses the winner's token instead of refreshing again.
#[derive(Clone)]
pub struct CredentialManager {
    store: CredentialStore,
    token_client: TokenClient,
    refresh_lock: Arc<Mutex<()>>,
    expiry_margin_secs: i64,
    refresh_lease: Duration,
}

const LEASE_POLL_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_REFRESH_LEASE: Duration = Duration::from_secs(30);

impl CredentialManager {
    pub fn new(store: CredentialStore, token_client: TokenClient, expiry_margin_secs: i64) -> Self {
        Self {
            store,
            token_client,
            refresh_lock: Arc::new(Mutex::new(())),
            expiry_margin_secs,
            refresh_lease: DEFAULT_REFRESH_LEASE,
        }
    }

    /// How long a refresh may hold the cross-process lease before another
    /// process is allowed to take over. Should exceed the token request timeout.
    pub fn with_refresh_lease(mut self, lease_secs: u64) -> Self {
        self.refresh_lease = Duration::from_secs(lease_secs);
        self
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    pub fn token_client(&self) -> &TokenClient {
        &self.token_client
    }

    fn is_fresh(&self, credential: &Credential) -> bool {
        credential.is_fresh(Utc::now().timestamp(), self.expiry_margin_secs)
    }

    pub async fn get_valid_token(&self) -> ReconcileResult<String> {
        let credential = self.store.read()?;
        if self.is_fresh(&credential) {
            return Ok(credential.access_token);
        }

        let _guard = self.refresh_lock.lock().await;

        // Whoever held the lock before us may already have refreshed.
        let credential = self.store.read()?;
        if self.is_fresh(&credential) {
            tracing::debug!(
                provider = self.store.provider(),
                version = credential.version,
                "Credential refreshed by a concurrent caller"
            );
            return Ok(credential.access_token);
        }

        self.refresh_under_lease(credential).await
    }

    /// Refresh `stale` once this process holds the lease, or pick up the
    /// credential written by the process that does.
    async fn refresh_under_lease(&self, mut stale: Credential) -> ReconcileResult<String> {
        let provider = self.store.provider();
        let lease_ms = self.refresh_lease.as_millis() as i64;
        let deadline = Instant::now() + self.refresh_lease * 2;

        loop {
            if self.store.try_acquire_refresh_lease(stale.version, lease_ms)? {
                return self.refresh(stale).await;
            }
            if Instant::now() >= deadline {
                tracing::error!(provider, "Timed out waiting for another process to refresh");
                return Err(ReconcileError::RefreshConflict(provider.to_string()));
            }

            tracing::debug!(
                provider,
                version = stale.version,
                "Refresh lease held elsewhere, waiting"
            );
            tokio::time::sleep(LEASE_POLL_INTERVAL).await;

            let current = self.store.read()?;
            if self.is_fresh(&current) {
                tracing::debug!(
                    provider,
                    version = current.version,
                    "Credential refreshed by another process"
                );
                return Ok(current.access_token);
            }
            stale = current;
        }
    }

    async fn refresh(&self, stale: Credential) -> ReconcileResult<String> {
        let provider = self.store.provider();
        tracing::info!(provider, version = stale.version, "Refreshing expired access token");

        let grant = match self.token_client.refresh(&stale.refresh_token).await {
            Ok(grant) => grant,
            Err(e) => {
                if let Err(release_err) = self.store.release_refresh_lease(stale.version) {
                    tracing::warn!(provider, "Failed to release refresh lease: {}", release_err);
                }
                // A handshake may have replaced the credential meanwhile.
                if let Some(token) = self.fresh_token_from_other_writer(stale.version)? {
                    tracing::warn!(provider, "Refresh rejected but a newer credential exists");
                    return Ok(token);
                }
                tracing::error!(provider, "Token refresh failed: {}", e);
                return Err(ReconcileError::RefreshFailed(e));
            }
        };

        let next = stale.rotated(grant, Utc::now().timestamp());
        if self.store.compare_and_swap(&next, stale.version)? {
            tracing::info!(
                provider,
                version = next.version,
                expires_at = next.expires_at,
                "Stored refreshed credential"
            );
            return Ok(next.access_token);
        }

        tracing::warn!(provider, "Credential changed during refresh, using stored one");
        self.fresh_token_from_other_writer(stale.version)?
            .ok_or_else(|| ReconcileError::RefreshConflict(provider.to_string()))
    }

    /// Token written by someone else since `seen_version`, if it is usable.
    fn fresh_token_from_other_writer(&self, seen_version: i64) -> ReconcileResult<Option<String>> {
        let current = self.store.read()?;
        if current.version != seen_version && self.is_fresh(&current) {
            Ok(Some(current.access_token))
        } else {
            Ok(None)
        }
    }
}
