use crate::db::{DbPool, queries};
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{Credential, TokenGrant};

/// Persisted single-slot credential for one provider.
#[derive(Clone)]
pub struct CredentialStore {
    db: DbPool,
    provider: String,
}

impl CredentialStore {
    pub fn new(db: DbPool, provider: impl Into<String>) -> Self {
        Self {
            db,
            provider: provider.into(),
        }
    }

    pub fn provider(&self) -> &str {
        &self.provider
    }

    /// Current credential, or `CredentialUnavailable` if the authorization
    /// handshake has never completed.
    pub fn read(&self) -> ReconcileResult<Credential> {
        let conn = self.db.get()?;
        queries::get_credential(&conn, &self.provider)?
            .ok_or_else(|| ReconcileError::CredentialUnavailable(self.provider.clone()))
    }

    /// Unconditional replace, used only by the authorization handshake.
    pub fn write(&self, grant: &TokenGrant) -> ReconcileResult<Credential> {
        let conn = self.db.get()?;
        Ok(queries::upsert_credential(&conn, &self.provider, grant)?)
    }

    /// Replace the credential only if it is still at `expected_version`.
    pub fn compare_and_swap(&self, next: &Credential, expected_version: i64) -> ReconcileResult<bool> {
        let conn = self.db.get()?;
        Ok(queries::replace_credential_if_version(&conn, next, expected_version)?)
    }

    /// Cross-process claim on refreshing credential `version`.
    pub fn try_acquire_refresh_lease(&self, version: i64, lease_ms: i64) -> ReconcileResult<bool> {
        let conn = self.db.get()?;
        Ok(queries::try_acquire_refresh_lease(&conn, &self.provider, version, lease_ms)?)
    }

    pub fn release_refresh_lease(&self, version: i64) -> ReconcileResult<()> {
        let conn = self.db.get()?;
        queries::release_refresh_lease(&conn, &self.provider, version)?;
        Ok(())
    }
}
