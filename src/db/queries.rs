use chrono::Utc;
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::models::{Credential, OAuthState, TokenGrant};

use super::from_row::{CREDENTIAL_COLS, FromRow, OAUTH_STATE_COLS, query_one};

fn now() -> i64 {
    Utc::now().timestamp()
}

// ============ Credentials ============

pub fn get_credential(conn: &Connection, provider: &str) -> rusqlite::Result<Option<Credential>> {
    query_one(
        conn,
        &format!("SELECT {} FROM credentials WHERE provider = ?1", CREDENTIAL_COLS),
        &[&provider],
    )
}

/// Store the credential produced by an authorization-code exchange.
///
/// Overwrites any existing credential for the provider in place and bumps its
/// version, so concurrent refreshers holding the old version lose their CAS.
pub fn upsert_credential(
    conn: &Connection,
    provider: &str,
    grant: &TokenGrant,
) -> rusqlite::Result<Credential> {
    let now = now();
    let refresh_token = grant.refresh_token.clone().unwrap_or_default();
    conn.query_row(
        &format!(
            "INSERT INTO credentials (provider, access_token, refresh_token, expires_at, version, updated_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)
             ON CONFLICT(provider) DO UPDATE SET
                access_token = excluded.access_token,
                refresh_token = excluded.refresh_token,
                expires_at = excluded.expires_at,
                version = credentials.version + 1,
                updated_at = excluded.updated_at,
                refresh_lease_until = 0
             RETURNING {}",
            CREDENTIAL_COLS
        ),
        params![
            provider,
            &grant.access_token,
            &refresh_token,
            now + grant.expires_in,
            now
        ],
        Credential::from_row,
    )
}

/// Compare-and-swap write of a refreshed credential.
///
/// `next.version` must be `expected_version + 1`. Returns false (and writes
/// nothing) when the stored version is no longer `expected_version`.
pub fn replace_credential_if_version(
    conn: &Connection,
    next: &Credential,
    expected_version: i64,
) -> rusqlite::Result<bool> {
    let affected = conn.execute(
        "UPDATE credentials
         SET access_token = ?1, refresh_token = ?2, expires_at = ?3, version = ?4, updated_at = ?5,
             refresh_lease_until = 0
         WHERE provider = ?6 AND version = ?7",
        params![
            &next.access_token,
            &next.refresh_token,
            next.expires_at,
            next.version,
            next.updated_at,
            &next.provider,
            expected_version
        ],
    )?;
    Ok(affected > 0)
}

/// Claim the right to spend the refresh token of credential `version` for
/// `lease_ms` milliseconds.
///
/// Fails when the version has moved on or another holder's lease has not yet
/// expired. The lease is cleared by the next write of the credential.
pub fn try_acquire_refresh_lease(
    conn: &Connection,
    provider: &str,
    version: i64,
    lease_ms: i64,
) -> rusqlite::Result<bool> {
    let now_ms = Utc::now().timestamp_millis();
    let affected = conn.execute(
        "UPDATE credentials SET refresh_lease_until = ?1
         WHERE provider = ?2 AND version = ?3 AND refresh_lease_until <= ?4",
        params![now_ms + lease_ms, provider, version, now_ms],
    )?;
    Ok(affected > 0)
}

/// Give up a lease after a refresh that stored nothing.
pub fn release_refresh_lease(
    conn: &Connection,
    provider: &str,
    version: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE credentials SET refresh_lease_until = 0 WHERE provider = ?1 AND version = ?2",
        params![provider, version],
    )
}

// ============ OAuth states ============

pub fn create_oauth_state(conn: &Connection) -> rusqlite::Result<OAuthState> {
    let state = OAuthState {
        state: Uuid::new_v4().to_string(),
        created_at: now(),
    };
    conn.execute(
        "INSERT INTO oauth_states (state, created_at) VALUES (?1, ?2)",
        params![&state.state, state.created_at],
    )?;
    Ok(state)
}

/// The most recently issued state. Ties within the same second go to the
/// later insert.
pub fn get_latest_oauth_state(conn: &Connection) -> rusqlite::Result<Option<OAuthState>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM oauth_states ORDER BY created_at DESC, rowid DESC LIMIT 1",
            OAUTH_STATE_COLS
        ),
        &[],
    )
}

/// Drop every issued state once one of them has been redeemed.
pub fn clear_oauth_states(conn: &Connection) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM oauth_states", [])
}

pub fn purge_expired_oauth_states(conn: &Connection, ttl_secs: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM oauth_states WHERE created_at < ?1",
        params![now() - ttl_secs],
    )
}
