//! Row mapping trait and helpers for the handful of tables we keep.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::{Credential, OAuthState};

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> rusqlite::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row).optional()
}

// ============ SQL SELECT Constants ============

pub const CREDENTIAL_COLS: &str =
    "provider, access_token, refresh_token, expires_at, version, updated_at";

pub const OAUTH_STATE_COLS: &str = "state, created_at";

// ============ FromRow Implementations ============

impl FromRow for Credential {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Credential {
            provider: row.get(0)?,
            access_token: row.get(1)?,
            refresh_token: row.get(2)?,
            expires_at: row.get(3)?,
            version: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl FromRow for OAuthState {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(OAuthState {
            state: row.get(0)?,
            created_at: row.get(1)?,
        })
    }
}
