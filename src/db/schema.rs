use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Single-slot OAuth credential per provider.
        -- version is bumped on every write; refreshes update WHERE version = <read version>.
        -- refresh_lease_until (unix millis) marks a refresh in flight in some process.
        CREATE TABLE IF NOT EXISTS credentials (
            provider TEXT PRIMARY KEY,
            access_token TEXT NOT NULL,
            refresh_token TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            version INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            refresh_lease_until INTEGER NOT NULL DEFAULT 0
        );

        -- Issued authorization states; only the newest one is accepted.
        CREATE TABLE IF NOT EXISTS oauth_states (
            state TEXT PRIMARY KEY,
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_oauth_states_created ON oauth_states(created_at);
        "#,
    )
}
