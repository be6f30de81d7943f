//! Database schema migrations for SQLite.
//!
//! A simple versioned migration system. Each migration is a SQL batch that
//! transforms the schema from version N to N+1.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema.
///
/// This function is idempotent - it can be called multiple times safely.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, keyward_core::now_millis()],
            )?;
        }

        tx.commit()?;
    }

    Ok(())
}

/// Apply a specific migration version.
fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {}",
            version
        ))),
    }
}

/// Migration v1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- Registered clients. The (subject, controller, application) triple
        -- is the registration identity: one credential pair per triple.
        CREATE TABLE clients (
            id TEXT PRIMARY KEY,
            secret BLOB NOT NULL,
            subject TEXT NOT NULL,
            controller TEXT NOT NULL,
            application TEXT NOT NULL,

            UNIQUE(subject, controller, application)
        );

        -- Request tokens. Rows are deleted on exchange, so a present row is
        -- an unexchanged token.
        CREATE TABLE tokens (
            id TEXT PRIMARY KEY,
            secret BLOB NOT NULL,
            client_id TEXT NOT NULL,
            valid_from INTEGER NOT NULL,
            valid_to INTEGER NOT NULL,
            authorized INTEGER NOT NULL DEFAULT 0,
            used INTEGER NOT NULL DEFAULT 0
        );

        -- Accepted nonces, scoped per client. The composite primary key is
        -- the replay barrier.
        CREATE TABLE nonces (
            client_id TEXT NOT NULL,
            value TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            PRIMARY KEY (client_id, value)
        );

        -- Data-subject authorization rules, one row per exact triple.
        -- Allowance sets are JSON arrays.
        CREATE TABLE rules (
            subject TEXT NOT NULL,
            controller TEXT NOT NULL,
            data_type TEXT NOT NULL,
            actions TEXT NOT NULL,
            provenances TEXT NOT NULL,
            PRIMARY KEY (subject, controller, data_type)
        );

        -- Append-only authorization decision log. The event column is the
        -- full JSON record; subject and timestamp are extracted for queries.
        CREATE TABLE decisions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject TEXT NOT NULL,
            timestamp INTEGER NOT NULL,
            event TEXT NOT NULL
        );

        -- Indexes for common queries
        CREATE INDEX idx_tokens_client ON tokens(client_id);
        CREATE INDEX idx_nonces_timestamp ON nonces(timestamp);
        CREATE INDEX idx_decisions_subject ON decisions(subject, id);
        "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migration_creates_tables() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();

        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"clients".to_string()));
        assert!(tables.contains(&"tokens".to_string()));
        assert!(tables.contains(&"nonces".to_string()));
        assert!(tables.contains(&"rules".to_string()));
        assert!(tables.contains(&"decisions".to_string()));
        assert!(tables.contains(&"schema_migrations".to_string()));
    }

    #[test]
    fn test_migration_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();
        migrate(&mut conn).unwrap();

        let version: u32 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, CURRENT_VERSION);
    }
}
