//! Database schema migrations for SQLite.
//!
//! We use a simple versioned migration system. Each migration is a SQL string
//! that transforms the schema from version N to N+1.

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

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema version {} is newer than supported version {}",
            current, CURRENT_VERSION
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_seconds()],
            )?;
            tracing::debug!(version, "applied schema migration");
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
        -- Singleton registry configuration.
        -- u64 values are 8-byte big-endian BLOBs throughout.
        CREATE TABLE registry_config (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            petition_counter BLOB NOT NULL CHECK (length(petition_counter) = 8),
            max_petitions BLOB NOT NULL CHECK (length(max_petitions) = 8),
            creation_fee BLOB NOT NULL CHECK (length(creation_fee) = 8),
            authority TEXT                     -- nullable until set, then immutable
        );

        -- Petitions, keyed by their dense id
        CREATE TABLE petitions (
            petition_id BLOB NOT NULL PRIMARY KEY CHECK (length(petition_id) = 8),
            creator TEXT NOT NULL,
            title TEXT NOT NULL UNIQUE,
            description TEXT NOT NULL,
            target_signatures BLOB NOT NULL,
            current_signatures BLOB NOT NULL,
            deadline BLOB NOT NULL,
            is_active INTEGER NOT NULL,        -- 0/1, mirrors status
            category TEXT NOT NULL,            -- policy | environment | social
            priority INTEGER NOT NULL,
            location TEXT NOT NULL,
            tags BLOB NOT NULL,                -- CBOR array of strings
            timestamp BLOB NOT NULL,
            status TEXT NOT NULL,              -- open | closed
            min_signatures BLOB NOT NULL,
            max_extension INTEGER NOT NULL
        );

        -- Most recent edit per petition (overwritten, not appended)
        CREATE TABLE petition_updates (
            petition_id BLOB NOT NULL PRIMARY KEY REFERENCES petitions(petition_id),
            update_title TEXT NOT NULL,
            update_description TEXT NOT NULL,
            update_target BLOB NOT NULL,
            update_timestamp BLOB NOT NULL,
            updater TEXT NOT NULL
        );

        CREATE INDEX idx_petitions_creator ON petitions(creator);
        CREATE INDEX idx_petitions_status ON petitions(status);
        "#,
    )?;

    Ok(())
}

/// Current wall-clock time in seconds, for the migration log only.
fn now_seconds() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
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

        assert!(tables.contains(&"registry_config".to_string()));
        assert!(tables.contains(&"petitions".to_string()));
        assert!(tables.contains(&"petition_updates".to_string()));
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
        assert_eq!(version, 1);
    }

    #[test]
    fn test_newer_schema_rejected() {
        let mut conn = Connection::open_in_memory().unwrap();
        migrate(&mut conn).unwrap();
        conn.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (99, 0)",
            [],
        )
        .unwrap();

        assert!(matches!(migrate(&mut conn), Err(StoreError::Migration(_))));
    }
}
