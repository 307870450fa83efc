//! SQLite-backed settings store
//!
//! Uses embedded migrations managed via PRAGMA user_version.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::SettingsStore;
use crate::error::Result;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: key/value settings
    r#"
    CREATE TABLE IF NOT EXISTS settings (
        namespace        TEXT NOT NULL,
        key              TEXT NOT NULL,
        value            BLOB NOT NULL,
        updated_at       DATETIME NOT NULL,

        PRIMARY KEY (namespace, key)
    );
    "#,
];

/// Run all pending migrations
fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running settings migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    Ok(())
}

/// Settings handle bound to one namespace of a SQLite database
pub struct SqliteSettings {
    conn: Mutex<Connection>,
    namespace: String,
}

impl SqliteSettings {
    /// Open or create the settings database at the given path
    pub fn open(path: &Path, namespace: &str) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Every set is a durable write-through
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            ",
        )?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            namespace: namespace.to_string(),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(namespace: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn connection(&self) -> MutexGuard<'_, Connection> {
        // The connection holds no state of ours between statements
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SettingsStore for SqliteSettings {
    fn contains(&self, key: &str) -> Result<bool> {
        let conn = self.connection();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM settings WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.connection();
        let value = conn
            .query_row(
                "SELECT value FROM settings WHERE namespace = ?1 AND key = ?2",
                params![self.namespace, key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            r#"
            INSERT INTO settings (namespace, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(namespace, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![self.namespace, key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self.connection();
        conn.execute(
            "DELETE FROM settings WHERE namespace = ?1 AND key = ?2",
            params![self.namespace, key],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version: i32 = conn
            .query_row("PRAGMA user_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_set_overwrites() {
        let settings = SqliteSettings::open_in_memory("trackobot").unwrap();
        settings.set("username", b"first").unwrap();
        settings.set("username", b"second").unwrap();

        assert_eq!(
            settings.get_string("username").unwrap().as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.db");

        let a = SqliteSettings::open(&path, "a").unwrap();
        let b = SqliteSettings::open(&path, "b").unwrap();

        a.set_string("username", "alice").unwrap();
        assert!(a.contains("username").unwrap());
        assert!(!b.contains("username").unwrap());
        assert_eq!(b.namespace(), "b");
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.db");

        {
            let settings = SqliteSettings::open(&path, "trackobot").unwrap();
            settings.set("resultsQueue", b"[]").unwrap();
            settings.set_string("password", "secret").unwrap();
            settings.remove("password").unwrap();
        }

        let settings = SqliteSettings::open(&path, "trackobot").unwrap();
        assert_eq!(
            settings.get("resultsQueue").unwrap().as_deref(),
            Some(&b"[]"[..])
        );
        assert!(!settings.contains("password").unwrap());
    }
}
