use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to create directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage is read-only")]
    ReadOnly,
}

/// Durable string-keyed substrate that survives restarts.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// Key-value table in a SQLite database file
#[derive(Debug)]
pub struct SqliteKeyValueStore {
    conn: Connection,
}

impl SqliteKeyValueStore {
    /// Open (or create) the database at `path`, creating parent directories.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO kv (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// In-process substrate. Writes can be switched off to simulate a full disk.
#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
    reject_writes: bool,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::ReadOnly);
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.reject_writes {
            return Err(StorageError::ReadOnly);
        }
        self.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sqlite_set_get_remove() {
        let mut kv = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(kv.get("workouts").unwrap(), None);

        kv.set("workouts", "[]").unwrap();
        assert_eq!(kv.get("workouts").unwrap().as_deref(), Some("[]"));

        kv.set("workouts", "[1]").unwrap();
        assert_eq!(kv.get("workouts").unwrap().as_deref(), Some("[1]"));

        kv.remove("workouts").unwrap();
        assert_eq!(kv.get("workouts").unwrap(), None);
    }

    #[test]
    fn sqlite_remove_missing_key_is_ok() {
        let mut kv = SqliteKeyValueStore::open_in_memory().unwrap();
        kv.remove("nothing").unwrap();
    }

    #[test]
    fn sqlite_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("workouts.db");
        {
            let mut kv = SqliteKeyValueStore::open(&path).unwrap();
            kv.set("workouts", "payload").unwrap();
        }
        let kv = SqliteKeyValueStore::open(&path).unwrap();
        assert_eq!(kv.get("workouts").unwrap().as_deref(), Some("payload"));
    }

    #[test]
    fn memory_store_rejects_writes_when_asked() {
        let mut kv = MemoryKeyValueStore::new();
        kv.set("k", "v").unwrap();
        kv.set_reject_writes(true);
        assert!(matches!(kv.set("k", "w"), Err(StorageError::ReadOnly)));
        assert_eq!(kv.get("k").unwrap().as_deref(), Some("v"));
        assert!(kv.contains("k"));
    }
}
