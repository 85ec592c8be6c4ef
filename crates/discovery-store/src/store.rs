use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::Result;
use crate::schema;

/// Origin-scoped string key-value storage, the shape of a browser's
/// `localStorage`.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Write all items or none of them.
    fn set_items(&self, items: &[(&str, &str)]) -> Result<()>;

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_items(&[(key, value)])
    }
}

/// SQLite-backed storage. Survives restarts; each origin sees only its own
/// keys.
pub struct SqliteStorage {
    conn: Connection,
    origin: String,
}

impl SqliteStorage {
    pub fn open(path: &Path, origin: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        tracing::debug!("opened {} for origin {origin}", path.display());
        Ok(Self {
            conn,
            origin: origin.to_string(),
        })
    }

    pub fn open_in_memory(origin: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self {
            conn,
            origin: origin.to_string(),
        })
    }
}

impl Storage for SqliteStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM local_storage WHERE origin = ?1 AND key = ?2")?;
        let result = stmt
            .query_row(params![self.origin, key], |row| row.get(0))
            .optional()?;
        Ok(result)
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO local_storage (origin, key, value) VALUES (?1, ?2, ?3)",
            )?;
            for (key, value) in items {
                stmt.execute(params![self.origin, key, value])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

/// Volatile storage for tests and one-off sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_items(&self, items: &[(&str, &str)]) -> Result<()> {
        let mut map = self.items.borrow_mut();
        for (key, value) in items {
            map.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn Storage) {
        assert!(storage.get_item("foo").unwrap().is_none());

        storage.set_item("foo", "bar").unwrap();
        assert_eq!(storage.get_item("foo").unwrap(), Some("bar".to_string()));

        storage.set_item("foo", "baz").unwrap();
        assert_eq!(storage.get_item("foo").unwrap(), Some("baz".to_string()));

        storage.set_items(&[("a", "1"), ("foo", "qux")]).unwrap();
        assert_eq!(storage.get_item("a").unwrap(), Some("1".to_string()));
        assert_eq!(storage.get_item("foo").unwrap(), Some("qux".to_string()));
        assert!(storage.get_item("b").unwrap().is_none());
    }

    #[test]
    fn test_sqlite_storage_contract() {
        let storage = SqliteStorage::open_in_memory("https://example.test").unwrap();
        exercise(&storage);
    }

    #[test]
    fn test_memory_storage_contract() {
        exercise(&MemoryStorage::new());
    }

    #[test]
    fn test_origins_are_isolated() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.db");

        let a = SqliteStorage::open(&path, "https://a.test").unwrap();
        a.set_item("shared", "from-a").unwrap();

        let b = SqliteStorage::open(&path, "https://b.test").unwrap();
        assert!(b.get_item("shared").unwrap().is_none());

        b.set_item("shared", "from-b").unwrap();
        assert_eq!(a.get_item("shared").unwrap(), Some("from-a".to_string()));
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.db");

        {
            let storage = SqliteStorage::open(&path, "o").unwrap();
            storage.set_item("k", "v").unwrap();
        }

        let storage = SqliteStorage::open(&path, "o").unwrap();
        assert_eq!(storage.get_item("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn test_open_refuses_newer_schema() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("storage.db");
        {
            let conn = Connection::open(&path).unwrap();
            schema::initialize(&conn).unwrap();
            conn.execute(
                "UPDATE metadata SET value = '99' WHERE key = 'schema_version'",
                [],
            )
            .unwrap();
        }

        let err = SqliteStorage::open(&path, "o").err().unwrap();
        assert!(err.to_string().contains("v99"), "unexpected error: {err}");
    }
}
