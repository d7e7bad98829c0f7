use std::path::Path;
use std::sync::Arc;

use redb::{Database, TableDefinition};
use tracing::debug;

use crate::error::KVError;
use crate::traits::KVStore;

const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

fn storage<E: std::fmt::Display>(e: E) -> KVError {
    KVError::Storage(e.to_string())
}

/// KVStore backed by redb, a pure-Rust embedded database. Every write is
/// its own transaction.
pub struct RedbStore {
    db: Arc<Database>,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, KVError> {
        let db = Database::create(path).map_err(storage)?;

        // Create the table up front so readers never see it missing.
        let txn = db.begin_write().map_err(storage)?;
        {
            let _table = txn.open_table(DOCUMENTS).map_err(storage)?;
        }
        txn.commit().map_err(storage)?;

        debug!("RedbStore: opened {:?}", path);
        Ok(Self { db: Arc::new(db) })
    }
}

impl KVStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, KVError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(DOCUMENTS).map_err(storage)?;
        let value = table.get(key).map_err(storage)?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), KVError> {
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(DOCUMENTS).map_err(storage)?;
            table.insert(key, value).map_err(storage)?;
        }
        txn.commit().map_err(storage)
    }

    fn delete(&self, key: &str) -> Result<(), KVError> {
        let txn = self.db.begin_write().map_err(storage)?;
        {
            let mut table = txn.open_table(DOCUMENTS).map_err(storage)?;
            table.remove(key).map_err(storage)?;
        }
        txn.commit().map_err(storage)
    }

    fn scan(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, KVError> {
        let txn = self.db.begin_read().map_err(storage)?;
        let table = txn.open_table(DOCUMENTS).map_err(storage)?;

        let mut results = Vec::new();
        for entry in table.range(prefix..).map_err(storage)? {
            let (key, value) = entry.map_err(storage)?;
            let key = key.value().to_string();
            if !key.starts_with(prefix) {
                break;
            }
            results.push((key, value.value().to_vec()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (RedbStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(&dir.path().join("test.redb")).unwrap();
        (store, dir)
    }

    #[test]
    fn set_get_delete() {
        let (store, _dir) = open_store();
        store.set("catalog:genre:1", b"fantasy").unwrap();
        assert_eq!(store.get("catalog:genre:1").unwrap(), Some(b"fantasy".to_vec()));

        store.delete("catalog:genre:1").unwrap();
        assert_eq!(store.get("catalog:genre:1").unwrap(), None);
    }

    #[test]
    fn delete_missing_key_is_ok() {
        let (store, _dir) = open_store();
        store.delete("catalog:genre:nope").unwrap();
    }

    #[test]
    fn scan_stops_at_prefix_boundary() {
        let (store, _dir) = open_store();
        store.set("catalog:book:a", b"1").unwrap();
        store.set("catalog:book:b", b"2").unwrap();
        store.set("catalog:bookinstance:a", b"3").unwrap();
        store.set("catalog:author:a", b"4").unwrap();

        let books = store.scan("catalog:book:").unwrap();
        let keys: Vec<&str> = books.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["catalog:book:a", "catalog:book:b"]);
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persist.redb");
        {
            let store = RedbStore::open(&path).unwrap();
            store.set("catalog:author:x", b"Austen").unwrap();
        }
        let store = RedbStore::open(&path).unwrap();
        assert_eq!(store.get("catalog:author:x").unwrap(), Some(b"Austen".to_vec()));
    }
}
