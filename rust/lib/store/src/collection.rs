use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use locallib_core::{new_id, ServiceError};
use locallib_kv::{KVError, KVStore};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Implemented by every stored record type.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// KV key prefix: "{module}:{collection}:".
    fn kv_prefix() -> &'static str;

    /// The record's id, or an empty string if it has not been saved yet.
    fn key_value(&self) -> String;

    /// Overwrite the record's id.
    fn assign_key(&mut self, id: &str);

    /// Schema check run before every write. Required fields, length limits
    /// and enum values belong here.
    fn check(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Called before inserting a new record. Assigns a fresh id by default.
    fn before_create(&mut self) {
        if self.key_value().is_empty() {
            self.assign_key(&new_id());
        }
    }
}

/// CRUD operations for one document type. Cheap to clone.
pub struct Collection<T: Document> {
    kv: Arc<dyn KVStore>,
    _phantom: PhantomData<T>,
}

impl<T: Document> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            kv: Arc::clone(&self.kv),
            _phantom: PhantomData,
        }
    }
}

impl<T: Document> Collection<T> {
    pub fn new(kv: Arc<dyn KVStore>) -> Self {
        Self {
            kv,
            _phantom: PhantomData,
        }
    }

    fn make_key(id: &str) -> String {
        format!("{}{}", T::kv_prefix(), id)
    }

    fn kv_err(e: KVError) -> ServiceError {
        ServiceError::Storage(e.to_string())
    }

    fn decode(bytes: &[u8]) -> Result<T, ServiceError> {
        serde_json::from_slice(bytes)
            .map_err(|e| ServiceError::Internal(format!("deserialize: {}", e)))
    }

    fn write(&self, record: &T) -> Result<(), ServiceError> {
        let bytes = serde_json::to_vec(record)
            .map_err(|e| ServiceError::Internal(format!("serialize: {}", e)))?;
        self.kv
            .set(&Self::make_key(&record.key_value()), &bytes)
            .map_err(Self::kv_err)
    }

    /// All records in key order.
    pub fn find_all(&self) -> Result<Vec<T>, ServiceError> {
        let entries = self.kv.scan(T::kv_prefix()).map_err(Self::kv_err)?;
        entries.iter().map(|(_, bytes)| Self::decode(bytes)).collect()
    }

    /// A record by id. Returns None if not found.
    pub fn find_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        match self.kv.get(&Self::make_key(id)).map_err(Self::kv_err)? {
            Some(bytes) => Ok(Some(Self::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self) -> Result<usize, ServiceError> {
        Ok(self.kv.scan(T::kv_prefix()).map_err(Self::kv_err)?.len())
    }

    /// Insert a new record. Runs `before_create` and `check`, rejects an
    /// id that is already taken.
    pub fn create(&self, mut record: T) -> Result<T, ServiceError> {
        record.before_create();
        record.check()?;

        let id = record.key_value();
        if self.kv.get(&Self::make_key(&id)).map_err(Self::kv_err)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "{}{} already exists",
                T::kv_prefix(),
                id
            )));
        }

        self.write(&record)?;
        debug!("created {}{}", T::kv_prefix(), id);
        Ok(record)
    }

    /// Replace the record stored under `id`. The written record always
    /// carries `id`, whatever id the caller put in it. Returns None, and
    /// writes nothing, if no record exists under `id`.
    pub fn update_by_id(&self, id: &str, mut record: T) -> Result<Option<T>, ServiceError> {
        if self.find_by_id(id)?.is_none() {
            return Ok(None);
        }
        record.assign_key(id);
        record.check()?;
        self.write(&record)?;
        debug!("updated {}{}", T::kv_prefix(), id);
        Ok(Some(record))
    }

    /// Delete the record under `id`, if any, and return it.
    pub fn delete_by_id(&self, id: &str) -> Result<Option<T>, ServiceError> {
        let existing = self.find_by_id(id)?;
        if existing.is_some() {
            self.kv.delete(&Self::make_key(id)).map_err(Self::kv_err)?;
            debug!("deleted {}{}", T::kv_prefix(), id);
        }
        Ok(existing)
    }

    /// Resolve a set of reference ids into their records. Ids with no
    /// matching record are absent from the result.
    pub fn populate<'a, I>(&self, ids: I) -> Result<HashMap<String, T>, ServiceError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved = HashMap::new();
        for id in ids {
            if resolved.contains_key(id) {
                continue;
            }
            if let Some(record) = self.find_by_id(id)? {
                resolved.insert(id.to_string(), record);
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use locallib_kv::{MemoryStore, RedbStore};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Shelf {
        #[serde(default)]
        id: String,
        label: String,
    }

    impl Document for Shelf {
        fn kv_prefix() -> &'static str {
            "test:shelf:"
        }

        fn key_value(&self) -> String {
            self.id.clone()
        }

        fn assign_key(&mut self, id: &str) {
            self.id = id.to_string();
        }

        fn check(&self) -> Result<(), ServiceError> {
            if self.label.is_empty() {
                return Err(ServiceError::Validation("label is required".into()));
            }
            Ok(())
        }
    }

    fn shelf(label: &str) -> Shelf {
        Shelf { id: String::new(), label: label.into() }
    }

    fn memory_collection() -> (Collection<Shelf>, Arc<MemoryStore>) {
        let mem = Arc::new(MemoryStore::new());
        let kv: Arc<dyn KVStore> = mem.clone();
        (Collection::new(kv), mem)
    }

    #[test]
    fn crud_lifecycle_on_redb() {
        let dir = tempfile::tempdir().unwrap();
        let kv: Arc<dyn KVStore> =
            Arc::new(RedbStore::open(&dir.path().join("test.redb")).unwrap());
        let shelves = Collection::<Shelf>::new(kv);

        let created = shelves.create(shelf("Fiction")).unwrap();
        assert_eq!(created.id.len(), 32);

        let fetched = shelves.find_by_id(&created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(shelves.find_all().unwrap().len(), 1);

        let updated = shelves
            .update_by_id(&created.id, shelf("Non-fiction"))
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(shelves.find_by_id(&created.id).unwrap().unwrap().label, "Non-fiction");

        let deleted = shelves.delete_by_id(&created.id).unwrap();
        assert_eq!(deleted.map(|s| s.label), Some("Non-fiction".into()));
        assert!(shelves.find_by_id(&created.id).unwrap().is_none());
    }

    #[test]
    fn create_keeps_explicit_id_and_rejects_duplicates() {
        let (shelves, _) = memory_collection();
        let mut s = shelf("A");
        s.id = "fixed".into();
        shelves.create(s.clone()).unwrap();

        let err = shelves.create(s).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn schema_check_blocks_writes() {
        let (shelves, mem) = memory_collection();
        let err = shelves.create(shelf("")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(mem.is_empty());
    }

    #[test]
    fn update_missing_returns_none_and_writes_nothing() {
        let (shelves, mem) = memory_collection();
        assert!(shelves.update_by_id("ghost", shelf("X")).unwrap().is_none());
        assert!(mem.is_empty());
    }

    #[test]
    fn delete_missing_is_not_an_error() {
        let (shelves, _) = memory_collection();
        assert!(shelves.delete_by_id("ghost").unwrap().is_none());
    }

    #[test]
    fn populate_skips_dangling_ids() {
        let (shelves, _) = memory_collection();
        let a = shelves.create(shelf("A")).unwrap();
        let b = shelves.create(shelf("B")).unwrap();

        let map = shelves
            .populate([a.id.as_str(), b.id.as_str(), a.id.as_str(), "gone"])
            .unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map[&a.id].label, "A");
        assert!(!map.contains_key("gone"));
    }

    #[test]
    fn backend_failure_maps_to_storage_error() {
        let (shelves, mem) = memory_collection();
        mem.set_fail_writes(true);
        let err = shelves.create(shelf("A")).unwrap_err();
        assert!(matches!(err, ServiceError::Storage(_)));

        mem.set_fail_writes(false);
        mem.set_fail_reads(true);
        assert!(matches!(shelves.find_all().unwrap_err(), ServiceError::Storage(_)));
    }

    #[test]
    fn count_tracks_records() {
        let (shelves, _) = memory_collection();
        assert_eq!(shelves.count().unwrap(), 0);
        let a = shelves.create(shelf("A")).unwrap();
        shelves.create(shelf("B")).unwrap();
        assert_eq!(shelves.count().unwrap(), 2);
        shelves.delete_by_id(&a.id).unwrap();
        assert_eq!(shelves.count().unwrap(), 1);
    }
}
