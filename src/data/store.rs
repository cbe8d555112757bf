//! Backing-store contracts and the in-memory reference implementation
//!
//! A [`DataStore`] is the per-entity-type CRUD target the generic engine
//! delegates to; a [`StoreManager`] creates or returns the store for an
//! entity set, reusing it across requests. The engine never constructs
//! storage directly.

use crate::core::error::{EngineResult, StoreError};
use crate::core::record::{EntityRecord, KeyMap};
use crate::data::read::{ReadOptions, ReadResult};
use crate::model::descriptor::EntityDescriptor;
use crate::model::keys::{key_match, key_match_map};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Per-entity-type CRUD target
///
/// Each CRUD call must be treated as an atomic unit by the implementation;
/// the engine provides no locking, retries or rollback on top.
pub trait DataStore: Send + Sync {
    /// Descriptor of the entity type stored here
    fn descriptor(&self) -> &Arc<EntityDescriptor>;

    /// Name of this store (the entity-set name)
    fn name(&self) -> &str;

    /// Create a blank, unpersisted instance of the stored entity type
    fn create_instance(&self) -> EntityRecord;

    /// Store a new record
    fn create(&self, record: EntityRecord) -> EngineResult<EntityRecord>;

    /// Read the record whose keys equal the given key values
    fn read_by_key(&self, keys: &KeyMap) -> EngineResult<Option<EntityRecord>>;

    /// Read every record of this store
    fn read_all(&self) -> EngineResult<Vec<EntityRecord>>;

    /// Read with options; the result's applied flags declare which
    /// constraints the store executed itself.
    fn read(&self, options: &ReadOptions) -> EngineResult<ReadResult>;

    /// Update the record that is key-equal to the given one; `None` if no
    /// such record exists (nothing is written then).
    fn update(&self, record: EntityRecord) -> EngineResult<Option<EntityRecord>>;

    /// Delete the record whose keys equal the given key values; returns the
    /// removed record, or `None` if nothing matched.
    fn delete(&self, keys: &KeyMap) -> EngineResult<Option<EntityRecord>>;

    /// Whether both instances belong to this store's entity type and have
    /// equal key values (all-null keys on both sides also count as equal).
    fn is_key_equal(&self, first: &EntityRecord, second: &EntityRecord) -> EngineResult<bool>;
}

/// Manager (and factory) for [`DataStore`] instances
pub trait StoreManager: Send + Sync {
    /// Create a store under the given name, or return the existing one.
    /// Stores are never destroyed during normal operation.
    fn grant_store(
        &self,
        name: &str,
        descriptor: &Arc<EntityDescriptor>,
    ) -> EngineResult<Arc<dyn DataStore>>;

    /// Look up an already-granted store
    fn store(&self, name: &str) -> Option<Arc<dyn DataStore>>;
}

/// Flat in-memory store, useful for testing and development.
///
/// Deliberately the cheap end of the read-option negotiation: it claims no
/// applied flags and leaves filtering, ordering and paging to the engine.
pub struct InMemoryDataStore {
    name: String,
    descriptor: Arc<EntityDescriptor>,
    records: RwLock<Vec<EntityRecord>>,
}

impl InMemoryDataStore {
    /// Create an empty store for the given entity type
    pub fn new(name: impl Into<String>, descriptor: Arc<EntityDescriptor>) -> Self {
        Self {
            name: name.into(),
            descriptor,
            records: RwLock::new(Vec::new()),
        }
    }

    fn read_lock(&self) -> EngineResult<std::sync::RwLockReadGuard<'_, Vec<EntityRecord>>> {
        self.records
            .read()
            .map_err(|e| StoreError::new(&self.name, format!("failed to acquire read lock: {}", e)).into())
    }

    fn write_lock(&self) -> EngineResult<std::sync::RwLockWriteGuard<'_, Vec<EntityRecord>>> {
        self.records
            .write()
            .map_err(|e| StoreError::new(&self.name, format!("failed to acquire write lock: {}", e)).into())
    }

    fn check_entity(&self, record: &EntityRecord) -> EngineResult<()> {
        if record.entity() != self.descriptor.entity() {
            return Err(StoreError::new(
                &self.name,
                format!(
                    "record of entity type '{}' does not belong to store of '{}'",
                    record.entity(),
                    self.descriptor.entity()
                ),
            )
            .into());
        }
        Ok(())
    }
}

impl DataStore for InMemoryDataStore {
    fn descriptor(&self) -> &Arc<EntityDescriptor> {
        &self.descriptor
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn create_instance(&self) -> EntityRecord {
        EntityRecord::new(self.descriptor.entity())
    }

    fn create(&self, record: EntityRecord) -> EngineResult<EntityRecord> {
        self.check_entity(&record)?;
        let mut records = self.write_lock()?;
        for existing in records.iter() {
            if key_match(&self.descriptor, existing, &record)? {
                return Err(StoreError::new(
                    &self.name,
                    "record with equal key values already exists",
                )
                .into());
            }
        }
        records.push(record.clone());
        Ok(record)
    }

    fn read_by_key(&self, keys: &KeyMap) -> EngineResult<Option<EntityRecord>> {
        let records = self.read_lock()?;
        for record in records.iter() {
            if key_match_map(&self.descriptor, record, keys)? {
                return Ok(Some(record.clone()));
            }
        }
        Ok(None)
    }

    fn read_all(&self) -> EngineResult<Vec<EntityRecord>> {
        Ok(self.read_lock()?.clone())
    }

    fn read(&self, _options: &ReadOptions) -> EngineResult<ReadResult> {
        Ok(ReadResult::for_records(self.read_lock()?.clone()).build())
    }

    fn update(&self, record: EntityRecord) -> EngineResult<Option<EntityRecord>> {
        self.check_entity(&record)?;
        let mut records = self.write_lock()?;
        for existing in records.iter_mut() {
            if key_match(&self.descriptor, existing, &record)? {
                *existing = record.clone();
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    fn delete(&self, keys: &KeyMap) -> EngineResult<Option<EntityRecord>> {
        let mut records = self.write_lock()?;
        let mut found = None;
        for (index, record) in records.iter().enumerate() {
            if key_match_map(&self.descriptor, record, keys)? {
                found = Some(index);
                break;
            }
        }
        Ok(found.map(|index| records.remove(index)))
    }

    fn is_key_equal(&self, first: &EntityRecord, second: &EntityRecord) -> EngineResult<bool> {
        self.check_entity(first)?;
        self.check_entity(second)?;
        key_match(&self.descriptor, first, second)
    }
}

/// Manager keeping one in-memory store per entity set
#[derive(Default)]
pub struct InMemoryStoreManager {
    stores: RwLock<HashMap<String, Arc<dyn DataStore>>>,
}

impl InMemoryStoreManager {
    pub fn new() -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
        }
    }
}

impl StoreManager for InMemoryStoreManager {
    fn grant_store(
        &self,
        name: &str,
        descriptor: &Arc<EntityDescriptor>,
    ) -> EngineResult<Arc<dyn DataStore>> {
        let mut stores = self
            .stores
            .write()
            .map_err(|e| StoreError::new(name, format!("failed to acquire write lock: {}", e)))?;
        if let Some(store) = stores.get(name) {
            return Ok(Arc::clone(store));
        }
        debug!(store = name, entity = descriptor.entity(), "granting in-memory store");
        let store: Arc<dyn DataStore> =
            Arc::new(InMemoryDataStore::new(name, Arc::clone(descriptor)));
        stores.insert(name.to_string(), Arc::clone(&store));
        Ok(store)
    }

    fn store(&self, name: &str) -> Option<Arc<dyn DataStore>> {
        self.stores.read().ok()?.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::field::{FieldValue, PropertyType};

    fn employee_descriptor() -> Arc<EntityDescriptor> {
        Arc::new(
            EntityDescriptor::builder("Employee")
                .entity_set("Employees")
                .key("employeeId", PropertyType::Int32)
                .property("employeeName", PropertyType::String)
                .build()
                .unwrap(),
        )
    }

    fn employee(id: i64, name: &str) -> EntityRecord {
        let mut record = EntityRecord::new("Employee");
        record.set("EmployeeId", FieldValue::Integer(id));
        record.set("EmployeeName", FieldValue::String(name.to_string()));
        record
    }

    fn keys(id: i64) -> KeyMap {
        let mut keys = KeyMap::new();
        keys.insert("EmployeeId".to_string(), FieldValue::Integer(id));
        keys
    }

    #[test]
    fn test_create_and_read_by_key() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        store.create(employee(1, "Walter")).unwrap();

        let read = store.read_by_key(&keys(1)).unwrap().unwrap();
        assert_eq!(
            read.get("EmployeeName"),
            Some(&FieldValue::String("Walter".to_string()))
        );
        assert!(store.read_by_key(&keys(2)).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_fails() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        store.create(employee(1, "Walter")).unwrap();
        assert!(store.create(employee(1, "Other")).is_err());
    }

    #[test]
    fn test_create_rejects_foreign_entity_type() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        assert!(store.create(EntityRecord::new("Room")).is_err());
    }

    #[test]
    fn test_update_and_delete() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        store.create(employee(1, "Walter")).unwrap();

        let updated = store.update(employee(1, "Heisenberg")).unwrap().unwrap();
        assert_eq!(
            updated.get("EmployeeName"),
            Some(&FieldValue::String("Heisenberg".to_string()))
        );
        assert!(store.update(employee(9, "Nobody")).unwrap().is_none());

        let removed = store.delete(&keys(1)).unwrap();
        assert!(removed.is_some());
        assert!(store.delete(&keys(1)).unwrap().is_none());
        assert!(store.read_all().unwrap().is_empty());
    }

    #[test]
    fn test_read_claims_no_applied_flags() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        store.create(employee(1, "Walter")).unwrap();

        let options = ReadOptions::builder().top(1).build();
        let result = store.read(&options).unwrap();
        assert!(!result.is_filter_applied());
        assert!(!result.is_order_applied());
        assert!(!result.is_skip_applied());
        assert!(!result.is_top_applied());
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_is_key_equal() {
        let store = InMemoryDataStore::new("Employees", employee_descriptor());
        assert!(
            store
                .is_key_equal(&employee(1, "a"), &employee(1, "b"))
                .unwrap()
        );
        assert!(
            !store
                .is_key_equal(&employee(1, "a"), &employee(2, "a"))
                .unwrap()
        );
        assert!(
            store
                .is_key_equal(&employee(1, "a"), &EntityRecord::new("Room"))
                .is_err()
        );
    }

    #[test]
    fn test_manager_grants_once() {
        let manager = InMemoryStoreManager::new();
        let descriptor = employee_descriptor();

        let first = manager.grant_store("Employees", &descriptor).unwrap();
        first.create(employee(1, "Walter")).unwrap();

        // Granting again returns the same store with its data intact.
        let second = manager.grant_store("Employees", &descriptor).unwrap();
        assert_eq!(second.read_all().unwrap().len(), 1);

        assert!(manager.store("Employees").is_some());
        assert!(manager.store("Rooms").is_none());
    }
}
