//! Mapping store contract and the in-memory implementation

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::db::schemas::{sort_values, Mapping, MappingValue};
use crate::types::{HostwayError, Result};

/// Read-only view of mapping storage consumed by the pipeline
pub trait MappingStore: Send + Sync {
    /// Mappings whose host equals `host` (case-insensitive), ordered by path ascending
    fn find_mappings_by_host(&self, host: &str) -> Result<Vec<Mapping>>;

    /// Values owned by a mapping, primary first
    fn find_values_by_mapping(&self, mapping_id: i64) -> Result<Vec<MappingValue>>;

    /// Raw value of a named setting
    fn find_setting(&self, key: &str) -> Result<Option<String>>;

    /// Monotonic counter bumped on every write
    ///
    /// Stores that cannot observe their own writes return 0 and must be
    /// invalidated explicitly through `CachedStore::invalidate`.
    fn generation(&self) -> u64 {
        0
    }
}

impl<T: MappingStore + ?Sized> MappingStore for Arc<T> {
    fn find_mappings_by_host(&self, host: &str) -> Result<Vec<Mapping>> {
        (**self).find_mappings_by_host(host)
    }

    fn find_values_by_mapping(&self, mapping_id: i64) -> Result<Vec<MappingValue>> {
        (**self).find_values_by_mapping(mapping_id)
    }

    fn find_setting(&self, key: &str) -> Result<Option<String>> {
        (**self).find_setting(key)
    }

    fn generation(&self) -> u64 {
        (**self).generation()
    }
}

#[derive(Debug, Default)]
struct Tables {
    mappings: BTreeMap<i64, Mapping>,
    values: BTreeMap<i64, MappingValue>,
    settings: BTreeMap<String, String>,
}

/// In-memory mapping store
///
/// Enforces the `(host, path)` uniqueness invariant and cascades value
/// deletion, standing in for the management API's write path.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    generation: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| HostwayError::Store("mapping tables lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| HostwayError::Store("mapping tables lock poisoned".into()))
    }

    fn bump(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Insert or replace a mapping
    pub fn upsert_mapping(&self, mapping: Mapping) -> Result<()> {
        let mapping = mapping.normalized();
        if mapping.host.is_empty() {
            return Err(HostwayError::InvalidData("mapping host is required".into()));
        }

        let mut tables = self.write()?;
        let key = mapping.unique_key();
        if let Some(existing) = tables
            .mappings
            .values()
            .find(|m| m.id != mapping.id && m.unique_key() == key)
        {
            return Err(HostwayError::InvalidData(format!(
                "mapping with host {} and path '{}' already exists (id {})",
                existing.host, existing.path, existing.id
            )));
        }

        debug!(id = mapping.id, host = %mapping.host, path = %mapping.path, "Stored mapping");
        tables.mappings.insert(mapping.id, mapping);
        drop(tables);
        self.bump();
        Ok(())
    }

    /// Delete a mapping and every value it owns
    pub fn delete_mapping(&self, mapping_id: i64) -> Result<bool> {
        let mut tables = self.write()?;
        let removed = tables.mappings.remove(&mapping_id).is_some();
        tables.values.retain(|_, v| v.mapping_id != mapping_id);
        drop(tables);
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    /// Insert or replace a mapping value; the owning mapping must exist
    pub fn upsert_value(&self, value: MappingValue) -> Result<()> {
        let mut tables = self.write()?;
        if !tables.mappings.contains_key(&value.mapping_id) {
            return Err(HostwayError::InvalidData(format!(
                "mapping {} does not exist",
                value.mapping_id
            )));
        }
        tables.values.insert(value.id, value);
        drop(tables);
        self.bump();
        Ok(())
    }

    pub fn delete_value(&self, value_id: i64) -> Result<bool> {
        let removed = self.write()?.values.remove(&value_id).is_some();
        if removed {
            self.bump();
        }
        Ok(removed)
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.write()?.settings.insert(key.to_string(), value.to_string());
        self.bump();
        Ok(())
    }

    pub fn remove_setting(&self, key: &str) -> Result<()> {
        self.write()?.settings.remove(key);
        self.bump();
        Ok(())
    }

    /// Number of stored mappings
    pub fn mapping_count(&self) -> usize {
        self.read().map(|t| t.mappings.len()).unwrap_or(0)
    }
}

impl MappingStore for InMemoryStore {
    fn find_mappings_by_host(&self, host: &str) -> Result<Vec<Mapping>> {
        let tables = self.read()?;
        let mut found: Vec<Mapping> = tables
            .mappings
            .values()
            .filter(|m| m.host.eq_ignore_ascii_case(host))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
        Ok(found)
    }

    fn find_values_by_mapping(&self, mapping_id: i64) -> Result<Vec<MappingValue>> {
        let tables = self.read()?;
        let mut found: Vec<MappingValue> = tables
            .values
            .values()
            .filter(|v| v.mapping_id == mapping_id)
            .cloned()
            .collect();
        sort_values(&mut found);
        Ok(found)
    }

    fn find_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read()?.settings.get(key).cloned())
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_by_host_ordered_by_path() {
        let store = InMemoryStore::new();
        store.upsert_mapping(Mapping::new(1, "example.com", "blog/tech")).unwrap();
        store.upsert_mapping(Mapping::new(2, "example.com", "")).unwrap();
        store.upsert_mapping(Mapping::new(3, "example.com", "blog")).unwrap();
        store.upsert_mapping(Mapping::new(4, "other.com", "")).unwrap();

        let found = store.find_mappings_by_host("EXAMPLE.com").unwrap();
        let paths: Vec<&str> = found.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["", "blog", "blog/tech"]);
    }

    #[test]
    fn test_unique_host_path() {
        let store = InMemoryStore::new();
        store.upsert_mapping(Mapping::new(1, "example.com", "blog")).unwrap();
        let err = store
            .upsert_mapping(Mapping::new(2, "Example.com", "/Blog/"))
            .unwrap_err();
        assert!(matches!(err, HostwayError::InvalidData(_)));

        // Updating the same row is fine
        store.upsert_mapping(Mapping::new(1, "example.com", "blog")).unwrap();
        assert_eq!(store.mapping_count(), 1);
    }

    #[test]
    fn test_delete_mapping_cascades() {
        let store = InMemoryStore::new();
        store.upsert_mapping(Mapping::new(1, "example.com", "")).unwrap();
        store.upsert_value(MappingValue::post(10, 1, 100)).unwrap();
        store.upsert_value(MappingValue::post(11, 1, 101)).unwrap();

        assert!(store.delete_mapping(1).unwrap());
        assert!(store.find_values_by_mapping(1).unwrap().is_empty());
    }

    #[test]
    fn test_value_requires_mapping() {
        let store = InMemoryStore::new();
        assert!(store.upsert_value(MappingValue::post(10, 9, 100)).is_err());
    }

    #[test]
    fn test_generation_bumps_on_write() {
        let store = InMemoryStore::new();
        let before = store.generation();
        store.set_setting("rewrite_urls", "1").unwrap();
        assert!(store.generation() > before);
        assert_eq!(store.find_setting("rewrite_urls").unwrap().as_deref(), Some("1"));
    }
}
