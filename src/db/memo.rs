//! Read-through memo cache in front of a `MappingStore`
//!
//! Identical lookups within a request (and across requests until the next
//! write) are served from memory. The cache is never a source of truth: any
//! change in the wrapped store's generation drops every entry before the
//! next read is answered.
//!
//! ```text
//! lookup ──► generation changed? ──yes──► clear
//!                  │
//!                  ▼
//!            key = table:sha256(signature)[..8]
//!                  │
//!            hit ◄─┴─► miss ──► inner store ──► remember (Ok only)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::db::schemas::{Mapping, MappingValue};
use crate::db::store::MappingStore;
use crate::types::Result;

/// Cache key for a store lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    /// Table the lookup reads from
    pub table: &'static str,
    /// Hash of the normalized lookup signature
    pub signature_hash: String,
}

impl QueryKey {
    pub fn new(table: &'static str, signature: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(table.as_bytes());
        hasher.update(b"\0");
        hasher.update(signature.as_bytes());
        let hash = hasher.finalize();
        Self {
            table,
            signature_hash: hex::encode(&hash[..8]),
        }
    }

    pub fn mappings_by_host(host: &str) -> Self {
        Self::new("mappings", &format!("host={}", host.trim().to_ascii_lowercase()))
    }

    pub fn values_by_mapping(mapping_id: i64) -> Self {
        Self::new("mapping_values", &format!("mapping_id={}", mapping_id))
    }

    pub fn setting(key: &str) -> Self {
        Self::new("settings", &format!("key={}", key))
    }

    /// Format: table:hash
    pub fn to_storage_key(&self) -> String {
        format!("{}:{}", self.table, self.signature_hash)
    }
}

#[derive(Debug, Clone)]
enum CachedEntry {
    Mappings(Arc<Vec<Mapping>>),
    Values(Arc<Vec<MappingValue>>),
    Setting(Option<String>),
}

/// Cache hit/miss counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub invalidations: u64,
    pub entries: usize,
}

/// Memoizing wrapper around a mapping store
pub struct CachedStore<S> {
    inner: S,
    entries: DashMap<String, CachedEntry>,
    seen_generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl<S: MappingStore> CachedStore<S> {
    pub fn new(inner: S) -> Self {
        let generation = inner.generation();
        Self {
            inner,
            entries: DashMap::new(),
            seen_generation: AtomicU64::new(generation),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// The wrapped store
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every memoized lookup
    pub fn invalidate(&self) {
        self.entries.clear();
        self.invalidations.fetch_add(1, Ordering::Relaxed);
        debug!("Store memo cache invalidated");
    }

    pub fn stats(&self) -> MemoStats {
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }

    fn sync_generation(&self) {
        let current = self.inner.generation();
        let seen = self.seen_generation.swap(current, Ordering::SeqCst);
        if seen != current {
            self.invalidate();
        }
    }

    fn lookup(&self, key: &QueryKey) -> Option<CachedEntry> {
        self.sync_generation();
        let storage_key = key.to_storage_key();
        match self.entries.get(&storage_key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a read taken at generation `before`, unless a write landed meanwhile
    fn remember(&self, key: &QueryKey, entry: CachedEntry, before: u64) {
        if !self.is_current(before) {
            debug!(table = key.table, "Store changed during read, result not memoized");
            return;
        }
        let storage_key = key.to_storage_key();
        self.entries.insert(storage_key.clone(), entry);
        if !self.is_current(before) {
            self.entries.remove(&storage_key);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.generation() == generation
            && self.seen_generation.load(Ordering::SeqCst) == generation
    }
}

impl<S: MappingStore> MappingStore for CachedStore<S> {
    fn find_mappings_by_host(&self, host: &str) -> Result<Vec<Mapping>> {
        let key = QueryKey::mappings_by_host(host);
        if let Some(CachedEntry::Mappings(found)) = self.lookup(&key) {
            return Ok(found.as_ref().clone());
        }
        let before = self.inner.generation();
        let found = self.inner.find_mappings_by_host(host)?;
        self.remember(&key, CachedEntry::Mappings(Arc::new(found.clone())), before);
        Ok(found)
    }

    fn find_values_by_mapping(&self, mapping_id: i64) -> Result<Vec<MappingValue>> {
        let key = QueryKey::values_by_mapping(mapping_id);
        if let Some(CachedEntry::Values(found)) = self.lookup(&key) {
            return Ok(found.as_ref().clone());
        }
        let before = self.inner.generation();
        let found = self.inner.find_values_by_mapping(mapping_id)?;
        self.remember(&key, CachedEntry::Values(Arc::new(found.clone())), before);
        Ok(found)
    }

    fn find_setting(&self, key: &str) -> Result<Option<String>> {
        let query_key = QueryKey::setting(key);
        if let Some(CachedEntry::Setting(value)) = self.lookup(&query_key) {
            return Ok(value);
        }
        let before = self.inner.generation();
        let value = self.inner.find_setting(key)?;
        self.remember(&query_key, CachedEntry::Setting(value.clone()), before);
        Ok(value)
    }

    fn generation(&self) -> u64 {
        self.inner.generation()
    }
}
