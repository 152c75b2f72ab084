//! Mapping Resolver
//!
//! Picks the single stored mapping that answers a `(host, path)` pair.
//!
//! ## Precedence
//!
//! 1. A mapping whose path equals the request path
//! 2. The longest mapping path that is a segment-aligned prefix of it
//! 3. The host's empty-path mapping
//!
//! An exact match never loses to a prefix match, and a prefix match never
//! loses to the empty-path fallback.

use tracing::debug;

use crate::db::schemas::Mapping;
use crate::db::MappingStore;
use crate::paths;
use crate::types::Result;

pub struct MappingResolver<'a, S: MappingStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MappingStore + ?Sized> MappingResolver<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Resolve the mapping for a request
    ///
    /// `Ok(None)` means the host is not hosted here, or it is hosted but no
    /// mapping covers the path.
    pub fn resolve(&self, host: &str, path: &str) -> Result<Option<Mapping>> {
        let mappings = self.store.find_mappings_by_host(host)?;
        if mappings.is_empty() {
            debug!(host = %host, "Host has no mappings");
            return Ok(None);
        }
        let selected = select(&mappings, path).cloned();
        debug!(
            host = %host,
            path = %path,
            mapping = ?selected.as_ref().map(|m| m.id),
            "Resolved mapping"
        );
        Ok(selected)
    }

    /// All mappings for a host, path ascending
    pub fn hosted(&self, host: &str) -> Result<Vec<Mapping>> {
        self.store.find_mappings_by_host(host)
    }
}

/// Apply resolver precedence to a host's mappings
pub fn select<'m>(mappings: &'m [Mapping], path: &str) -> Option<&'m Mapping> {
    let path = paths::normalize(path);
    let catch_all = mappings.iter().find(|m| !m.has_path());

    if path.is_empty() {
        return catch_all;
    }

    if let Some(exact) = mappings
        .iter()
        .find(|m| m.has_path() && paths::eq(&m.path, &path))
    {
        return Some(exact);
    }

    let prefix = mappings
        .iter()
        .filter(|m| paths::starts_with_segment(&path, &m.path))
        .fold(None::<&Mapping>, |best, m| match best {
            Some(b) if b.path.len() >= m.path.len() => Some(b),
            _ => Some(m),
        });

    prefix.or(catch_all)
}
