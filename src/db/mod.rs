//! Mapping storage for hostway
//!
//! The core only ever reads from storage: mappings by host, values by
//! mapping, named settings. Writes exist on the in-memory store so tests and
//! the CLI fixture loader can populate it, and so the memo cache has a
//! generation to invalidate against.

pub mod file;
pub mod memo;
pub mod schemas;
mod store;

pub use file::{SiteFile, SiteFixture};
pub use memo::{CachedStore, MemoStats, QueryKey};
pub use store::{InMemoryStore, MappingStore};
