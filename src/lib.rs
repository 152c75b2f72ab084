//! Hostway - serve one content repository under many hostnames
//!
//! Hostway maps external domains (optionally with a path prefix) onto
//! content objects of a single canonical install, then rewrites outgoing
//! URLs so visitors stay on the mapped host.
//!
//! ## Pipeline
//!
//! - **Resolver**: picks the mapping for a (host, path) pair
//! - **Scenarios**: ordered strategies claim one mapping value
//! - **Query**: mappers turn the claim into a content query override
//! - **Unmapped**: not-found, redirect-to-primary or canonical redirect
//! - **Rewrite**: link, asset and markup rewriting plus head customization

pub mod config;
pub mod content;
pub mod db;
pub mod logging;
pub mod paths;
pub mod pipeline;
pub mod query;
pub mod request;
pub mod resolver;
pub mod rewrite;
pub mod scenarios;
pub mod types;
pub mod unmapped;

pub use config::{Args, Settings};
pub use content::{ContentRepository, InMemoryContent};
pub use db::{CachedStore, InMemoryStore, MappingStore, SiteFixture};
pub use pipeline::{Pipeline, PipelineConfig, Resolution, ResolvedRequest};
pub use request::{BaseInstall, RequestContext};
pub use types::{HostwayError, Result};
