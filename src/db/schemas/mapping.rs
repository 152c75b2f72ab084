//! Mapping schema
//!
//! A mapping binds an external hostname (optionally restricted to a
//! sub-path) to one or more content objects.

use serde::{Deserialize, Serialize};

use crate::paths;

/// Mapping row
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Mapping {
    /// Row identity
    pub id: i64,

    /// External hostname, stored lower-case
    pub host: String,

    /// Optional sub-path, stored without leading/trailing slash
    #[serde(default)]
    pub path: String,

    /// Markup injected into `<head>` of mapped pages
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_head_markup: Option<String>,

    /// Asset id of the favicon served on this mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_ref: Option<i64>,
}

impl Mapping {
    /// Create a mapping with normalized host and path
    pub fn new(id: i64, host: &str, path: &str) -> Self {
        Self {
            id,
            host: host.trim().to_ascii_lowercase(),
            path: paths::normalize(path),
            custom_head_markup: None,
            favicon_ref: None,
        }
    }

    /// Normalize host and path in place (used after deserializing rows)
    pub fn normalized(mut self) -> Self {
        self.host = self.host.trim().to_ascii_lowercase();
        self.path = paths::normalize(&self.path);
        self
    }

    /// Whether the mapping is restricted to a sub-path
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// `host/path`, or just `host` for an empty path
    pub fn host_plus_path(&self) -> String {
        if self.path.is_empty() {
            self.host.clone()
        } else {
            format!("{}/{}", self.host, self.path)
        }
    }

    /// Identity of the `(host, path)` pair used for the uniqueness invariant
    pub fn unique_key(&self) -> (String, String) {
        (self.host.to_ascii_lowercase(), self.path.to_ascii_lowercase())
    }
}
