//! TOML site files
//!
//! A site file describes one installation: its canonical base URL, the
//! settings table, every mapping with its values, and enough of the content
//! repository (objects, archives, assets) for the CLI to resolve requests
//! offline.
//!
//! ```toml
//! [site]
//! base_url = "https://main.example"
//!
//! [settings]
//! rewrite_urls = true
//!
//! [[mappings]]
//! id = 1
//! host = "shop.example"
//!
//! [[mappings.values]]
//! object_type = "post"
//! object_id = 42
//! primary = true
//!
//! [[objects]]
//! id = 42
//! content_type = "page"
//! slug = "store"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::content::{ContentObject, InMemoryContent};
use crate::db::schemas::{Mapping, MappingValue};
use crate::db::InMemoryStore;
use crate::types::{HostwayError, Result};

/// Root of a site file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteFile {
    pub site: SiteSection,

    #[serde(default)]
    pub settings: BTreeMap<String, toml::Value>,

    #[serde(default)]
    pub mappings: Vec<MappingEntry>,

    #[serde(default)]
    pub objects: Vec<ContentObject>,

    #[serde(default)]
    pub archives: Vec<ArchiveEntry>,

    #[serde(default)]
    pub assets: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSection {
    /// Canonical base URL, including any subdirectory
    pub base_url: String,

    /// Path of the repository home URL
    #[serde(default)]
    pub home_path: String,

    /// Object id of the commerce listing page
    #[serde(default)]
    pub commerce_listing: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingEntry {
    pub id: i64,
    pub host: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub custom_head_markup: Option<String>,

    #[serde(default)]
    pub favicon_ref: Option<i64>,

    #[serde(default)]
    pub values: Vec<MappingValue>,
}

impl MappingEntry {
    fn to_mapping(&self) -> Mapping {
        let mut mapping = Mapping::new(self.id, &self.host, &self.path);
        mapping.custom_head_markup = self.custom_head_markup.clone();
        mapping.favicon_ref = self.favicon_ref;
        mapping
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub content_type: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetEntry {
    pub id: i64,
    pub url: String,
}

impl SiteFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HostwayError::Io(format!("failed to read site file {}: {}", path.display(), e))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }
}

/// Setting values are stored as strings; TOML scalars are flattened
fn setting_string(value: &toml::Value) -> Result<String> {
    match value {
        toml::Value::String(s) => Ok(s.clone()),
        toml::Value::Integer(i) => Ok(i.to_string()),
        toml::Value::Boolean(b) => Ok(if *b { "1" } else { "0" }.to_string()),
        toml::Value::Float(f) => Ok(f.to_string()),
        other => Err(HostwayError::InvalidData(format!(
            "setting values must be scalars, got {}",
            other.type_str()
        ))),
    }
}

/// A loaded site: populated store, content repository and base URL
#[derive(Debug)]
pub struct SiteFixture {
    pub base_url: String,
    pub store: InMemoryStore,
    pub content: InMemoryContent,
}

impl SiteFixture {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_file(SiteFile::load(path)?)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        Self::from_file(SiteFile::parse(raw)?)
    }

    /// Populate an in-memory store from a parsed file
    ///
    /// Values without an id get one after the highest explicit id. The
    /// store rejects duplicate `(host, path)` pairs.
    pub fn from_file(file: SiteFile) -> Result<Self> {
        let store = InMemoryStore::new();

        for (key, value) in &file.settings {
            store.set_setting(key, &setting_string(value)?)?;
        }

        let mut next_value_id = file
            .mappings
            .iter()
            .flat_map(|m| m.values.iter().map(|v| v.id))
            .max()
            .unwrap_or(0)
            + 1;

        for entry in file.mappings {
            let mapping_id = entry.id;
            store.upsert_mapping(entry.to_mapping())?;
            for mut value in entry.values {
                if value.id == 0 {
                    value.id = next_value_id;
                    next_value_id += 1;
                }
                value.mapping_id = mapping_id;
                store.upsert_value(value)?;
            }
        }

        let mut content = InMemoryContent::new().with_home_path(&file.site.home_path);
        if let Some(listing) = file.site.commerce_listing {
            content = content.with_commerce_listing(listing);
        }
        for archive in &file.archives {
            content = content.with_archive(&archive.content_type, &archive.path);
        }
        for asset in &file.assets {
            content = content.with_asset(asset.id, &asset.url);
        }
        for object in file.objects {
            content.insert(object);
        }

        info!(
            base_url = %file.site.base_url,
            mappings = store.mapping_count(),
            "Loaded site file"
        );

        Ok(Self {
            base_url: file.site.base_url,
            store,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentRepository;
    use crate::db::schemas::ObjectType;
    use crate::db::MappingStore;

    const SITE: &str = r#"
[site]
base_url = "https://main.example"

[settings]
rewrite_urls = true
page_on_front = 7

[[mappings]]
id = 1
host = "Shop.Example"

[[mappings.values]]
object_type = "post"
object_id = 42
primary = true

[[mappings.values]]
object_type = "term"
object_id = 5

[[objects]]
id = 42
content_type = "page"
slug = "store"

[[archives]]
content_type = "book"
path = "books"
"#;

    #[test]
    fn test_parse_site_file() {
        let fixture = SiteFixture::parse(SITE).unwrap();
        assert_eq!(fixture.base_url, "https://main.example");

        let mappings = fixture.store.find_mappings_by_host("shop.example").unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].host, "shop.example");

        let values = fixture.store.find_values_by_mapping(1).unwrap();
        assert_eq!(values.len(), 2);
        assert!(values[0].primary);
        assert_eq!(values[1].object_type, ObjectType::Term);
        assert_ne!(values[0].id, values[1].id);
    }

    #[test]
    fn test_settings_flattened_to_strings() {
        let fixture = SiteFixture::parse(SITE).unwrap();
        assert_eq!(
            fixture.store.find_setting("rewrite_urls").unwrap().as_deref(),
            Some("1")
        );
        assert_eq!(
            fixture.store.find_setting("page_on_front").unwrap().as_deref(),
            Some("7")
        );
    }

    #[test]
    fn test_content_populated() {
        let fixture = SiteFixture::parse(SITE).unwrap();
        assert_eq!(
            fixture.content.canonical_path(&ObjectType::Post, 42).as_deref(),
            Some("store")
        );
        assert!(fixture.content.has_archive("book"));
    }

    #[test]
    fn test_duplicate_host_path_rejected() {
        let raw = r#"
[site]
base_url = "https://main.example"

[[mappings]]
id = 1
host = "a.example"
path = "blog"

[[mappings]]
id = 2
host = "A.example"
path = "/blog/"
"#;
        let err = SiteFixture::parse(raw).unwrap_err();
        assert!(matches!(err, HostwayError::InvalidData(_)));
    }

    #[test]
    fn test_missing_site_section_is_parse_error() {
        let err = SiteFixture::parse("[settings]\n").unwrap_err();
        assert!(matches!(err, HostwayError::Parse(_)));
    }
}
