//! Configuration for hostway
//!
//! Two layers: CLI arguments and environment variables for the binary
//! (clap), and the stored settings table decoded per request into a typed
//! [`Settings`] with documented defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::debug;

use crate::db::schemas::setting;
use crate::db::MappingStore;
use crate::request::BaseInstall;
use crate::types::Result;
use crate::unmapped::UnmappedPolicy;

// =============================================================================
// CLI
// =============================================================================

/// hostway - serve one content repository under many hostnames
#[derive(Parser, Debug, Clone)]
#[command(name = "hostway")]
#[command(about = "Resolve and rewrite requests for mapped domains")]
pub struct Args {
    /// Site file describing mappings, settings and content
    #[arg(long, env = "HOSTWAY_STORE", default_value = "hostway.toml")]
    pub store: PathBuf,

    /// Canonical base URL of the install (overrides the site file)
    #[arg(long, env = "HOSTWAY_BASE_URL")]
    pub base_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Extra path prefixes treated as backend areas
    #[arg(long = "backend-path", env = "HOSTWAY_BACKEND_PATHS", value_delimiter = ',')]
    pub backend_paths: Vec<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Resolve a request URL and print the decision as JSON
    Resolve {
        /// Absolute request URL, e.g. https://shop.example/about
        url: String,
    },

    /// Resolve a request URL, then rewrite markup or URLs for it
    Rewrite {
        /// Absolute request URL
        url: String,

        /// Markup file to rewrite (stdin when omitted)
        #[arg(long)]
        markup: Option<PathBuf>,

        /// URLs to rewrite as links instead of markup
        #[arg(long = "link")]
        links: Vec<String>,
    },
}

impl Command {
    pub fn url(&self) -> &str {
        match self {
            Self::Resolve { url } | Self::Rewrite { url, .. } => url,
        }
    }
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if let Some(base_url) = &self.base_url {
            BaseInstall::parse(base_url)
                .map_err(|e| format!("HOSTWAY_BASE_URL is invalid: {}", e))?;
        }

        if url::Url::parse(self.command.url()).is_err() {
            return Err(format!("request URL must be absolute: {}", self.command.url()));
        }

        if !matches!(
            self.log_level.to_ascii_lowercase().as_str(),
            "trace" | "debug" | "info" | "warn" | "error"
        ) {
            return Err(format!("unknown LOG_LEVEL: {}", self.log_level));
        }

        Ok(())
    }
}

// =============================================================================
// Stored settings
// =============================================================================

/// How outbound links are rewritten on mapped pages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteMode {
    /// Every link to the base host moves to the mapped host
    #[default]
    Global,
    /// Only links inside the mapping's own objects move
    Selective,
}

impl RewriteMode {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "global" | "1" => Some(Self::Global),
            "selective" | "2" => Some(Self::Selective),
            _ => None,
        }
    }
}

/// What the repository serves at its home URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrontMode {
    /// Latest items listing
    #[default]
    Posts,
    /// A static page
    Page,
}

/// Decoded settings table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub rewrite_urls: bool,
    pub rewrite_mode: RewriteMode,
    pub unmapped_policy: UnmappedPolicy,
    pub show_on_front: FrontMode,
    pub page_on_front: Option<i64>,
    pub page_for_posts: Option<i64>,
    pub short_child_urls: bool,
    pub global_domain_mapping: bool,
    pub global_archive_mapping: bool,
    pub global_parent_mapping: bool,
    pub global_shop_mapping: bool,
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rewrite_urls: false,
            rewrite_mode: RewriteMode::Global,
            unmapped_policy: UnmappedPolicy::CanonicalRedirect,
            show_on_front: FrontMode::Posts,
            page_on_front: None,
            page_for_posts: None,
            short_child_urls: false,
            global_domain_mapping: false,
            global_archive_mapping: false,
            global_parent_mapping: false,
            global_shop_mapping: false,
            debug: false,
        }
    }
}

impl Settings {
    /// Read every known key from the store
    ///
    /// Missing or unreadable values fall back to their defaults; only store
    /// failures are returned.
    pub fn load<S: MappingStore + ?Sized>(store: &S) -> Result<Self> {
        let mut settings = Self::default();
        for key in setting::ALL {
            if let Some(raw) = store.find_setting(key)? {
                settings.apply(key, &raw);
            }
        }
        Ok(settings)
    }

    fn apply(&mut self, key: &str, raw: &str) {
        match key {
            setting::REWRITE_URLS => self.rewrite_urls = setting::is_truthy(raw),
            setting::REWRITE_MODE => match RewriteMode::parse(raw) {
                Some(mode) => self.rewrite_mode = mode,
                None => debug!(value = %raw, "Unknown rewrite mode, using global"),
            },
            setting::UNMAPPED_HANDLING => match UnmappedPolicy::parse(raw) {
                Some(policy) => self.unmapped_policy = policy,
                None => debug!(value = %raw, "Unknown unmapped policy, using canonical redirect"),
            },
            setting::SHOW_ON_FRONT => {
                self.show_on_front = match raw.trim() {
                    "page" => FrontMode::Page,
                    _ => FrontMode::Posts,
                }
            }
            setting::PAGE_ON_FRONT => self.page_on_front = parse_object_id(raw),
            setting::PAGE_FOR_POSTS => self.page_for_posts = parse_object_id(raw),
            setting::SHORT_CHILD_URLS => self.short_child_urls = setting::is_truthy(raw),
            setting::GLOBAL_DOMAIN_MAPPING => self.global_domain_mapping = setting::is_truthy(raw),
            setting::GLOBAL_ARCHIVE_MAPPING => {
                self.global_archive_mapping = setting::is_truthy(raw)
            }
            setting::GLOBAL_PARENT_MAPPING => self.global_parent_mapping = setting::is_truthy(raw),
            setting::GLOBAL_SHOP_MAPPING => self.global_shop_mapping = setting::is_truthy(raw),
            setting::DEBUG => self.debug = setting::is_truthy(raw),
            _ => {}
        }
    }

    /// Link rewriting mode, `None` when link rewriting is off
    pub fn link_rewrite_mode(&self) -> Option<RewriteMode> {
        self.rewrite_urls.then_some(self.rewrite_mode)
    }

    /// Whether the latest-items homepage is what the home URL serves
    pub fn latest_homepage_active(&self) -> bool {
        self.show_on_front == FrontMode::Posts
    }

    /// Object id of the page listing latest items under a static homepage
    pub fn posts_page(&self) -> Option<i64> {
        match self.show_on_front {
            FrontMode::Page => self.page_for_posts,
            FrontMode::Posts => None,
        }
    }

    /// Whether `object_id` is the configured static front page
    pub fn is_page_on_front(&self, object_id: i64) -> bool {
        self.show_on_front == FrontMode::Page && self.page_on_front == Some(object_id)
    }
}

/// Ids are stored as strings; `0` and garbage mean unset
fn parse_object_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryStore;

    #[test]
    fn test_defaults_when_unset() {
        let settings = Settings::load(&InMemoryStore::new()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.link_rewrite_mode(), None);
        assert_eq!(settings.unmapped_policy, UnmappedPolicy::CanonicalRedirect);
    }

    #[test]
    fn test_load_settings() {
        let store = InMemoryStore::new();
        store.set_setting(setting::REWRITE_URLS, "on").unwrap();
        store.set_setting(setting::REWRITE_MODE, "selective").unwrap();
        store.set_setting(setting::UNMAPPED_HANDLING, "not_found").unwrap();
        store.set_setting(setting::SHOW_ON_FRONT, "page").unwrap();
        store.set_setting(setting::PAGE_ON_FRONT, "7").unwrap();
        store.set_setting(setting::PAGE_FOR_POSTS, "9").unwrap();

        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.link_rewrite_mode(), Some(RewriteMode::Selective));
        assert_eq!(settings.unmapped_policy, UnmappedPolicy::ThrowNotFound);
        assert_eq!(settings.posts_page(), Some(9));
        assert!(settings.is_page_on_front(7));
        assert!(!settings.latest_homepage_active());
    }

    #[test]
    fn test_garbled_values_fall_back() {
        let store = InMemoryStore::new();
        store.set_setting(setting::REWRITE_MODE, "sideways").unwrap();
        store.set_setting(setting::PAGE_ON_FRONT, "abc").unwrap();
        store.set_setting(setting::UNMAPPED_HANDLING, "").unwrap();

        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.rewrite_mode, RewriteMode::Global);
        assert_eq!(settings.page_on_front, None);
        assert_eq!(settings.unmapped_policy, UnmappedPolicy::CanonicalRedirect);
    }

    #[test]
    fn test_posts_page_needs_static_front() {
        let store = InMemoryStore::new();
        store.set_setting(setting::PAGE_FOR_POSTS, "9").unwrap();
        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.posts_page(), None);
        assert!(settings.latest_homepage_active());
    }

    #[test]
    fn test_args_validate() {
        let args = Args::parse_from([
            "hostway",
            "--base-url",
            "https://main.example",
            "resolve",
            "https://shop.example/about",
        ]);
        assert!(args.validate().is_ok());

        let args = Args::parse_from(["hostway", "resolve", "/relative"]);
        assert!(args.validate().is_err());
    }
}
