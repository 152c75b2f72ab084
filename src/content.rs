//! Content repository contract
//!
//! The core never renders content. It only needs to know where the content
//! repository would natively address an object, so it can compare that
//! address against the path a visitor requested on a mapped host.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::db::schemas::ObjectType;
use crate::paths;

/// Content type of hierarchical pages
pub const PAGE_TYPE: &str = "page";
/// Content type of plain articles
pub const POST_TYPE: &str = "post";
/// Default content type of commerce items
pub const COMMERCE_ITEM_TYPE: &str = "product";

/// Shape of a content object
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ObjectShape {
    #[default]
    Post,
    Term,
}

/// A content object as the repository knows it
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ContentObject {
    pub id: i64,

    #[serde(default)]
    pub shape: ObjectShape,

    /// `page`, `post`, a custom type key, or the taxonomy of a term
    pub content_type: String,

    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,

    /// Explicit canonical path, overriding the computed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ContentObject {
    pub fn post(id: i64, content_type: &str, slug: &str) -> Self {
        Self {
            id,
            shape: ObjectShape::Post,
            content_type: content_type.to_string(),
            slug: slug.to_string(),
            parent: None,
            path: None,
        }
    }

    pub fn term(id: i64, taxonomy: &str, slug: &str) -> Self {
        Self {
            id,
            shape: ObjectShape::Term,
            content_type: taxonomy.to_string(),
            slug: slug.to_string(),
            parent: None,
            path: None,
        }
    }

    pub fn with_parent(mut self, parent: i64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(paths::normalize(path));
        self
    }

    /// Whether this is a page nested under another page
    pub fn is_hierarchical_child(&self) -> bool {
        self.shape == ObjectShape::Post && self.content_type == PAGE_TYPE && self.parent.is_some()
    }
}

/// Result of resolving a path to an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRef {
    pub object_type: ObjectType,
    pub object_id: i64,
    pub content_type: String,
}

/// Read access to the content repository
pub trait ContentRepository: Send + Sync {
    /// Canonical path (no leading/trailing slash) of a post or term
    ///
    /// `None` when the object does not exist or the type has no addressing;
    /// scenario strategies treat that as "does not match".
    fn canonical_path(&self, object_type: &ObjectType, object_id: i64) -> Option<String>;

    /// Archive path of a content type, `None` if the type has no archive
    fn archive_path(&self, content_type: &str) -> Option<String>;

    fn post(&self, object_id: i64) -> Option<ContentObject>;

    fn term(&self, object_id: i64) -> Option<ContentObject>;

    /// Object natively addressed at `path`
    fn lookup_path(&self, path: &str) -> Option<ContentRef>;

    /// Path of the repository's home URL
    fn home_path(&self) -> String {
        String::new()
    }

    /// Object id of the commerce listing page, if a shop is installed
    fn commerce_listing_id(&self) -> Option<i64> {
        None
    }

    fn commerce_item_type(&self) -> &str {
        COMMERCE_ITEM_TYPE
    }

    /// Public URL of a stored asset (favicons)
    fn asset_url(&self, _asset_id: i64) -> Option<String> {
        None
    }

    fn has_archive(&self, content_type: &str) -> bool {
        self.archive_path(content_type).is_some()
    }

    /// Ancestor ids of a post, nearest parent first
    fn ancestors(&self, object_id: i64) -> Vec<i64> {
        let mut chain = Vec::new();
        let mut current = self.post(object_id).and_then(|p| p.parent);
        while let Some(id) = current {
            if chain.contains(&id) || id == object_id {
                break;
            }
            chain.push(id);
            current = self.post(id).and_then(|p| p.parent);
        }
        chain
    }
}

/// In-memory content repository used by the CLI fixtures and tests
#[derive(Debug, Clone, Default)]
pub struct InMemoryContent {
    posts: BTreeMap<i64, ContentObject>,
    terms: BTreeMap<i64, ContentObject>,
    archives: BTreeMap<String, String>,
    assets: BTreeMap<i64, String>,
    home_path: String,
    commerce_listing_id: Option<i64>,
}

impl InMemoryContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, object: ContentObject) {
        match object.shape {
            ObjectShape::Post => self.posts.insert(object.id, object),
            ObjectShape::Term => self.terms.insert(object.id, object),
        };
    }

    pub fn with(mut self, object: ContentObject) -> Self {
        self.insert(object);
        self
    }

    pub fn with_archive(mut self, content_type: &str, path: &str) -> Self {
        self.archives
            .insert(content_type.to_string(), paths::normalize(path));
        self
    }

    pub fn with_asset(mut self, asset_id: i64, url: &str) -> Self {
        self.assets.insert(asset_id, url.to_string());
        self
    }

    pub fn with_home_path(mut self, path: &str) -> Self {
        self.home_path = paths::normalize(path);
        self
    }

    pub fn with_commerce_listing(mut self, object_id: i64) -> Self {
        self.commerce_listing_id = Some(object_id);
        self
    }

    fn post_path(&self, object: &ContentObject) -> String {
        if let Some(path) = &object.path {
            return path.clone();
        }
        match object.content_type.as_str() {
            POST_TYPE => object.slug.clone(),
            PAGE_TYPE => {
                let mut segments: Vec<String> = self
                    .ancestors(object.id)
                    .into_iter()
                    .rev()
                    .filter_map(|id| self.posts.get(&id).map(|p| p.slug.clone()))
                    .collect();
                segments.push(object.slug.clone());
                segments.join("/")
            }
            other => {
                let base = self
                    .archives
                    .get(other)
                    .cloned()
                    .unwrap_or_else(|| other.to_string());
                paths::join(&[&base, &object.slug])
            }
        }
    }

    fn term_path(&self, object: &ContentObject) -> String {
        object
            .path
            .clone()
            .unwrap_or_else(|| paths::join(&[&object.content_type, &object.slug]))
    }
}

impl ContentRepository for InMemoryContent {
    fn canonical_path(&self, object_type: &ObjectType, object_id: i64) -> Option<String> {
        match object_type {
            ObjectType::Post => self.posts.get(&object_id).map(|p| self.post_path(p)),
            ObjectType::Term => self.terms.get(&object_id).map(|t| self.term_path(t)),
            ObjectType::PostsHomepage => Some(self.home_path.clone()),
            ObjectType::ContentType(_) => None,
        }
    }

    fn archive_path(&self, content_type: &str) -> Option<String> {
        self.archives.get(content_type).cloned()
    }

    fn post(&self, object_id: i64) -> Option<ContentObject> {
        self.posts.get(&object_id).cloned()
    }

    fn term(&self, object_id: i64) -> Option<ContentObject> {
        self.terms.get(&object_id).cloned()
    }

    fn lookup_path(&self, path: &str) -> Option<ContentRef> {
        let wanted = paths::normalize(path);
        if wanted.is_empty() {
            return None;
        }
        if let Some(post) = self
            .posts
            .values()
            .find(|p| paths::eq(&self.post_path(p), &wanted))
        {
            return Some(ContentRef {
                object_type: ObjectType::Post,
                object_id: post.id,
                content_type: post.content_type.clone(),
            });
        }
        self.terms
            .values()
            .find(|t| paths::eq(&self.term_path(t), &wanted))
            .map(|term| ContentRef {
                object_type: ObjectType::Term,
                object_id: term.id,
                content_type: term.content_type.clone(),
            })
    }

    fn home_path(&self) -> String {
        self.home_path.clone()
    }

    fn commerce_listing_id(&self) -> Option<i64> {
        self.commerce_listing_id
    }

    fn asset_url(&self, asset_id: i64) -> Option<String> {
        self.assets.get(&asset_id).cloned()
    }
}
