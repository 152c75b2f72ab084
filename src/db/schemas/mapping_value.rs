//! Mapping value schema
//!
//! One content-object binding owned by a mapping.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of object a mapping value points at
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ObjectType {
    /// A single post-like object (article, page, custom item)
    Post,
    /// A taxonomy term
    Term,
    /// The "latest items" homepage
    PostsHomepage,
    /// A content type key, used for archive bindings
    ContentType(String),
}

impl ObjectType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Post => "post",
            Self::Term => "term",
            Self::PostsHomepage => "posts_homepage",
            Self::ContentType(key) => key,
        }
    }
}

impl From<String> for ObjectType {
    fn from(value: String) -> Self {
        match value.trim() {
            "post" => Self::Post,
            "term" => Self::Term,
            "posts_homepage" => Self::PostsHomepage,
            other => Self::ContentType(other.to_string()),
        }
    }
}

impl From<&str> for ObjectType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ObjectType> for String {
    fn from(value: ObjectType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping value row
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MappingValue {
    /// Row identity (0 for values synthesized by global scenarios)
    #[serde(default)]
    pub id: i64,

    /// Owning mapping
    #[serde(default)]
    pub mapping_id: i64,

    /// Referenced object; `None` for type-level references such as archives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<i64>,

    /// Object kind
    pub object_type: ObjectType,

    /// Whether this value sits at the mapping root
    #[serde(default)]
    pub primary: bool,
}

impl MappingValue {
    pub fn post(id: i64, mapping_id: i64, object_id: i64) -> Self {
        Self {
            id,
            mapping_id,
            object_id: Some(object_id),
            object_type: ObjectType::Post,
            primary: false,
        }
    }

    pub fn term(id: i64, mapping_id: i64, object_id: i64) -> Self {
        Self {
            id,
            mapping_id,
            object_id: Some(object_id),
            object_type: ObjectType::Term,
            primary: false,
        }
    }

    pub fn archive(id: i64, mapping_id: i64, content_type: &str) -> Self {
        Self {
            id,
            mapping_id,
            object_id: None,
            object_type: ObjectType::ContentType(content_type.to_string()),
            primary: false,
        }
    }

    pub fn posts_homepage(id: i64, mapping_id: i64) -> Self {
        Self {
            id,
            mapping_id,
            object_id: None,
            object_type: ObjectType::PostsHomepage,
            primary: false,
        }
    }

    /// Builder-style primary flag
    pub fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    pub fn is_post(&self) -> bool {
        self.object_type == ObjectType::Post
    }

    pub fn is_term(&self) -> bool {
        self.object_type == ObjectType::Term
    }

    pub fn is_posts_homepage(&self) -> bool {
        self.object_type == ObjectType::PostsHomepage
    }

    /// Content type key for archive bindings
    pub fn archive_type(&self) -> Option<&str> {
        match (&self.object_type, self.object_id) {
            (ObjectType::ContentType(key), None) => Some(key),
            _ => None,
        }
    }
}

/// Order values the way the store hands them out: primary first, then by id
pub fn sort_values(values: &mut [MappingValue]) {
    values.sort_by(|a, b| b.primary.cmp(&a.primary).then(a.id.cmp(&b.id)));
}
