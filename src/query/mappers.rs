//! Mapper factory
//!
//! Turns a claim into a [`QueryMutation`]. The mapper is chosen from a
//! lookup table keyed by [`MapperKind`]:
//!
//! 1. The claiming scenario when it implies a shape (homepages, archives)
//! 2. The commerce listing page
//! 3. The shape of the claimed object, with `Custom(content_type)` used for
//!    custom content types that have a registered mapper
//!
//! No mapper means no mutation; the request then behaves as unmapped.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::content::{ContentRepository, PAGE_TYPE, POST_TYPE};
use crate::db::schemas::{Mapping, MappingValue, ObjectType};
use crate::request::RequestContext;
use crate::scenarios::ScenarioKind;

use super::{QueryFlag, QueryMutation};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapperKind {
    Post,
    Term,
    Archive,
    LatestHomepage,
    FixedHomepage,
    Commerce,
    /// Registered for a custom content type
    Custom(String),
}

/// What a mapper gets to look at
#[derive(Clone, Copy)]
pub struct MapperInput<'a> {
    pub scenario: &'a ScenarioKind,
    pub value: &'a MappingValue,
    pub mapping: &'a Mapping,
    pub request: &'a RequestContext,
    pub content: &'a dyn ContentRepository,
}

pub trait QueryMapper: Send + Sync {
    /// Build the override, `None` when the claimed object cannot be found
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation>;
}

pub struct MapperFactory {
    mappers: HashMap<MapperKind, Box<dyn QueryMapper>>,
}

impl Default for MapperFactory {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl MapperFactory {
    pub fn empty() -> Self {
        Self {
            mappers: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut factory = Self::empty();
        factory.register(MapperKind::Post, PostMapper);
        factory.register(MapperKind::Term, TermMapper);
        factory.register(MapperKind::Archive, ArchiveMapper);
        factory.register(MapperKind::LatestHomepage, LatestHomepageMapper);
        factory.register(MapperKind::FixedHomepage, FixedHomepageMapper);
        factory.register(MapperKind::Commerce, CommerceMapper);
        factory
    }

    /// Register or replace the mapper for a kind
    pub fn register(&mut self, kind: MapperKind, mapper: impl QueryMapper + 'static) {
        self.mappers.insert(kind, Box::new(mapper));
    }

    pub fn unregister(&mut self, kind: &MapperKind) -> bool {
        self.mappers.remove(kind).is_some()
    }

    pub fn is_registered(&self, kind: &MapperKind) -> bool {
        self.mappers.contains_key(kind)
    }

    /// Which mapper applies to a claim
    pub fn kind_for(&self, input: &MapperInput<'_>) -> Option<MapperKind> {
        match input.scenario {
            ScenarioKind::FixedHomepage => return Some(MapperKind::FixedHomepage),
            ScenarioKind::LatestPostsHomepage => return Some(MapperKind::LatestHomepage),
            ScenarioKind::Archive => return Some(MapperKind::Archive),
            _ => {}
        }

        let value = input.value;
        if value.is_post()
            && value.object_id.is_some()
            && value.object_id == input.content.commerce_listing_id()
        {
            return Some(MapperKind::Commerce);
        }

        match &value.object_type {
            ObjectType::Post => {
                let object = input.content.post(value.object_id?)?;
                match object.content_type.as_str() {
                    POST_TYPE | PAGE_TYPE => Some(MapperKind::Post),
                    custom => Some(self.custom_or(custom, MapperKind::Post)),
                }
            }
            ObjectType::Term => Some(MapperKind::Term),
            ObjectType::PostsHomepage => Some(MapperKind::LatestHomepage),
            ObjectType::ContentType(content_type) => {
                Some(self.custom_or(content_type, MapperKind::Archive))
            }
        }
    }

    fn custom_or(&self, content_type: &str, fallback: MapperKind) -> MapperKind {
        let custom = MapperKind::Custom(content_type.to_string());
        if self.is_registered(&custom) {
            custom
        } else {
            fallback
        }
    }

    /// Build the override for a claim
    pub fn build_override(&self, input: &MapperInput<'_>) -> Option<(MapperKind, QueryMutation)> {
        let Some(kind) = self.kind_for(input) else {
            debug!(value = input.value.id, scenario = %input.scenario, "No mapper kind for claim");
            return None;
        };
        let Some(mapper) = self.mappers.get(&kind) else {
            debug!(?kind, "No mapper registered");
            return None;
        };
        match mapper.build(input) {
            Some(mutation) => Some((kind, mutation)),
            None => {
                debug!(?kind, value = input.value.id, "Mapper could not load claimed object");
                None
            }
        }
    }
}

// =============================================================================
// Built-in mappers
// =============================================================================

const SINGULAR_FLAGS: &[QueryFlag] = &[QueryFlag::Singular, QueryFlag::Single, QueryFlag::Page];

fn with_paged(mutation: QueryMutation, request: &RequestContext) -> QueryMutation {
    match request.pagination() {
        Some(page) => mutation.set_var("paged", page.to_string()),
        None => mutation,
    }
}

/// Single post or page
pub struct PostMapper;

impl QueryMapper for PostMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let id = input.value.object_id?;
        let object = input.content.post(id)?;
        let is_page = object.content_type == PAGE_TYPE;

        let mutation = QueryMutation::new()
            .flag(QueryFlag::Singular, true)
            .flag(QueryFlag::Single, !is_page)
            .flag(QueryFlag::Page, is_page)
            .clear(&[
                QueryFlag::NotFound,
                QueryFlag::Archive,
                QueryFlag::PostTypeArchive,
                QueryFlag::Tax,
                QueryFlag::Home,
                QueryFlag::PostsPage,
                QueryFlag::Attachment,
            ])
            .unset(&["error", "attachment", "pagename", "name", "page_id", "p"])
            .set_var("post_type", object.content_type.clone());

        let mutation = if is_page {
            mutation
                .set_var("page_id", id.to_string())
                .set_var("pagename", object.slug.clone())
        } else {
            mutation
                .set_var("p", id.to_string())
                .set_var("name", object.slug.clone())
        };

        Some(match input.request.pagination() {
            Some(page) => mutation.set_var("page", page.to_string()),
            None => mutation,
        })
    }
}

/// Taxonomy term listing
pub struct TermMapper;

impl QueryMapper for TermMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let id = input.value.object_id?;
        let term = input.content.term(id)?;
        let mutation = QueryMutation::new()
            .flag(QueryFlag::Archive, true)
            .flag(QueryFlag::Tax, true)
            .clear(SINGULAR_FLAGS)
            .clear(&[
                QueryFlag::NotFound,
                QueryFlag::Home,
                QueryFlag::PostsPage,
                QueryFlag::Attachment,
                QueryFlag::PostTypeArchive,
            ])
            .unset(&["error", "attachment", "pagename", "name", "page_id", "p"])
            .set_var("taxonomy", term.content_type.clone())
            .set_var("term", term.slug.clone())
            .set_var("term_id", id.to_string());
        Some(with_paged(mutation, input.request))
    }
}

/// Content type archive
pub struct ArchiveMapper;

impl QueryMapper for ArchiveMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let content_type = input
            .value
            .archive_type()
            .unwrap_or_else(|| input.value.object_type.as_str());
        let mutation = QueryMutation::new()
            .set_var("post_type", content_type)
            .set_request_var("post_type", content_type)
            .flag(QueryFlag::Archive, true)
            .flag(QueryFlag::PostTypeArchive, true)
            .clear(SINGULAR_FLAGS)
            .clear(&[QueryFlag::NotFound, QueryFlag::Home, QueryFlag::Attachment])
            .unset(&["pagename", "page_id", "error", "name", "attachment"]);
        Some(with_paged(mutation, input.request))
    }
}

/// Latest items listing at the home URL
pub struct LatestHomepageMapper;

impl QueryMapper for LatestHomepageMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let mutation = QueryMutation::new()
            .flag(QueryFlag::Home, true)
            .clear(&[QueryFlag::Singular, QueryFlag::NotFound])
            .unset(&["error", "pagename"]);
        Some(with_paged(mutation, input.request))
    }
}

/// The posts page of a static homepage, served as home
pub struct FixedHomepageMapper;

impl QueryMapper for FixedHomepageMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let id = input.value.object_id?;
        let object = input.content.post(id)?;
        let mutation = QueryMutation::new()
            .flag(QueryFlag::Singular, true)
            .flag(QueryFlag::Home, true)
            .flag(QueryFlag::PostsPage, true)
            .clear(&[QueryFlag::NotFound, QueryFlag::Archive])
            .unset(&["error", "page"])
            .set_request_var("pagename", object.slug.clone())
            .set_var("page_id", id.to_string());
        // The literal `page` field is renamed to `paged`
        Some(with_paged(mutation, input.request))
    }
}

/// Commerce listing page, served as the item archive
pub struct CommerceMapper;

impl QueryMapper for CommerceMapper {
    fn build(&self, input: &MapperInput<'_>) -> Option<QueryMutation> {
        let paged = input.request.pagination().unwrap_or(1);
        let mut mutation = QueryMutation::new()
            .unset(&["attachment", "page", "name", "attachment_id"])
            .set_var("post_type", input.content.commerce_item_type())
            .set_var("page_id", "")
            .clear(&[
                QueryFlag::Attachment,
                QueryFlag::Singular,
                QueryFlag::Home,
                QueryFlag::Single,
                QueryFlag::Page,
                QueryFlag::NotFound,
            ])
            .flag(QueryFlag::PostTypeArchive, true)
            .flag(QueryFlag::Archive, true)
            .flag(QueryFlag::CommerceListing, true)
            .set_var("error", "")
            .set_var("paged", paged.to_string());

        // Literal URL fragments must not leak into the listing
        if input.value.primary || input.mapping.has_path() {
            for name in ["attachment", "name", "page", "pagename", "category_name"] {
                mutation = mutation.set_var(name, "");
            }
            mutation = mutation.clear_request_vars();
        }
        Some(mutation)
    }
}
