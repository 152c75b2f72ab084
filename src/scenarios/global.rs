//! Domain-wide fallback strategies
//!
//! Each resolves the request path relative to the mapping path through the
//! content repository and claims the object found there when it falls under
//! something the mapping already binds. The claimed value is synthesized:
//! it has no row id and is never primary.

use crate::content::ContentRef;
use crate::db::schemas::{MappingValue, ObjectType};
use crate::paths;

use super::{ClaimContext, ClaimStrategy, ScenarioKind};

/// Object addressed by the request path below the mapping path
fn object_below_mapping(ctx: &ClaimContext<'_>) -> Option<ContentRef> {
    let relative = paths::strip_segment_prefix(ctx.request.path(), &ctx.mapping.path)?;
    if relative.is_empty() {
        return None;
    }
    ctx.content.lookup_path(relative)
}

fn synthesize(ctx: &ClaimContext<'_>, found: &ContentRef) -> MappingValue {
    MappingValue {
        id: 0,
        mapping_id: ctx.mapping.id,
        object_id: Some(found.object_id),
        object_type: found.object_type.clone(),
        primary: false,
    }
}

fn mapped_post_ids<'a>(ctx: &ClaimContext<'a>) -> impl Iterator<Item = i64> + 'a {
    ctx.values
        .iter()
        .filter(|v| v.is_post())
        .filter_map(|v| v.object_id)
}

/// Items of a content type whose archive is mapped
pub struct GlobalArchiveStrategy;

impl ClaimStrategy for GlobalArchiveStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::GlobalArchive
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.global_archive_mapping {
            return None;
        }
        let found = object_below_mapping(ctx)?;
        if found.object_type != ObjectType::Post {
            return None;
        }
        ctx.values
            .iter()
            .any(|v| v.archive_type() == Some(found.content_type.as_str()))
            .then(|| synthesize(ctx, &found))
    }
}

/// Descendants of a mapped page
pub struct GlobalParentStrategy;

impl ClaimStrategy for GlobalParentStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::GlobalParent
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.global_parent_mapping {
            return None;
        }
        let found = object_below_mapping(ctx)?;
        if found.object_type != ObjectType::Post {
            return None;
        }
        let ancestors = ctx.content.ancestors(found.object_id);
        mapped_post_ids(ctx)
            .any(|id| ancestors.contains(&id))
            .then(|| synthesize(ctx, &found))
    }
}

/// Commerce items when the commerce listing page is mapped
pub struct GlobalShopStrategy;

impl ClaimStrategy for GlobalShopStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::GlobalShop
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.global_shop_mapping {
            return None;
        }
        let listing = ctx.content.commerce_listing_id()?;
        if !mapped_post_ids(ctx).any(|id| id == listing) {
            return None;
        }
        let found = object_below_mapping(ctx)?;
        (found.object_type == ObjectType::Post
            && found.content_type == ctx.content.commerce_item_type())
        .then(|| synthesize(ctx, &found))
    }
}

/// Anything the repository serves, under any mapping of the host
pub struct GlobalDomainStrategy;

impl ClaimStrategy for GlobalDomainStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::GlobalDomain
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.global_domain_mapping {
            return None;
        }
        object_below_mapping(ctx).map(|found| synthesize(ctx, &found))
    }
}
