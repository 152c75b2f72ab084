//! Homepage strategies

use crate::db::schemas::{MappingValue, ObjectType};
use crate::paths;

use super::matching::is_matched;
use super::{ClaimContext, ClaimStrategy, ScenarioKind};

/// Claims the primary latest-items value at the repository's home path
pub struct LatestPostsHomepageStrategy;

impl ClaimStrategy for LatestPostsHomepageStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::LatestPostsHomepage
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.latest_homepage_active() {
            return None;
        }
        let home = paths::join(&[&ctx.mapping.path, &ctx.content.home_path()]);
        ctx.values
            .iter()
            .filter(|v| v.primary && v.is_posts_homepage())
            .find(|_| paths::eq(ctx.request.path(), &home))
            .cloned()
    }
}

/// Claims the static homepage's posts page
pub struct FixedHomepageStrategy;

impl ClaimStrategy for FixedHomepageStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::FixedHomepage
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        let posts_page = ctx.settings.posts_page()?;
        ctx.values
            .iter()
            .filter(|v| !v.is_term() && v.object_id == Some(posts_page))
            .find(|v| {
                ctx.content
                    .canonical_path(&ObjectType::Post, posts_page)
                    .map(|path| is_matched(ctx, v, &path))
                    .unwrap_or(false)
            })
            .cloned()
    }
}
