use crate::db::schemas::MappingValue;
use crate::paths;

use super::matching::match_path;
use super::{ClaimContext, ClaimStrategy, ScenarioKind};

/// Serves child pages at `mapping.path/<slug>`, parent slugs dropped
///
/// The full hierarchical path keeps working for children deferred by the
/// simple object strategy.
pub struct ShortChildPageStrategy;

impl ClaimStrategy for ShortChildPageStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::ShortChildPage
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        if !ctx.settings.short_child_urls {
            return None;
        }
        ctx.values
            .iter()
            .filter(|v| v.is_post())
            .find(|value| {
                value
                    .object_id
                    .and_then(|id| ctx.content.post(id))
                    .filter(|object| object.is_hierarchical_child())
                    .map(|object| {
                        let short = paths::normalize(&object.slug);
                        match_path(ctx, value, &short).is_some()
                            || ctx
                                .content
                                .canonical_path(&value.object_type, object.id)
                                .map(|full| match_path(ctx, value, &full).is_some())
                                .unwrap_or(false)
                    })
                    .unwrap_or(false)
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::content::{ContentObject, InMemoryContent, PAGE_TYPE};
    use crate::db::schemas::Mapping;
    use crate::request::{BaseInstall, RequestContext};

    fn request(path: &str) -> RequestContext {
        let base = BaseInstall::parse("https://main.example").unwrap();
        RequestContext::from_parts("https", "a.example", path, None, base)
    }

    #[test]
    fn test_claims_child_by_slug() {
        let content = InMemoryContent::new()
            .with(ContentObject::post(1, PAGE_TYPE, "about"))
            .with(ContentObject::post(2, PAGE_TYPE, "team").with_parent(1));
        let settings = Settings {
            short_child_urls: true,
            ..Settings::default()
        };
        let mapping = Mapping::new(1, "a.example", "");
        let values = vec![MappingValue::post(1, 1, 1).primary(), MappingValue::post(2, 1, 2)];

        let req = request("team");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(ShortChildPageStrategy.claim(&ctx).map(|v| v.id), Some(2));

        let req = request("about/team");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(ShortChildPageStrategy.claim(&ctx).map(|v| v.id), Some(2));

        let off = Settings::default();
        let ctx = ClaimContext::new(&req, &mapping, &values, &off, &content);
        assert_eq!(ShortChildPageStrategy.claim(&ctx), None);
    }
}
