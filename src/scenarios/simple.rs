use tracing::debug;

use crate::db::schemas::MappingValue;

use super::matching::is_matched;
use super::{ClaimContext, ClaimStrategy, ScenarioKind};

/// Default strategy: a post or term value at its canonical path
pub struct SimpleObjectStrategy;

impl ClaimStrategy for SimpleObjectStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::SimpleObject
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        for value in ctx.values.iter().filter(|v| v.is_post() || v.is_term()) {
            let Some(object_id) = value.object_id else {
                continue;
            };
            let Some(path) = ctx.content.canonical_path(&value.object_type, object_id) else {
                debug!(value = value.id, object_id, "Skipping value without canonical path");
                continue;
            };
            if is_matched(ctx, value, &path) {
                return Some(value.clone());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::content::{ContentObject, InMemoryContent, PAGE_TYPE, POST_TYPE};
    use crate::db::schemas::Mapping;
    use crate::request::{BaseInstall, RequestContext};

    fn request(path: &str) -> RequestContext {
        let base = BaseInstall::parse("https://main.example").unwrap();
        RequestContext::from_parts("https", "a.example", path, None, base)
    }

    fn content() -> InMemoryContent {
        InMemoryContent::new()
            .with(ContentObject::post(1, PAGE_TYPE, "about"))
            .with(ContentObject::post(2, POST_TYPE, "hello"))
            .with(ContentObject::term(3, "category", "news"))
    }

    #[test]
    fn test_claims_by_canonical_path() {
        let content = content();
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "");
        let values = vec![
            MappingValue::post(1, 1, 1).primary(),
            MappingValue::post(2, 1, 2),
            MappingValue::term(3, 1, 3),
        ];

        let cases = [("", Some(1)), ("hello", Some(2)), ("category/news", Some(3)), ("nope", None)];
        for (path, expected) in cases {
            let req = request(path);
            let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
            assert_eq!(SimpleObjectStrategy.claim(&ctx).map(|v| v.id), expected, "path {:?}", path);
        }
    }

    #[test]
    fn test_unresolvable_value_is_skipped() {
        let content = content();
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "");
        let values = vec![MappingValue::post(1, 1, 404), MappingValue::post(2, 1, 2)];
        let req = request("hello");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(SimpleObjectStrategy.claim(&ctx).map(|v| v.id), Some(2));
    }
}
