use crate::db::schemas::MappingValue;

use super::matching::is_matched;
use super::{ClaimContext, ClaimStrategy, ScenarioKind};

/// Claims a content-type value at the type's archive path
pub struct ArchiveStrategy;

impl ClaimStrategy for ArchiveStrategy {
    fn kind(&self) -> ScenarioKind {
        ScenarioKind::Archive
    }

    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue> {
        ctx.values
            .iter()
            .filter_map(|v| v.archive_type().map(|ct| (v, ct)))
            .find(|(value, content_type)| {
                ctx.content
                    .archive_path(content_type)
                    .map(|path| is_matched(ctx, value, &path))
                    .unwrap_or(false)
            })
            .map(|(value, _)| value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::content::InMemoryContent;
    use crate::db::schemas::Mapping;
    use crate::request::{BaseInstall, RequestContext};

    fn request(path: &str) -> RequestContext {
        let base = BaseInstall::parse("https://main.example").unwrap();
        RequestContext::from_parts("https", "a.example", path, None, base)
    }

    #[test]
    fn test_claims_archive_path() {
        let content = InMemoryContent::new().with_archive("book", "books");
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "lib");
        let values = vec![
            MappingValue::post(1, 1, 5).primary(),
            MappingValue::archive(2, 1, "book"),
            MappingValue::archive(3, 1, "film"),
        ];

        let req = request("lib/books");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(ArchiveStrategy.claim(&ctx).map(|v| v.id), Some(2));

        let req = request("lib/film");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(ArchiveStrategy.claim(&ctx), None);
    }

    #[test]
    fn test_archive_value_with_object_id_ignored() {
        let content = InMemoryContent::new().with_archive("book", "books");
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "");
        let mut value = MappingValue::archive(1, 1, "book");
        value.object_id = Some(7);
        let values = vec![value, MappingValue::post(2, 1, 1)];
        let req = request("books");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert_eq!(ArchiveStrategy.claim(&ctx), None);
    }
}
