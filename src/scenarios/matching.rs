//! Shared path-match rule for object strategies

use crate::db::schemas::MappingValue;
use crate::paths;

use super::ClaimContext;

/// How a value matched the request path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    /// Request is at the mapping root and the value is primary
    Root,
    /// Request equals `mapping.path/<object path>`
    Composed,
}

/// Whether a value counts as primary for matching
///
/// A mapping with a single value treats it as primary even without the flag.
pub fn is_effectively_primary(ctx: &ClaimContext<'_>, value: &MappingValue) -> bool {
    value.primary || ctx.values.len() == 1
}

/// Compare the request path against a value's object path under the mapping
pub fn match_path(
    ctx: &ClaimContext<'_>,
    value: &MappingValue,
    object_path: &str,
) -> Option<PathMatch> {
    let request_path = ctx.request.path();
    let primary = is_effectively_primary(ctx, value);

    if primary && paths::eq(request_path, &ctx.mapping.path) {
        return Some(PathMatch::Root);
    }

    // A non-primary binding of the static front page never matches
    if !primary && !value.is_term() {
        if let Some(id) = value.object_id {
            if ctx.settings.is_page_on_front(id) {
                return None;
            }
        }
    }

    let composed = paths::join(&[&ctx.mapping.path, object_path]);
    if !composed.is_empty()
        && request_path.len() == composed.len()
        && paths::starts_with_segment(request_path, &composed)
    {
        return Some(PathMatch::Composed);
    }

    None
}

/// Path match with short-child deferral applied
pub fn is_matched(ctx: &ClaimContext<'_>, value: &MappingValue, object_path: &str) -> bool {
    match match_path(ctx, value, object_path) {
        Some(PathMatch::Root) => true,
        Some(PathMatch::Composed) => !defers_to_short_child(ctx, value),
        None => false,
    }
}

/// Hierarchical children are left to the short child strategy when it runs
fn defers_to_short_child(ctx: &ClaimContext<'_>, value: &MappingValue) -> bool {
    if !ctx.defer_short_children || !value.is_post() {
        return false;
    }
    value
        .object_id
        .and_then(|id| ctx.content.post(id))
        .map(|object| object.is_hierarchical_child())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FrontMode, Settings};
    use crate::content::{ContentObject, InMemoryContent, PAGE_TYPE};
    use crate::db::schemas::Mapping;
    use crate::request::{BaseInstall, RequestContext};

    fn request(path: &str) -> RequestContext {
        let base = BaseInstall::parse("https://main.example").unwrap();
        RequestContext::from_parts("https", "a.example", path, None, base)
    }

    fn content() -> InMemoryContent {
        InMemoryContent::new()
            .with(ContentObject::post(1, PAGE_TYPE, "about"))
            .with(ContentObject::post(2, PAGE_TYPE, "team").with_parent(1))
    }

    #[test]
    fn test_primary_without_flag() {
        let content = content();
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "corp");
        let req = request("corp");

        let flagged = vec![MappingValue::post(1, 1, 1).primary()];
        let unflagged = vec![MappingValue::post(1, 1, 1)];

        let a = ClaimContext::new(&req, &mapping, &flagged, &settings, &content);
        let b = ClaimContext::new(&req, &mapping, &unflagged, &settings, &content);
        assert_eq!(match_path(&a, &flagged[0], "about"), Some(PathMatch::Root));
        assert_eq!(match_path(&b, &unflagged[0], "about"), Some(PathMatch::Root));
    }

    #[test]
    fn test_composed_path_case_insensitive() {
        let content = content();
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "corp");
        let values = vec![MappingValue::post(1, 1, 1).primary(), MappingValue::post(2, 1, 2)];
        let req = request("Corp/About/Team");
        let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);

        assert!(is_matched(&ctx, &values[1], "about/team"));
        assert!(!is_matched(&ctx, &values[1], "about"));
    }

    #[test]
    fn test_front_page_exclusion() {
        let content = content();
        let settings = Settings {
            show_on_front: FrontMode::Page,
            page_on_front: Some(1),
            ..Settings::default()
        };
        let mapping = Mapping::new(1, "a.example", "");
        let values = vec![MappingValue::post(1, 1, 2).primary(), MappingValue::post(2, 1, 1)];
        for path in ["", "about", "anything"] {
            let req = request(path);
            let ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
            assert!(!is_matched(&ctx, &values[1], "about"), "matched at {:?}", path);
        }
    }

    #[test]
    fn test_short_child_deferral() {
        let content = content();
        let settings = Settings::default();
        let mapping = Mapping::new(1, "a.example", "");
        let values = vec![MappingValue::post(1, 1, 1).primary(), MappingValue::post(2, 1, 2)];
        let req = request("about/team");

        let mut ctx = ClaimContext::new(&req, &mapping, &values, &settings, &content);
        assert!(is_matched(&ctx, &values[1], "about/team"));

        ctx.defer_short_children = true;
        assert!(!is_matched(&ctx, &values[1], "about/team"));
        assert_eq!(match_path(&ctx, &values[1], "about/team"), Some(PathMatch::Composed));
    }
}
