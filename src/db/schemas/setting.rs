//! Named settings read through `MappingStore::find_setting`

/// Master switch for outbound link rewriting
pub const REWRITE_URLS: &str = "rewrite_urls";
/// `global` or `selective`
pub const REWRITE_MODE: &str = "rewrite_mode";
/// `not_found` or `redirect_to_primary`; unset means redirect to canonical
pub const UNMAPPED_HANDLING: &str = "unmapped_handling";
/// `posts` (latest items homepage) or `page` (static homepage)
pub const SHOW_ON_FRONT: &str = "show_on_front";
/// Object id of the static front page
pub const PAGE_ON_FRONT: &str = "page_on_front";
/// Object id of the page listing latest items in static homepage mode
pub const PAGE_FOR_POSTS: &str = "page_for_posts";
/// Serve child pages without their parent slugs
pub const SHORT_CHILD_URLS: &str = "short_child_urls";
pub const GLOBAL_DOMAIN_MAPPING: &str = "global_domain_mapping";
pub const GLOBAL_ARCHIVE_MAPPING: &str = "global_archive_mapping";
pub const GLOBAL_PARENT_MAPPING: &str = "global_parent_mapping";
pub const GLOBAL_SHOP_MAPPING: &str = "global_shop_mapping";
/// Raise per-request decision logs to info
pub const DEBUG: &str = "debug";

/// Every key the core reads, in load order
pub const ALL: &[&str] = &[
    REWRITE_URLS,
    REWRITE_MODE,
    UNMAPPED_HANDLING,
    SHOW_ON_FRONT,
    PAGE_ON_FRONT,
    PAGE_FOR_POSTS,
    SHORT_CHILD_URLS,
    GLOBAL_DOMAIN_MAPPING,
    GLOBAL_ARCHIVE_MAPPING,
    GLOBAL_PARENT_MAPPING,
    GLOBAL_SHOP_MAPPING,
    DEBUG,
];

/// Interpret a stored flag value
///
/// Stored flags come from form posts and legacy rows, so `"1"`, `"on"`,
/// `"yes"` and `"true"` all count.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
