//! Path helpers shared by the resolver, the scenario chain and the rewriter
//!
//! All stored and requested paths are kept without leading or trailing
//! slashes. Comparisons are ASCII case-insensitive.

/// Strip leading and trailing slashes
pub fn normalize(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

/// Join path pieces with single slashes, dropping empty pieces
pub fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Case-insensitive equality
pub fn eq(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Segment-aligned, case-insensitive prefix test
///
/// `prefix` must be non-empty and must end on a `/` boundary of `path` or at
/// its end: `blog` is a prefix of `blog/tech` but not of `blogger`.
pub fn starts_with_segment(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() || path.is_empty() || path.len() < prefix.len() {
        return false;
    }
    if !path.is_char_boundary(prefix.len()) {
        return false;
    }
    let (head, rest) = path.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix) && (rest.is_empty() || rest.starts_with('/'))
}

/// Remove a segment-aligned prefix, returning the remainder without slashes
///
/// Returns `None` when `prefix` is not a segment prefix of `path`. An empty
/// prefix always strips to the whole path.
pub fn strip_segment_prefix<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    if starts_with_segment(path, prefix) {
        Some(path[prefix.len()..].trim_start_matches('/'))
    } else {
        None
    }
}

/// Collapse runs of `/` into one
pub fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !prev_slash {
                out.push(c);
            }
            prev_slash = true;
        } else {
            out.push(c);
            prev_slash = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("/blog/tech/"), "blog/tech");
        assert_eq!(normalize("///"), "");
        assert_eq!(normalize("About"), "About");
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&["blog", "/post-1/"]), "blog/post-1");
        assert_eq!(join(&["", "post-1"]), "post-1");
        assert_eq!(join(&["", ""]), "");
    }

    #[test]
    fn test_segment_prefix() {
        assert!(starts_with_segment("blog/tech/post-1", "blog/tech"));
        assert!(starts_with_segment("Blog/Tech", "blog/tech"));
        assert!(starts_with_segment("blog", "blog"));
        assert!(!starts_with_segment("blogger", "blog"));
        assert!(!starts_with_segment("blog", ""));
        assert!(!starts_with_segment("", "blog"));
    }

    #[test]
    fn test_strip_segment_prefix() {
        assert_eq!(strip_segment_prefix("blog/post-1", "blog"), Some("post-1"));
        assert_eq!(strip_segment_prefix("blog", "blog"), Some(""));
        assert_eq!(strip_segment_prefix("post-1", ""), Some("post-1"));
        assert_eq!(strip_segment_prefix("blogger", "blog"), None);
    }

    #[test]
    fn test_collapse_slashes() {
        assert_eq!(collapse_slashes("//a///b/"), "/a/b/");
    }
}
