//! Per-mapping `<head>` customizations
//!
//! A mapping may carry its own head markup and favicon. Both are inserted
//! right before `</head>` inside a marked block, so applying the customizer
//! to its own output changes nothing.

const BLOCK_START: &str = "<!-- hostway:head -->";
const BLOCK_END: &str = "<!-- /hostway:head -->";

/// Elements allowed in custom head markup
pub const HEAD_TAGS: &[&str] = &["title", "base", "link", "meta", "style", "script", "noscript"];

const VOID_TAGS: &[&str] = &["base", "link", "meta"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadCustomizer {
    block: Option<String>,
}

impl HeadCustomizer {
    pub fn new(custom_markup: Option<&str>, favicon_url: Option<&str>) -> Self {
        let mut body = String::new();
        if let Some(markup) = custom_markup {
            body.push_str(sanitize_head_markup(markup).trim());
        }
        if let Some(url) = favicon_url.map(str::trim).filter(|u| !u.is_empty()) {
            if !body.is_empty() {
                body.push('\n');
            }
            body.push_str(&format!(r#"<link rel="icon" href="{}">"#, escape_attr(url)));
        }
        let block = (!body.is_empty()).then(|| format!("{}\n{}\n{}", BLOCK_START, body, BLOCK_END));
        Self { block }
    }

    pub fn is_empty(&self) -> bool {
        self.block.is_none()
    }

    /// Insert the block before the first `</head>`
    pub fn apply(&self, html: &str) -> String {
        let Some(block) = &self.block else {
            return html.to_string();
        };
        if html.contains(BLOCK_START) {
            return html.to_string();
        }
        match html.to_ascii_lowercase().find("</head") {
            Some(index) => format!("{}{}\n{}", &html[..index], block, &html[index..]),
            None => html.to_string(),
        }
    }
}

/// Keep only head-safe elements
///
/// Allowed void elements are kept as written, allowed containers are kept
/// whole with their content. Everything else, including stray text and
/// comments, is dropped.
pub fn sanitize_head_markup(markup: &str) -> String {
    let mut out = String::new();
    let mut rest = markup;

    while let Some(open) = rest.find('<') {
        let text = &rest[..open];
        if text.trim().is_empty() {
            out.push_str(text);
        }
        rest = &rest[open..];

        if rest.starts_with("<!--") {
            rest = match rest.find("-->") {
                Some(end) => &rest[end + 3..],
                None => "",
            };
            continue;
        }

        let Some(tag_end) = rest.find('>') else {
            break;
        };
        let tag = &rest[..=tag_end];
        let after = &rest[tag_end + 1..];
        let (closing, name) = tag_name(tag);

        if name.is_empty() || closing || !HEAD_TAGS.contains(&name.as_str()) {
            rest = after;
            continue;
        }

        if VOID_TAGS.contains(&name.as_str()) || tag.ends_with("/>") {
            out.push_str(tag);
            rest = after;
            continue;
        }

        let close = format!("</{}", name);
        match after.to_ascii_lowercase().find(&close) {
            Some(content_end) => {
                let tail = &after[content_end..];
                let close_end = tail.find('>').map(|i| i + 1).unwrap_or(tail.len());
                out.push_str(tag);
                out.push_str(&after[..content_end]);
                out.push_str(&tail[..close_end]);
                rest = &tail[close_end..];
            }
            None => {
                rest = "";
            }
        }
    }

    out
}

/// `(is_closing, lower-case name)` of a tag like `<meta ...>` or `</style>`
fn tag_name(tag: &str) -> (bool, String) {
    let inner = tag.trim_start_matches('<');
    let (closing, inner) = match inner.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, inner),
    };
    let name: String = inner
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    (closing, name.to_ascii_lowercase())
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_keeps_head_elements() {
        let markup = concat!(
            r#"<meta name="a" content="b"><div>drop me</div>"#,
            r#"<script>if (a<b) {}</script><style>p{}</style><iframe src="x"></iframe>"#,
        );
        let clean = sanitize_head_markup(markup);
        assert!(clean.contains(r#"<meta name="a" content="b">"#));
        assert!(clean.contains("<script>if (a<b) {}</script>"));
        assert!(clean.contains("<style>p{}</style>"));
        assert!(!clean.contains("div"));
        assert!(!clean.contains("drop me"));
        assert!(!clean.contains("iframe"));
    }

    #[test]
    fn test_sanitize_drops_unclosed_container() {
        assert_eq!(sanitize_head_markup("<title>never closed"), "");
    }

    #[test]
    fn test_apply_inserts_before_head_close() {
        let head = HeadCustomizer::new(
            Some("<meta name=\"x\">"),
            Some("https://shop.example/i.png?a=1&b=2"),
        );
        let html = "<html><HEAD><title>t</title></HEAD><body></body></html>";
        let out = head.apply(html);
        let block_at = out.find(BLOCK_START).unwrap();
        assert!(block_at < out.find("</HEAD>").unwrap());
        assert!(out.contains(r#"<link rel="icon" href="https://shop.example/i.png?a=1&amp;b=2">"#));
        assert_eq!(head.apply(&out), out);
    }

    #[test]
    fn test_empty_customizer_is_noop() {
        let head = HeadCustomizer::new(None, None);
        assert!(head.is_empty());
        assert_eq!(head.apply("<head></head>"), "<head></head>");
        assert!(HeadCustomizer::new(Some("<div>x</div>"), None).is_empty());
    }

    #[test]
    fn test_missing_head_is_untouched() {
        let head = HeadCustomizer::new(Some("<meta name=\"x\">"), None);
        assert_eq!(head.apply("<p>fragment</p>"), "<p>fragment</p>");
    }
}
