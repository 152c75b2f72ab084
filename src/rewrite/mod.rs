//! URL Rewrite Engine
//!
//! Keeps visitors on the mapped host. Every transform here is a pure
//! `&str -> String` function and idempotent: output that points at the
//! mapped host is never touched again.
//!
//! ## Link modes
//!
//! - **Global**: any link to the base host moves to the request's host.
//! - **Selective**: only links inside an object bound by the current
//!   mapping move, to `mapped_host/mapped_path/...`. Selective output wins
//!   whenever both could apply.
//!
//! Asset URLs (scripts, styles, images, endpoints) are host-substituted
//! regardless of mode. For a subdirectory install the base sub-path is
//! stripped on substitution.

pub mod head;

use regex::{Captures, Regex};
use url::Url;

use crate::config::RewriteMode;
use crate::paths;
use crate::request::BaseInstall;
use crate::types::Result;

pub use head::{sanitize_head_markup, HeadCustomizer};

/// The only administrative endpoint mapped pages call
pub const AJAX_ENDPOINT: &str = "admin-ajax.php";

const ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "mjs", "map", "json", "xml", "txt", "png", "jpg", "jpeg", "gif", "svg", "webp",
    "avif", "ico", "bmp", "woff", "woff2", "ttf", "otf", "eot", "mp3", "mp4", "webm", "ogg", "wav",
    "pdf", "zip",
];

const ASSET_DIRECTORIES: &[&str] = &["assets", "static", "uploads", "media", "files"];

/// An object boundary inside the current mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteTarget {
    /// Object path on the base install
    pub canonical_path: String,
    /// Primary objects live at the mapping root
    pub primary: bool,
}

#[derive(Debug, Clone)]
pub struct RewriteContext {
    pub base: BaseInstall,
    /// Host the visitor requested
    pub request_host: String,
    pub mapped_host: String,
    pub mapped_path: String,
    /// Link rewriting mode, `None` when link rewriting is off
    pub mode: Option<RewriteMode>,
    pub targets: Vec<RewriteTarget>,
}

pub struct UrlRewriter {
    ctx: RewriteContext,
    absolute_url: Regex,
    href: Regex,
    head: Regex,
}

impl UrlRewriter {
    pub fn new(ctx: RewriteContext) -> Result<Self> {
        Ok(Self {
            ctx,
            absolute_url: Regex::new(r#"(?i)\bhttps?://[^\s"'<>()\\]+"#)?,
            href: Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            head: Regex::new(r"(?is)(<head\b[^>]*>)(.*?)(</head\s*>)")?,
        })
    }

    pub fn context(&self) -> &RewriteContext {
        &self.ctx
    }

    fn links_enabled(&self) -> bool {
        self.ctx.mode.is_some() && !self.ctx.mapped_host.eq_ignore_ascii_case(&self.ctx.base.host)
    }

    // =========================================================================
    // Single URLs
    // =========================================================================

    /// Rewrite a link to a document
    pub fn rewrite_link(&self, link: &str) -> String {
        if Url::parse(link).is_err() {
            return link.to_string();
        }
        self.link(link).unwrap_or_else(|| link.to_string())
    }

    /// Rewrite a script, style, image, directory or endpoint URL
    pub fn rewrite_asset_url(&self, url: &str) -> String {
        if Url::parse(url).is_err() {
            return url.to_string();
        }
        self.substitute_host(url).unwrap_or_else(|| url.to_string())
    }

    /// Administrative URLs stay canonical except the AJAX endpoint
    pub fn rewrite_admin_url(&self, url: &str, endpoint: &str) -> String {
        if paths::normalize(endpoint) == AJAX_ENDPOINT {
            self.rewrite_asset_url(url)
        } else {
            url.to_string()
        }
    }

    /// Rewrite every candidate of an image `srcset`
    pub fn rewrite_srcset(&self, srcset: &str) -> String {
        srcset
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| match entry.split_once(char::is_whitespace) {
                Some((url, descriptor)) => {
                    format!("{} {}", self.rewrite_asset_url(url), descriptor.trim())
                }
                None => self.rewrite_asset_url(entry),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Rewrite DNS-prefetch hints that name the base host
    pub fn rewrite_hints(&self, hints: &[String]) -> Vec<String> {
        hints
            .iter()
            .map(|hint| {
                let (prefix, rest) = split_scheme(hint);
                let host_end = rest.find('/').unwrap_or(rest.len());
                let (host, tail) = rest.split_at(host_end);
                if host.eq_ignore_ascii_case(&self.ctx.base.host) {
                    format!("{}{}{}", prefix, self.ctx.request_host, tail)
                } else {
                    hint.clone()
                }
            })
            .collect()
    }

    // =========================================================================
    // Markup
    // =========================================================================

    /// Rewrite hrefs and absolute URLs in rendered content
    pub fn rewrite_markup(&self, html: &str) -> String {
        let html = if self.links_enabled() {
            self.normalize_relative_hrefs(html)
        } else {
            html.to_string()
        };
        self.absolute_url
            .replace_all(&html, |caps: &Captures| {
                let found = &caps[0];
                let is_asset = self
                    .split_base(found)
                    .map(|base| is_asset_path(base.path))
                    .unwrap_or(false);
                let rewritten = if is_asset {
                    self.substitute_host(found)
                } else {
                    self.link(found)
                };
                rewritten.unwrap_or_else(|| found.to_string())
            })
            .into_owned()
    }

    /// Host-substitute every URL inside `<head>`
    pub fn rewrite_head_section(&self, html: &str) -> String {
        self.head
            .replace(html, |caps: &Captures| {
                let inner = self.absolute_url.replace_all(&caps[2], |url: &Captures| {
                    self.substitute_host(&url[0])
                        .unwrap_or_else(|| url[0].to_string())
                });
                format!("{}{}{}", &caps[1], inner, &caps[3])
            })
            .into_owned()
    }

    fn normalize_relative_hrefs(&self, html: &str) -> String {
        self.href
            .replace_all(html, |caps: &Captures| {
                let (value, quote) = match (caps.get(1), caps.get(2)) {
                    (Some(v), _) => (v.as_str(), '"'),
                    (None, Some(v)) => (v.as_str(), '\''),
                    (None, None) => return caps[0].to_string(),
                };
                match normalize_relative_href(value) {
                    Some(href) => format!("href={q}{}{q}", href, q = quote),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Selective first, then global, `None` when the link stays as is
    fn link(&self, raw: &str) -> Option<String> {
        if !self.links_enabled() {
            return None;
        }
        match self.ctx.mode {
            Some(RewriteMode::Global) => {
                self.selective(raw).or_else(|| self.substitute_host(raw))
            }
            _ => self.selective(raw),
        }
    }

    /// Split a base-host URL on its original text, `None` for other hosts
    ///
    /// The host must end at a boundary so `example.com` never matches
    /// `example.com.au`. Nothing is decoded or re-encoded.
    fn split_base<'u>(&self, raw: &'u str) -> Option<BaseRef<'u>> {
        let (prefix, rest) = split_scheme(raw);
        let scheme = prefix.strip_suffix("://").filter(|s| !s.is_empty())?;
        let host = self.ctx.base.host.as_str();
        if !rest.get(..host.len())?.eq_ignore_ascii_case(host) {
            return None;
        }

        let mut tail = &rest[host.len()..];
        let continues_host =
            |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '@');
        if tail.starts_with(continues_host) {
            return None;
        }
        if let Some(port) = tail.strip_prefix(':') {
            let digits = port.find(|c: char| !c.is_ascii_digit()).unwrap_or(port.len());
            tail = &port[digits..];
        }

        let Some(after) = tail.strip_prefix('/') else {
            return Some(BaseRef {
                scheme,
                path: "",
                rooted: false,
                in_install: !self.ctx.base.is_subdirectory_install(),
                suffix: tail,
            });
        };
        let end = after.find(|c: char| c == '?' || c == '#').unwrap_or(after.len());
        let (path, suffix) = after.split_at(end);
        let (path, in_install) = match paths::strip_segment_prefix(path, &self.ctx.base.path) {
            Some(inner) => (inner, true),
            None => (path, false),
        };
        Some(BaseRef {
            scheme,
            path,
            rooted: true,
            in_install,
            suffix,
        })
    }

    fn substitute_host(&self, raw: &str) -> Option<String> {
        let base = self.split_base(raw)?;
        Some(base.render(&self.ctx.request_host, base.path))
    }

    fn selective(&self, raw: &str) -> Option<String> {
        let base = self.split_base(raw)?;
        if !base.in_install {
            return None;
        }
        let relative = paths::collapse_slashes(&paths::normalize(base.path));

        let target = self
            .ctx
            .targets
            .iter()
            .filter(|t| target_covers(t, &relative))
            .max_by_key(|t| t.canonical_path.len())?;

        let rest = if target.primary {
            paths::strip_segment_prefix(&relative, &target.canonical_path).unwrap_or("")
        } else {
            relative.as_str()
        };
        let mut path = paths::join(&[&self.ctx.mapped_path, rest]);
        if !path.is_empty() && base.path.ends_with('/') {
            path.push('/');
        }
        Some(base.render(&self.ctx.mapped_host, &path))
    }
}

/// A base-host URL as written, split around the install path
struct BaseRef<'u> {
    scheme: &'u str,
    /// Path below the install without the leading slash
    path: &'u str,
    /// A `/` followed the authority
    rooted: bool,
    /// The path sits under the base sub-path (always true for root installs)
    in_install: bool,
    /// Query, fragment or trailing markup, byte for byte
    suffix: &'u str,
}

impl BaseRef<'_> {
    fn render(&self, host: &str, path: &str) -> String {
        let slash = if self.rooted || !path.is_empty() { "/" } else { "" };
        format!("{}://{}{}{}{}", self.scheme, host, slash, path, self.suffix)
    }
}

fn target_covers(target: &RewriteTarget, relative: &str) -> bool {
    if target.canonical_path.is_empty() {
        target.primary && relative.is_empty()
    } else {
        paths::starts_with_segment(relative, &target.canonical_path)
    }
}

fn split_scheme(value: &str) -> (&str, &str) {
    for prefix in ["https://", "http://", "//"] {
        let matches = value
            .get(..prefix.len())
            .map(|head| head.eq_ignore_ascii_case(prefix))
            .unwrap_or(false);
        if matches {
            return value.split_at(prefix.len());
        }
    }
    ("", value)
}

fn has_scheme(value: &str) -> bool {
    match value.find(':') {
        Some(i) => {
            i > 0
                && value[..i]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

/// Whether a path looks like a static asset
pub fn is_asset_path(path: &str) -> bool {
    let path = paths::normalize(path);
    let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
    let mut last = "";
    while let Some(segment) = segments.next() {
        let is_directory = ASSET_DIRECTORIES.iter().any(|d| d.eq_ignore_ascii_case(segment));
        if is_directory && segments.peek().is_some() {
            return true;
        }
        last = segment;
    }
    last.rsplit_once('.')
        .map(|(_, ext)| ASSET_EXTENSIONS.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// `/path/` for documents, `/path` for assets; `None` leaves the href alone
fn normalize_relative_href(href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with('?')
        || href.starts_with("//")
        || href.starts_with('.')
        || has_scheme(href)
    {
        return None;
    }
    let split = href.find(|c: char| c == '?' || c == '#').unwrap_or(href.len());
    let (path, suffix) = href.split_at(split);
    let path = paths::collapse_slashes(path.trim_matches('/'));
    let path = if path.is_empty() {
        "/".to_string()
    } else if is_asset_path(&path) {
        format!("/{}", path)
    } else {
        format!("/{}/", path)
    };
    Some(format!("{}{}", path, suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(mode: Option<RewriteMode>) -> RewriteContext {
        RewriteContext {
            base: BaseInstall::parse("https://main.example").unwrap(),
            request_host: "shop.example".to_string(),
            mapped_host: "shop.example".to_string(),
            mapped_path: "store".to_string(),
            mode,
            targets: vec![
                RewriteTarget { canonical_path: "catalog".into(), primary: true },
                RewriteTarget { canonical_path: "about/contact".into(), primary: false },
            ],
        }
    }

    fn rewriter(mode: Option<RewriteMode>) -> UrlRewriter {
        UrlRewriter::new(context(mode)).unwrap()
    }

    #[test]
    fn test_global_substitution() {
        let r = rewriter(Some(RewriteMode::Global));
        assert_eq!(
            r.rewrite_link("https://main.example/blog/post/?x=1#top"),
            "https://shop.example/blog/post/?x=1#top"
        );
        assert_eq!(r.rewrite_link("http://main.example"), "http://shop.example");
        assert_eq!(r.rewrite_link("http://main.example:8080/"), "http://shop.example/");
        assert_eq!(r.rewrite_link("https://other.example/a"), "https://other.example/a");
    }

    #[test]
    fn test_selective_primary_and_boundary() {
        let r = rewriter(Some(RewriteMode::Selective));
        assert_eq!(r.rewrite_link("https://main.example/catalog/"), "https://shop.example/store/");
        assert_eq!(
            r.rewrite_link("https://main.example/catalog/page/2/"),
            "https://shop.example/store/page/2/"
        );
        assert_eq!(
            r.rewrite_link("https://main.example/about/contact/"),
            "https://shop.example/store/about/contact/"
        );
        assert_eq!(r.rewrite_link("https://main.example/blog/"), "https://main.example/blog/");
    }

    #[test]
    fn test_selective_beats_global() {
        let r = rewriter(Some(RewriteMode::Global));
        assert_eq!(r.rewrite_link("https://main.example/catalog"), "https://shop.example/store");
        assert_eq!(
            r.rewrite_link("https://main.example/about/contact"),
            "https://shop.example/store/about/contact"
        );
    }

    #[test]
    fn test_links_untouched_when_disabled() {
        let r = rewriter(None);
        assert_eq!(r.rewrite_link("https://main.example/catalog"), "https://main.example/catalog");
        assert_eq!(
            r.rewrite_asset_url("https://main.example/assets/app.js?v=2"),
            "https://shop.example/assets/app.js?v=2"
        );
    }

    #[test]
    fn test_subdirectory_install_strips_base_path() {
        let mut ctx = context(Some(RewriteMode::Global));
        ctx.base = BaseInstall::parse("https://main.example/site").unwrap();
        let r = UrlRewriter::new(ctx).unwrap();
        assert_eq!(
            r.rewrite_asset_url("https://main.example/site/assets/a.css"),
            "https://shop.example/assets/a.css"
        );
        assert_eq!(
            r.rewrite_link("https://main.example/site//blog/"),
            "https://shop.example/blog/"
        );
        assert_eq!(
            r.rewrite_link("https://main.example/site/catalog"),
            "https://shop.example/store"
        );
    }

    #[test]
    fn test_admin_url_only_ajax() {
        let r = rewriter(Some(RewriteMode::Global));
        assert_eq!(
            r.rewrite_admin_url("https://main.example/admin/admin-ajax.php", "admin-ajax.php"),
            "https://shop.example/admin/admin-ajax.php"
        );
        assert_eq!(
            r.rewrite_admin_url("https://main.example/admin/options.php", "options.php"),
            "https://main.example/admin/options.php"
        );
    }

    #[test]
    fn test_srcset() {
        let r = rewriter(None);
        assert_eq!(
            r.rewrite_srcset("https://main.example/uploads/a.png 1x, https://cdn.example/b.png 2x"),
            "https://shop.example/uploads/a.png 1x, https://cdn.example/b.png 2x"
        );
    }

    #[test]
    fn test_hints() {
        let r = rewriter(None);
        let hints = vec!["//main.example".to_string(), "https://fonts.example".to_string()];
        assert_eq!(
            r.rewrite_hints(&hints),
            vec!["//shop.example".to_string(), "https://fonts.example".to_string()]
        );
    }

    #[test]
    fn test_markup_hrefs() {
        let r = rewriter(Some(RewriteMode::Global));
        let html = concat!(
            r##"<a href="blog/post">x</a><a href="#top">t</a>"##,
            r#"<a href="/img/logo.png">l</a><a href='mailto:a@b.c'>m</a>"#,
            r#"<a href="https://other.example/x">o</a>"#,
        );
        let out = r.rewrite_markup(html);
        assert!(out.contains(r#"href="/blog/post/""#));
        assert!(out.contains(r##"href="#top""##));
        assert!(out.contains(r#"href="/img/logo.png""#));
        assert!(out.contains("href='mailto:a@b.c'"));
        assert!(out.contains(r#"href="https://other.example/x""#));
    }

    #[test]
    fn test_markup_rewrite_is_idempotent() {
        for mode in [None, Some(RewriteMode::Global), Some(RewriteMode::Selective)] {
            let r = rewriter(mode);
            let html = concat!(
                r#"<link href="https://main.example/static/s.css">"#,
                r#"<a href="https://main.example/catalog/">c</a><a href="/about//contact">a</a>"#,
                r#"<img src="https://main.example/uploads/x.jpg" "#,
                r#"srcset="https://main.example/uploads/x.jpg 1x">"#,
            );
            let once = r.rewrite_markup(html);
            let twice = r.rewrite_markup(&once);
            assert_eq!(once, twice, "mode {:?}", mode);
            assert!(!once.contains("shop.example//"));
        }
    }

    #[test]
    fn test_suffix_host_not_matched() {
        let mut ctx = context(Some(RewriteMode::Global));
        ctx.base = BaseInstall::parse("https://example.com").unwrap();
        ctx.request_host = "example.com.au".into();
        ctx.mapped_host = "example.com.au".into();
        let r = UrlRewriter::new(ctx).unwrap();
        let once = r.rewrite_markup(r#"<a href="https://example.com/x/">x</a>"#);
        assert_eq!(once, r#"<a href="https://example.com.au/x/">x</a>"#);
        assert_eq!(r.rewrite_markup(&once), once);
    }

    #[test]
    fn test_head_section_only() {
        let r = rewriter(None);
        let html = concat!(
            r#"<html><head><link rel="canonical" href="https://main.example/a"></head>"#,
            r#"<body><a href="https://main.example/b">b</a></body></html>"#,
        );
        let out = r.rewrite_head_section(html);
        assert!(out.contains(r#"href="https://shop.example/a""#));
        assert!(out.contains(r#"href="https://main.example/b""#));
    }

    #[test]
    fn test_markup_keeps_encoded_attribute_text() {
        let r = rewriter(Some(RewriteMode::Global));
        let html = r#"<div data-o="{&quot;u&quot;:&quot;https://main.example/y&quot;}"></div>"#;
        assert_eq!(
            r.rewrite_markup(html),
            r#"<div data-o="{&quot;u&quot;:&quot;https://shop.example/y&quot;}"></div>"#
        );

        let r = rewriter(None);
        let html = r#"<i data-a="https://main.example/uploads/a.png&quot;}"></i>"#;
        assert_eq!(
            r.rewrite_markup(html),
            r#"<i data-a="https://shop.example/uploads/a.png&quot;}"></i>"#
        );
    }

    #[test]
    fn test_paths_kept_verbatim() {
        let r = rewriter(Some(RewriteMode::Global));
        assert_eq!(r.rewrite_link("https://main.example/café/"), "https://shop.example/café/");
        assert_eq!(r.rewrite_link("https://main.example/a{b}/"), "https://shop.example/a{b}/");
        assert_eq!(
            r.rewrite_link("https://main.example/a%20b/?q=x%7By#frag"),
            "https://shop.example/a%20b/?q=x%7By#frag"
        );
        assert_eq!(
            r.rewrite_markup(r#"<a href="https://main.example/café/">c</a>"#),
            r#"<a href="https://shop.example/café/">c</a>"#
        );

        let r = rewriter(Some(RewriteMode::Selective));
        assert_eq!(
            r.rewrite_link("https://main.example/catalog/café/"),
            "https://shop.example/store/café/"
        );
    }

    #[test]
    fn test_query_only_href_untouched() {
        let r = rewriter(Some(RewriteMode::Global));
        let html = r##"<a href="?replytocom=5#respond">reply</a>"##;
        assert_eq!(r.rewrite_markup(html), html);
        assert_eq!(normalize_relative_href("?replytocom=5#respond"), None);
        assert_eq!(normalize_relative_href("blog?x=1").as_deref(), Some("/blog/?x=1"));
    }

    #[test]
    fn test_split_scheme_multibyte() {
        assert_eq!(split_scheme("éééé/x"), ("", "éééé/x"));
        let r = rewriter(None);
        assert_eq!(r.rewrite_hints(&["éééé".to_string()]), vec!["éééé".to_string()]);
    }

    #[test]
    fn test_is_asset_path() {
        assert!(is_asset_path("theme/style.CSS"));
        assert!(is_asset_path("assets/logo"));
        assert!(!is_asset_path("blog/post"));
        assert!(!is_asset_path("assets"));
    }
}
