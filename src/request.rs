//! Request context
//!
//! Parsed once per request and never mutated. Hosts are lower-cased with
//! the port dropped; paths keep their case for display and redirects but
//! are compared case-insensitively everywhere else.

use serde::Serialize;
use url::Url;

use crate::paths;
use crate::types::{HostwayError, Result};

/// The installation's own canonical address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseInstall {
    pub scheme: String,
    pub host: String,
    /// Sub-path of a subdirectory install, empty otherwise
    pub path: String,
}

impl BaseInstall {
    pub fn parse(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url.trim())?;
        let host = url
            .host_str()
            .ok_or_else(|| {
                HostwayError::InvalidUrl(format!("base URL has no host: {}", base_url))
            })?;
        Ok(Self {
            scheme: url.scheme().to_string(),
            host: host.to_ascii_lowercase(),
            path: paths::normalize(url.path()),
        })
    }

    pub fn is_subdirectory_install(&self) -> bool {
        !self.path.is_empty()
    }

    /// `scheme://host[/path]` without trailing slash
    pub fn url(&self) -> String {
        if self.path.is_empty() {
            format!("{}://{}", self.scheme, self.host)
        } else {
            format!("{}://{}/{}", self.scheme, self.host, self.path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestContext {
    scheme: String,
    host: String,
    /// Requested path with any `page/<n>` suffix removed
    path: String,
    /// Requested path exactly as received, normalized
    full_path: String,
    query: Option<String>,
    pagination: Option<u32>,
    base: BaseInstall,
}

impl RequestContext {
    /// Parse an absolute request URL against the install's base URL
    pub fn parse(request_url: &str, base_url: &str) -> Result<Self> {
        let base = BaseInstall::parse(base_url)?;
        Self::from_url(request_url, base)
    }

    pub fn from_url(request_url: &str, base: BaseInstall) -> Result<Self> {
        let url = Url::parse(request_url.trim())?;
        let host = url.host_str().ok_or_else(|| {
            HostwayError::InvalidUrl(format!("request URL has no host: {}", request_url))
        })?;
        Ok(Self::from_parts(
            url.scheme(),
            host,
            url.path(),
            url.query(),
            base,
        ))
    }

    /// Build from already-split parts, as a host application would hand them over
    pub fn from_parts(
        scheme: &str,
        host: &str,
        path: &str,
        query: Option<&str>,
        base: BaseInstall,
    ) -> Self {
        let full_path = paths::collapse_slashes(&paths::normalize(path));
        let (path, pagination) = split_pagination(&full_path);
        Self {
            scheme: scheme.to_ascii_lowercase(),
            host: normalize_host(host),
            path,
            full_path,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
            pagination,
            base,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn domain(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn full_path(&self) -> &str {
        &self.full_path
    }

    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn pagination(&self) -> Option<u32> {
        self.pagination
    }

    pub fn base(&self) -> &BaseInstall {
        &self.base
    }

    pub fn base_host(&self) -> &str {
        &self.base.host
    }

    pub fn base_path(&self) -> &str {
        &self.base.path
    }

    pub fn is_subdirectory_install(&self) -> bool {
        self.base.is_subdirectory_install()
    }

    /// Whether the request hit the install's own host
    pub fn is_canonical_host(&self) -> bool {
        self.host == self.base.host
    }

    /// Whether the first path segment names a backend area
    pub fn is_backend_path(&self, prefixes: &[String]) -> bool {
        let path = if self.is_canonical_host() {
            paths::strip_segment_prefix(&self.full_path, &self.base.path).unwrap_or(&self.full_path)
        } else {
            &self.full_path
        };
        prefixes
            .iter()
            .any(|prefix| paths::starts_with_segment(path, paths::normalize(prefix).as_str()))
    }

    /// The request URL rebuilt from its parts
    pub fn url(&self) -> String {
        build_url(&self.scheme, &self.host, &self.full_path, self.query_string())
    }

    /// `?query` suffix or empty
    pub fn query_suffix(&self) -> String {
        self.query
            .as_ref()
            .map(|q| format!("?{}", q))
            .unwrap_or_default()
    }
}

/// `scheme://host/path?query`, root rendered as `scheme://host/`
pub fn build_url(scheme: &str, host: &str, path: &str, query: Option<&str>) -> String {
    let path = paths::normalize(path);
    let query = query.map(|q| format!("?{}", q)).unwrap_or_default();
    if path.is_empty() {
        format!("{}://{}/{}", scheme, host, query)
    } else {
        format!("{}://{}/{}{}", scheme, host, path, query)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.');
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    };
    host.to_ascii_lowercase()
}

/// Split a trailing `page/<n>` off a normalized path
fn split_pagination(path: &str) -> (String, Option<u32>) {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() >= 2 {
        let (head, tail) = segments.split_at(segments.len() - 2);
        if tail[0].eq_ignore_ascii_case("page") {
            if let Ok(n) = tail[1].parse::<u32>() {
                return (head.join("/"), Some(n));
            }
        }
    }
    (path.to_string(), None)
}
