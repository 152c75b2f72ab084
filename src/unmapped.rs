//! Unmapped-request handling
//!
//! Runs after the content query for a request on a hosted domain that no
//! mapping value claimed, or that still ended in not-found.

use serde::Serialize;
use tracing::info;

use crate::db::schemas::Mapping;
use crate::paths;
use crate::request::{build_url, RequestContext};

pub const REDIRECT_STATUS: u16 = 302;

/// Fallback policy for hosted-but-unclaimed requests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmappedPolicy {
    /// Leave the not-found state as is
    ThrowNotFound,
    /// Redirect to the mapped host's primary URL
    RedirectToPrimary,
    /// Redirect to the same path on the install's canonical host
    #[default]
    CanonicalRedirect,
}

impl UnmappedPolicy {
    /// Parse a stored policy; `None` for empty or unknown values
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "not_found" | "404" | "1" => Some(Self::ThrowNotFound),
            "redirect_to_primary" | "primary" | "2" => Some(Self::RedirectToPrimary),
            "canonical" | "redirect_to_canonical" => Some(Self::CanonicalRedirect),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UnmappedOutcome {
    /// Nothing to do, the response proceeds
    PassThrough,
    /// Serve the standard not-found response
    NotFound,
    Redirect { location: String, status: u16 },
}

impl UnmappedOutcome {
    pub fn redirect(location: String) -> Self {
        Self::Redirect {
            location,
            status: REDIRECT_STATUS,
        }
    }

    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Redirect { location, .. } => Some(location),
            _ => None,
        }
    }
}

pub struct UnmappedHandler {
    policy: UnmappedPolicy,
}

impl UnmappedHandler {
    pub fn new(policy: UnmappedPolicy) -> Self {
        Self { policy }
    }

    /// Decide the fallback for a request
    ///
    /// `primary` is the mapping whose root the host's primary value lives
    /// at; `unresolved` is true when nothing was claimed or the content
    /// query still ended in not-found.
    pub fn decide(
        &self,
        request: &RequestContext,
        hosted: bool,
        primary: Option<&Mapping>,
        unresolved: bool,
    ) -> UnmappedOutcome {
        if request.is_canonical_host() || !hosted || !unresolved {
            return UnmappedOutcome::PassThrough;
        }

        match self.policy {
            UnmappedPolicy::ThrowNotFound => UnmappedOutcome::NotFound,
            UnmappedPolicy::RedirectToPrimary => match primary {
                Some(mapping) => {
                    // Never bounce a request to itself
                    if paths::eq(&mapping.path, request.full_path()) {
                        info!(
                            host = %request.domain(),
                            "Primary redirect would loop, serving not found"
                        );
                        return UnmappedOutcome::NotFound;
                    }
                    let location = build_url(request.scheme(), &mapping.host, &mapping.path, None);
                    info!(location = %location, "Redirecting unmapped request to primary");
                    UnmappedOutcome::redirect(location)
                }
                None => UnmappedOutcome::NotFound,
            },
            UnmappedPolicy::CanonicalRedirect => {
                let location = canonical_location(request);
                info!(location = %location, "Redirecting unmapped request to canonical host");
                UnmappedOutcome::redirect(location)
            }
        }
    }
}

/// Equivalent URL on the canonical host, query string preserved exactly
pub fn canonical_location(request: &RequestContext) -> String {
    let base = request.base();
    let path = paths::join(&[&base.path, request.full_path()]);
    build_url(&base.scheme, &base.host, &path, request.query_string())
}
