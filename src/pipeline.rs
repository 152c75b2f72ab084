//! Request-resolution pipeline
//!
//! ```text
//! RequestContext ─▶ MappingResolver ─▶ ScenarioChain ─▶ MapperFactory ─▶ QueryMutation
//!                          │                 │                              │
//!                          │ (no claim)      ▼                              ▼
//!                          └──────────▶ UnmappedHandler            UrlRewriter / HeadCustomizer
//! ```
//!
//! The pipeline fails open: a store failure is logged and the request is
//! treated as unmapped, so the host application always falls back to its
//! own canonical content query.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::config::Settings;
use crate::content::ContentRepository;
use crate::db::schemas::{Mapping, MappingValue, ObjectType};
use crate::db::{CachedStore, MappingStore};
use crate::decision;
use crate::paths;
use crate::query::{ContentQuery, MapperFactory, MapperInput, MapperKind, QueryFlag, QueryMutation};
use crate::request::{build_url, BaseInstall, RequestContext};
use crate::resolver::MappingResolver;
use crate::rewrite::{HeadCustomizer, RewriteContext, RewriteTarget, UrlRewriter};
use crate::scenarios::{ClaimContext, ScenarioChain, ScenarioKind};
use crate::types::Result;
use crate::unmapped::{UnmappedHandler, UnmappedOutcome};

/// Status of the path-case redirect
pub const CASE_REDIRECT_STATUS: u16 = 301;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub base: BaseInstall,
    /// First path segments the pipeline never touches
    pub backend_paths: Vec<String>,
}

impl PipelineConfig {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base: BaseInstall::parse(base_url)?,
            backend_paths: default_backend_paths(),
        })
    }

    pub fn with_backend_paths(mut self, extra: impl IntoIterator<Item = String>) -> Self {
        for path in extra {
            let path = paths::normalize(&path);
            if !path.is_empty() && !self.backend_paths.iter().any(|p| paths::eq(p, &path)) {
                self.backend_paths.push(path);
            }
        }
        self
    }
}

fn default_backend_paths() -> Vec<String> {
    ["admin", "login", "api"].iter().map(|s| s.to_string()).collect()
}

/// Per-request resolution memo
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRequest {
    pub request_host: String,
    pub request_path: String,
    /// At least one mapping exists for the host
    pub is_hosted: bool,
    pub matched_mapping: Option<Mapping>,
    pub candidate_values: Vec<MappingValue>,
    pub claimed_value: Option<MappingValue>,
    pub claiming_scenario: Option<ScenarioKind>,
    pub mapper: Option<MapperKind>,
    pub query_override: Option<QueryMutation>,
    /// A claim was made and an override exists for it
    pub is_mapped: bool,
    pub settings: Settings,
    /// Target of the redirect-to-primary policy
    #[serde(skip)]
    pub primary_mapping: Option<Mapping>,
}

impl ResolvedRequest {
    fn unhosted(request: &RequestContext, settings: Settings) -> Self {
        Self {
            request_host: request.domain().to_string(),
            request_path: request.path().to_string(),
            is_hosted: false,
            matched_mapping: None,
            candidate_values: Vec::new(),
            claimed_value: None,
            claiming_scenario: None,
            mapper: None,
            query_override: None,
            is_mapped: false,
            settings,
            primary_mapping: None,
        }
    }

    /// The host application must not bounce mapped requests to the canonical URL
    pub fn suppress_canonical_redirect(&self) -> bool {
        self.is_mapped
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "resolution", rename_all = "snake_case")]
pub enum Resolution {
    /// Canonical host or backend path, nothing to do
    Bypass,
    /// Path differs from the stored mapping path only by case
    Redirect { location: String, status: u16 },
    Resolved(ResolvedRequest),
}

impl Resolution {
    pub fn resolved(&self) -> Option<&ResolvedRequest> {
        match self {
            Self::Resolved(resolved) => Some(resolved),
            _ => None,
        }
    }
}

// =============================================================================
// Pipeline
// =============================================================================

pub struct Pipeline<S: MappingStore> {
    store: CachedStore<S>,
    content: Arc<dyn ContentRepository>,
    chain: ScenarioChain,
    mappers: MapperFactory,
    config: PipelineConfig,
}

impl<S: MappingStore> Pipeline<S> {
    pub fn new(store: S, content: Arc<dyn ContentRepository>, config: PipelineConfig) -> Self {
        Self {
            store: CachedStore::new(store),
            content,
            chain: ScenarioChain::with_defaults(),
            mappers: MapperFactory::with_defaults(),
            config,
        }
    }

    /// Strategy registration
    pub fn chain_mut(&mut self) -> &mut ScenarioChain {
        &mut self.chain
    }

    /// Mapper registration
    pub fn mappers_mut(&mut self) -> &mut MapperFactory {
        &mut self.mappers
    }

    pub fn store(&self) -> &CachedStore<S> {
        &self.store
    }

    pub fn content(&self) -> &dyn ContentRepository {
        self.content.as_ref()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Current settings, defaults when the store cannot be read
    pub fn settings(&self) -> Settings {
        Settings::load(&self.store).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load settings, using defaults");
            Settings::default()
        })
    }

    /// Resolve a request without touching any query
    ///
    /// Side-effect free apart from the store memo; calling it again for the
    /// same request yields the same result.
    pub fn resolve(&self, request: &RequestContext) -> Resolution {
        if request.is_canonical_host() || request.is_backend_path(&self.config.backend_paths) {
            return Resolution::Bypass;
        }

        let settings = self.settings();
        let resolver = MappingResolver::new(&self.store);

        let hosted = match resolver.hosted(request.domain()) {
            Ok(mappings) => mappings,
            Err(e) => {
                warn!(
                    host = %request.domain(),
                    error = %e,
                    "Mapping lookup failed, treating request as unmapped"
                );
                return Resolution::Resolved(ResolvedRequest::unhosted(request, settings));
            }
        };
        if hosted.is_empty() {
            decision!(settings.debug, host = %request.domain(), "Host is not mapped");
            return Resolution::Resolved(ResolvedRequest::unhosted(request, settings));
        }

        let matched = match resolver.resolve(request.domain(), request.path()) {
            Ok(mapping) => mapping,
            Err(e) => {
                warn!(
                    host = %request.domain(),
                    error = %e,
                    "Mapping lookup failed, treating request as unmapped"
                );
                None
            }
        };

        if let Some(location) = matched.as_ref().and_then(|m| case_redirect(request, m)) {
            decision!(settings.debug, location = %location, "Correcting mapping path case");
            return Resolution::Redirect {
                location,
                status: CASE_REDIRECT_STATUS,
            };
        }

        let primary_mapping = matched.clone().or_else(|| hosted.first().cloned());
        let mut resolved = ResolvedRequest {
            is_hosted: true,
            primary_mapping,
            ..ResolvedRequest::unhosted(request, settings)
        };

        let Some(mapping) = matched else {
            decision!(
                resolved.settings.debug,
                host = %request.domain(),
                path = %request.path(),
                "No mapping covers path"
            );
            return Resolution::Resolved(resolved);
        };

        let values = self.store.find_values_by_mapping(mapping.id).unwrap_or_else(|e| {
            warn!(
                mapping = mapping.id,
                error = %e,
                "Value lookup failed, treating request as unmapped"
            );
            Vec::new()
        });

        let ctx = ClaimContext::new(
            request,
            &mapping,
            &values,
            &resolved.settings,
            self.content.as_ref(),
        );
        if let Some(claim) = self.chain.match_value(&ctx) {
            let input = MapperInput {
                scenario: &claim.scenario,
                value: &claim.value,
                mapping: &mapping,
                request,
                content: self.content.as_ref(),
            };
            match self.mappers.build_override(&input) {
                Some((kind, mutation)) => {
                    decision!(
                        resolved.settings.debug,
                        host = %request.domain(),
                        mapping = mapping.id,
                        scenario = %claim.scenario,
                        mapper = ?kind,
                        "Request mapped"
                    );
                    resolved.mapper = Some(kind);
                    resolved.query_override = Some(mutation);
                    resolved.is_mapped = true;
                }
                None => {
                    decision!(
                        resolved.settings.debug,
                        scenario = %claim.scenario,
                        "No override for claim, treating request as unmapped"
                    );
                }
            }
            resolved.claimed_value = Some(claim.value);
            resolved.claiming_scenario = Some(claim.scenario);
        }

        resolved.matched_mapping = Some(mapping);
        resolved.candidate_values = values;
        Resolution::Resolved(resolved)
    }

    /// Resolve and apply the override to the pending query
    pub fn handle(&self, request: &RequestContext, query: &mut ContentQuery) -> Resolution {
        let resolution = self.resolve(request);
        if let Some(resolved) = resolution.resolved() {
            if let Some(mutation) = &resolved.query_override {
                if query.is(QueryFlag::Search) {
                    decision!(resolved.settings.debug, "Search query left untouched");
                } else {
                    mutation.apply(query);
                }
            }
        }
        resolution
    }

    /// Fallback decision once the content query has run
    pub fn finish(
        &self,
        request: &RequestContext,
        resolved: &ResolvedRequest,
        query: &ContentQuery,
    ) -> UnmappedOutcome {
        let unresolved = !resolved.is_mapped || query.is_not_found();
        UnmappedHandler::new(resolved.settings.unmapped_policy).decide(
            request,
            resolved.is_hosted,
            resolved.primary_mapping.as_ref(),
            unresolved,
        )
    }

    /// URL rewriter for a mapped request
    pub fn rewriter(
        &self,
        request: &RequestContext,
        resolved: &ResolvedRequest,
    ) -> Option<UrlRewriter> {
        if !resolved.is_mapped {
            return None;
        }
        let mapping = resolved.matched_mapping.as_ref()?;

        let mut targets = self.rewrite_targets(&resolved.candidate_values);
        if let Some(claimed) = resolved.claimed_value.as_ref().filter(|v| v.id == 0) {
            if let Some(canonical_path) = self.object_path(claimed) {
                targets.push(RewriteTarget {
                    canonical_path,
                    primary: false,
                });
            }
        }

        let ctx = RewriteContext {
            base: request.base().clone(),
            request_host: request.domain().to_string(),
            mapped_host: mapping.host.clone(),
            mapped_path: mapping.path.clone(),
            mode: resolved.settings.link_rewrite_mode(),
            targets,
        };
        match UrlRewriter::new(ctx) {
            Ok(rewriter) => Some(rewriter),
            Err(e) => {
                warn!(error = %e, "Failed to build URL rewriter");
                None
            }
        }
    }

    /// Head markup and favicon for a mapped request
    pub fn head_customizer(
        &self,
        resolved: &ResolvedRequest,
        rewriter: Option<&UrlRewriter>,
    ) -> HeadCustomizer {
        let Some(mapping) = resolved.matched_mapping.as_ref().filter(|_| resolved.is_mapped) else {
            return HeadCustomizer::default();
        };
        let favicon = mapping
            .favicon_ref
            .and_then(|id| self.content.asset_url(id))
            .map(|url| match rewriter {
                Some(r) => r.rewrite_asset_url(&url),
                None => url,
            });
        HeadCustomizer::new(mapping.custom_head_markup.as_deref(), favicon.as_deref())
    }

    fn object_path(&self, value: &MappingValue) -> Option<String> {
        match (&value.object_type, value.object_id) {
            (ObjectType::PostsHomepage, _) => Some(self.content.home_path()),
            (ObjectType::ContentType(content_type), None) => {
                self.content.archive_path(content_type)
            }
            (object_type, Some(id)) => self.content.canonical_path(object_type, id),
            _ => None,
        }
    }

    fn rewrite_targets(&self, values: &[MappingValue]) -> Vec<RewriteTarget> {
        let sole = values.len() == 1;
        values
            .iter()
            .filter_map(|value| {
                self.object_path(value).map(|canonical_path| RewriteTarget {
                    canonical_path,
                    primary: value.primary || sole,
                })
            })
            .collect()
    }
}

/// Redirect target when the request spells the mapping path differently
fn case_redirect(request: &RequestContext, mapping: &Mapping) -> Option<String> {
    if !mapping.has_path() || request.full_path().starts_with(mapping.path.as_str()) {
        return None;
    }
    let full = request.full_path();
    if !full.is_char_boundary(mapping.path.len()) {
        return None;
    }
    let rest = &full[mapping.path.len()..];
    let path = format!("{}{}", mapping.path, rest);
    Some(build_url(request.scheme(), request.domain(), &path, request.query_string()))
}
