//! Scenario chain
//!
//! An ordered list of claim strategies. Each strategy looks at the resolved
//! mapping, its values and the request, and may claim one value as the
//! object this request is for. The first claim wins, so the order of the
//! list is part of the behavior: a fixed homepage outranks a plain object
//! match at the same path.
//!
//! ## Default order
//!
//! | # | Strategy | Gate |
//! |---|----------|------|
//! | 1 | `LatestPostsHomepage` | home URL shows latest items |
//! | 2 | `FixedHomepage` | static homepage with a posts page |
//! | 3 | `SimpleObject` | always |
//! | 4 | `Archive` | always |
//! | 5 | `ShortChildPage` | `short_child_urls` |
//! | 6 | `GlobalArchive` | `global_archive_mapping` |
//! | 7 | `GlobalParent` | `global_parent_mapping` |
//! | 8 | `GlobalShop` | `global_shop_mapping` |
//! | 9 | `GlobalDomain` | `global_domain_mapping` |
//!
//! Extra strategies are appended with [`ScenarioChain::push`] or placed
//! with [`ScenarioChain::insert_before`].

mod archive;
mod global;
mod homepage;
pub mod matching;
mod short_child;
mod simple;

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::content::ContentRepository;
use crate::db::schemas::{Mapping, MappingValue};
use crate::request::RequestContext;

pub use archive::ArchiveStrategy;
pub use global::{
    GlobalArchiveStrategy, GlobalDomainStrategy, GlobalParentStrategy, GlobalShopStrategy,
};
pub use homepage::{FixedHomepageStrategy, LatestPostsHomepageStrategy};
pub use short_child::ShortChildPageStrategy;
pub use simple::SimpleObjectStrategy;

// =============================================================================
// Types
// =============================================================================

/// Which strategy produced a claim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    LatestPostsHomepage,
    FixedHomepage,
    SimpleObject,
    Archive,
    ShortChildPage,
    GlobalArchive,
    GlobalParent,
    GlobalShop,
    GlobalDomain,
    /// Strategy registered by an embedding application
    Custom(String),
}

impl ScenarioKind {
    /// Whether the claim came from a domain-wide fallback
    pub fn is_global(&self) -> bool {
        matches!(
            self,
            Self::GlobalArchive | Self::GlobalParent | Self::GlobalShop | Self::GlobalDomain
        )
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LatestPostsHomepage => f.write_str("latest_posts_homepage"),
            Self::FixedHomepage => f.write_str("fixed_homepage"),
            Self::SimpleObject => f.write_str("simple_object"),
            Self::Archive => f.write_str("archive"),
            Self::ShortChildPage => f.write_str("short_child_page"),
            Self::GlobalArchive => f.write_str("global_archive"),
            Self::GlobalParent => f.write_str("global_parent"),
            Self::GlobalShop => f.write_str("global_shop"),
            Self::GlobalDomain => f.write_str("global_domain"),
            Self::Custom(name) => write!(f, "custom:{}", name),
        }
    }
}

/// Everything a strategy may look at
#[derive(Clone, Copy)]
pub struct ClaimContext<'a> {
    pub request: &'a RequestContext,
    pub mapping: &'a Mapping,
    /// Values of `mapping`, primary first
    pub values: &'a [MappingValue],
    pub settings: &'a Settings,
    pub content: &'a dyn ContentRepository,
    /// Hierarchical children are left to `ShortChildPage`
    pub defer_short_children: bool,
}

impl<'a> ClaimContext<'a> {
    pub fn new(
        request: &'a RequestContext,
        mapping: &'a Mapping,
        values: &'a [MappingValue],
        settings: &'a Settings,
        content: &'a dyn ContentRepository,
    ) -> Self {
        Self {
            request,
            mapping,
            values,
            settings,
            content,
            defer_short_children: false,
        }
    }
}

/// A value claimed for the request, with the strategy that claimed it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub value: MappingValue,
    pub scenario: ScenarioKind,
}

/// One entry in the chain
pub trait ClaimStrategy: Send + Sync {
    fn kind(&self) -> ScenarioKind;

    /// Claim a value, or `None` to let the next strategy try
    ///
    /// Must not have side effects; the chain may be evaluated more than once
    /// per request.
    fn claim(&self, ctx: &ClaimContext<'_>) -> Option<MappingValue>;
}

// =============================================================================
// Chain
// =============================================================================

pub struct ScenarioChain {
    strategies: Vec<Box<dyn ClaimStrategy>>,
}

impl Default for ScenarioChain {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ScenarioChain {
    /// A chain with no strategies
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// The built-in strategies in priority order
    pub fn with_defaults() -> Self {
        let mut chain = Self::empty();
        chain.push(LatestPostsHomepageStrategy);
        chain.push(FixedHomepageStrategy);
        chain.push(SimpleObjectStrategy);
        chain.push(ArchiveStrategy);
        chain.push(ShortChildPageStrategy);
        chain.push(GlobalArchiveStrategy);
        chain.push(GlobalParentStrategy);
        chain.push(GlobalShopStrategy);
        chain.push(GlobalDomainStrategy);
        chain
    }

    /// Append a strategy after every registered one
    pub fn push(&mut self, strategy: impl ClaimStrategy + 'static) {
        self.strategies.push(Box::new(strategy));
    }

    /// Place a strategy right before `before`
    ///
    /// Appends and returns `false` when `before` is not registered.
    pub fn insert_before(
        &mut self,
        before: &ScenarioKind,
        strategy: impl ClaimStrategy + 'static,
    ) -> bool {
        match self.position(before) {
            Some(index) => {
                self.strategies.insert(index, Box::new(strategy));
                true
            }
            None => {
                self.push(strategy);
                false
            }
        }
    }

    /// Remove the first strategy of a kind
    pub fn remove(&mut self, kind: &ScenarioKind) -> bool {
        match self.position(kind) {
            Some(index) => {
                self.strategies.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, kind: &ScenarioKind) -> bool {
        self.position(kind).is_some()
    }

    /// Registered kinds in evaluation order
    pub fn kinds(&self) -> Vec<ScenarioKind> {
        self.strategies.iter().map(|s| s.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    fn position(&self, kind: &ScenarioKind) -> Option<usize> {
        self.strategies.iter().position(|s| &s.kind() == kind)
    }

    /// Try each strategy in order and return the first claim
    pub fn match_value(&self, ctx: &ClaimContext<'_>) -> Option<Claim> {
        let ctx = ClaimContext {
            defer_short_children: ctx.settings.short_child_urls
                && self.contains(&ScenarioKind::ShortChildPage),
            ..*ctx
        };

        for strategy in &self.strategies {
            if let Some(value) = strategy.claim(&ctx) {
                let scenario = strategy.kind();
                debug!(
                    mapping = ctx.mapping.id,
                    value = value.id,
                    scenario = %scenario,
                    "Scenario claimed request"
                );
                return Some(Claim { value, scenario });
            }
        }

        debug!(mapping = ctx.mapping.id, path = %ctx.request.path(), "No scenario claimed request");
        None
    }
}
