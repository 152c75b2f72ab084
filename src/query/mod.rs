//! Query override layer
//!
//! The host application owns the pending content query. The core never
//! builds one; it only produces a [`QueryMutation`], a declarative list of
//! flag and field changes, and applies it so the query fetches the claimed
//! object instead of whatever the literal path would have produced.

pub mod mappers;

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::request::RequestContext;

pub use mappers::{MapperFactory, MapperInput, MapperKind, QueryMapper};

/// Mode flags on the pending query
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFlag {
    Singular,
    Single,
    Page,
    Attachment,
    Archive,
    PostTypeArchive,
    Tax,
    Home,
    PostsPage,
    Search,
    NotFound,
    /// Commerce listing query
    CommerceListing,
}

/// The pending content query as the core sees it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentQuery {
    pub flags: BTreeSet<QueryFlag>,
    /// Resolved query variables
    pub vars: BTreeMap<String, String>,
    /// Variables parsed from the literal URL
    pub request_vars: BTreeMap<String, String>,
}

impl ContentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A query for a path the repository does not know natively
    ///
    /// This is what a mapped host's paths look like to the host application
    /// before the override runs.
    pub fn unresolved(request: &RequestContext) -> Self {
        let mut query = Self::new();
        query.set_flag(QueryFlag::NotFound, true);
        if !request.path().is_empty() {
            query
                .request_vars
                .insert("pagename".to_string(), request.path().to_string());
            query.vars.insert("pagename".to_string(), request.path().to_string());
        }
        if let Some(page) = request.pagination() {
            query.vars.insert("paged".to_string(), page.to_string());
        }
        query.vars.insert("error".to_string(), "404".to_string());
        query
    }

    pub fn is(&self, flag: QueryFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn set_flag(&mut self, flag: QueryFlag, on: bool) {
        if on {
            self.flags.insert(flag);
        } else {
            self.flags.remove(&flag);
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn is_not_found(&self) -> bool {
        self.is(QueryFlag::NotFound)
    }
}

/// One declarative change
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueryOp {
    Flag { flag: QueryFlag, on: bool },
    SetVar { name: String, value: String },
    UnsetVar { name: String },
    SetRequestVar { name: String, value: String },
    UnsetRequestVar { name: String },
    ClearRequestVars,
}

/// Ordered set of changes to force onto the pending query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryMutation {
    ops: Vec<QueryOp>,
}

impl QueryMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn flag(mut self, flag: QueryFlag, on: bool) -> Self {
        self.ops.push(QueryOp::Flag { flag, on });
        self
    }

    /// Turn several flags off
    pub fn clear(mut self, flags: &[QueryFlag]) -> Self {
        for flag in flags {
            self.ops.push(QueryOp::Flag { flag: *flag, on: false });
        }
        self
    }

    pub fn set_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.ops.push(QueryOp::SetVar {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    /// Remove variables from both the resolved and the literal set
    pub fn unset(mut self, names: &[&str]) -> Self {
        for name in names {
            self.ops.push(QueryOp::UnsetVar { name: name.to_string() });
            self.ops.push(QueryOp::UnsetRequestVar { name: name.to_string() });
        }
        self
    }

    pub fn set_request_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.ops.push(QueryOp::SetRequestVar {
            name: name.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn clear_request_vars(mut self) -> Self {
        self.ops.push(QueryOp::ClearRequestVars);
        self
    }

    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every op in order
    pub fn apply(&self, query: &mut ContentQuery) {
        for op in &self.ops {
            match op {
                QueryOp::Flag { flag, on } => query.set_flag(*flag, *on),
                QueryOp::SetVar { name, value } => {
                    query.vars.insert(name.clone(), value.clone());
                }
                QueryOp::UnsetVar { name } => {
                    query.vars.remove(name);
                }
                QueryOp::SetRequestVar { name, value } => {
                    query.request_vars.insert(name.clone(), value.clone());
                }
                QueryOp::UnsetRequestVar { name } => {
                    query.request_vars.remove(name);
                }
                QueryOp::ClearRequestVars => query.request_vars.clear(),
            }
        }
    }
}
