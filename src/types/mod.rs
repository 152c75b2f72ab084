//! Shared types for hostway

pub mod error;

pub use error::{HostwayError, Result};
