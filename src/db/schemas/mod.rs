//! Storage schemas for hostway
//!
//! Mapping rows, mapping-value rows and the named settings the core reads.

mod mapping;
mod mapping_value;
pub mod setting;

pub use mapping::Mapping;
pub use mapping_value::{sort_values, MappingValue, ObjectType};
