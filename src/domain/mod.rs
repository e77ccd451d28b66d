//! Domain layer types and invariants.

pub mod ban;
pub mod error;
pub mod path;
