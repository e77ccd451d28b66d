//! Application services layer.

pub mod commands;
pub mod error;
