//! Vanish: accumulate cache invalidations and flush them to a Varnish-style
//! cache server as BAN requests.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod invalidation;
