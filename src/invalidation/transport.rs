//! Transport trait describing how ban requests reach the cache server.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ban::BanTarget;

/// The non-standard HTTP verb Varnish-style proxies use for bans.
pub const BAN_METHOD: &str = "BAN";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid ban request: {0}")]
    InvalidRequest(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn from_request(err: impl std::fmt::Display) -> Self {
        Self::Request(err.to_string())
    }
}

/// Issues a single `BAN` request against `target` and reports the status code.
///
/// Implementations must not interpret the status; the dispatcher decides what
/// counts as success. Timeouts and retries are applied by the caller.
#[async_trait]
pub trait BanTransport: Send + Sync {
    async fn send(&self, target: &str, ban: &BanTarget) -> Result<u16, TransportError>;
}
