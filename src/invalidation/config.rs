//! Cache server and dispatch configuration.
//!
//! Controls where ban requests go and how they are issued, via `vanish.toml`.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

// Default values for dispatch configuration
const DEFAULT_CONCURRENCY: usize = 8;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MAX_RETRIES: u32 = 0;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 200;

/// Where the cache server listens relative to the public site URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheServerConfig {
    /// Replaces the site URL's port when building the ban target.
    pub port_override: Option<u16>,
}

impl From<&crate::config::CacheServerSettings> for CacheServerConfig {
    fn from(settings: &crate::config::CacheServerSettings) -> Self {
        Self {
            port_override: settings.port_override,
        }
    }
}

/// How the purge dispatcher issues ban requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Maximum ban requests in flight at once.
    pub concurrency: usize,
    /// Per-attempt timeout (ms).
    pub request_timeout_ms: u64,
    /// Extra attempts after a failed request; zero disables retrying.
    pub max_retries: u32,
    /// Base delay between attempts (ms), multiplied by the attempt number.
    pub retry_backoff_ms: u64,
    /// Collapse duplicate targets at flush time.
    pub dedup: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            dedup: true,
        }
    }
}

impl From<&crate::config::DispatchSettings> for DispatchConfig {
    fn from(settings: &crate::config::DispatchSettings) -> Self {
        Self {
            concurrency: settings.concurrency.get(),
            request_timeout_ms: settings.request_timeout.as_millis() as u64,
            max_retries: settings.max_retries,
            retry_backoff_ms: settings.retry_backoff.as_millis() as u64,
            dedup: settings.dedup,
        }
    }
}

impl DispatchConfig {
    /// Returns the concurrency as NonZeroUsize, clamping to 1 if zero.
    pub fn concurrency_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.concurrency).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Total attempts a single entry may consume.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}
