//! Invalidation engine.
//!
//! Host-facing facade: queue invalidations during a unit of work, then flush
//! them to the cache server in one batch.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Mutex;
use tracing::{Instrument, Span, debug, error, instrument};
use uuid::Uuid;

use super::accumulator::BanAccumulator;
use super::config::{CacheServerConfig, DispatchConfig};
use super::dispatcher::PurgeDispatcher;
use super::result::FlushResult;
use super::target::resolve_target;
use crate::domain::error::DomainError;
use crate::domain::path::normalize;
use crate::infra::error::InfraError;
use crate::infra::http::HttpBanTransport;

/// Supplies the site's canonical base URL; read at every flush.
pub type SiteUrlProvider = Arc<dyn Fn() -> String + Send + Sync>;

/// Lifecycle phase of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Accumulating,
    Flushing,
}

/// Accumulate-then-flush invalidation engine.
///
/// One instance corresponds to one cache server configuration. The host owns
/// it (usually behind an `Arc`) and decides its scope: one per process for a
/// long-running server, or one per site for a multi-tenant host.
///
/// # Usage
///
/// ```ignore
/// engine.invalidate_url("https://example.com/2024/hello-world/")?;
/// engine.invalidate_regex("^/category/news/");
/// // At the end of the unit of work:
/// let result = engine.flush().await?;
/// ```
pub struct InvalidationEngine {
    site_url: SiteUrlProvider,
    config: CacheServerConfig,
    accumulator: BanAccumulator,
    dispatcher: Arc<PurgeDispatcher>,
    flush_gate: Arc<Mutex<()>>,
    flushing: Arc<AtomicBool>,
}

impl InvalidationEngine {
    /// Create an engine around an existing dispatcher.
    pub fn new(
        site_url: impl Fn() -> String + Send + Sync + 'static,
        config: CacheServerConfig,
        dispatcher: PurgeDispatcher,
    ) -> Self {
        Self {
            site_url: Arc::new(site_url),
            config,
            accumulator: BanAccumulator::new(),
            dispatcher: Arc::new(dispatcher),
            flush_gate: Arc::new(Mutex::new(())),
            flushing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Create an engine that sends bans over HTTP.
    pub fn with_http_transport(
        site_url: impl Fn() -> String + Send + Sync + 'static,
        config: CacheServerConfig,
        dispatch: DispatchConfig,
    ) -> Result<Self, InfraError> {
        let transport = Arc::new(HttpBanTransport::new()?);
        Ok(Self::new(
            site_url,
            config,
            PurgeDispatcher::new(dispatch, transport),
        ))
    }

    /// Queue the cache entry for `raw_url`; scheme, host and port are ignored.
    pub fn invalidate_url(&self, raw_url: &str) -> Result<(), DomainError> {
        let target = normalize(raw_url)?;
        self.accumulator.add(target);
        Ok(())
    }

    /// Queue several URLs, stopping at the first one that does not parse.
    ///
    /// URLs queued before the failing one stay queued.
    pub fn invalidate_urls<I, S>(&self, raw_urls: I) -> Result<(), DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw_urls
            .into_iter()
            .try_for_each(|raw| self.invalidate_url(raw.as_ref()))
    }

    /// Queue a regex ban; the pattern is sent verbatim.
    pub fn invalidate_regex(&self, pattern: impl Into<String>) {
        self.accumulator.add_regex_pattern(pattern);
    }

    /// Send every queued ban to the cache server.
    ///
    /// Flushes are serialized: a call made while another flush is running
    /// waits for it and then flushes whatever was queued in the meantime.
    /// Per-entry failures are reported in the result; only a site URL that
    /// cannot be resolved fails the call, and then nothing is drained.
    ///
    /// Once drained, the batch is dispatched on its own task. Dropping the
    /// returned future (a caller-side timeout, a lost `select!` branch) stops
    /// waiting for the result but not the requests, and the next flush waits
    /// for that batch to finish.
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<FlushResult, DomainError> {
        let gate = Arc::clone(&self.flush_gate).lock_owned().await;
        let flushing = FlushingFlag::raise(Arc::clone(&self.flushing));
        let flush_id = Uuid::new_v4();

        if self.accumulator.is_empty() {
            debug!(flush_id = %flush_id, "Flush skipped: no pending bans");
            return Ok(FlushResult::empty(flush_id));
        }

        let site_url = (self.site_url)();
        let target = resolve_target(&site_url, &self.config).inspect_err(|err| {
            error!(
                flush_id = %flush_id,
                site_url = %site_url,
                error = %err,
                pending = self.accumulator.len(),
                "Flush aborted: cache server target unresolvable"
            );
        })?;

        let pending = self.accumulator.drain();
        let dispatcher = Arc::clone(&self.dispatcher);
        let dispatch = tokio::spawn(
            async move {
                let result = dispatcher
                    .dispatch_with_id(flush_id, &target, &pending)
                    .await;
                drop(flushing);
                drop(gate);
                result
            }
            .instrument(Span::current()),
        );

        match dispatch.await {
            Ok(result) => Ok(result),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                error!(flush_id = %flush_id, error = %err, "Flush dispatch task cancelled");
                Err(DomainError::FlushInterrupted { flush_id })
            }
        }
    }

    pub fn state(&self) -> EngineState {
        if self.flushing.load(Ordering::Acquire) {
            EngineState::Flushing
        } else {
            EngineState::Accumulating
        }
    }

    /// Number of queued entries, duplicates included.
    pub fn pending_len(&self) -> usize {
        self.accumulator.len()
    }

    /// Get the underlying cache server config.
    pub fn config(&self) -> &CacheServerConfig {
        &self.config
    }

    /// Get the underlying dispatcher.
    pub fn dispatcher(&self) -> &PurgeDispatcher {
        &self.dispatcher
    }
}

/// Holds the engine in `Flushing` until dropped, even if the flush is cancelled.
struct FlushingFlag(Arc<AtomicBool>);

impl FlushingFlag {
    fn raise(flag: Arc<AtomicBool>) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for FlushingFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
