//! Purge dispatcher for executing ban plans.
//!
//! Sends one `BAN` request per planned entry and folds the per-entry outcomes
//! into a `FlushResult`. A failing entry never stops the others.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use metrics::{counter, histogram};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::config::DispatchConfig;
use super::plan::BanPlan;
use super::result::{EntryOutcome, FailureReason, FlushResult};
use super::transport::{BanTransport, TransportError};
use crate::domain::ban::{BanTarget, PendingBanSet};

const METRIC_BAN_REQUESTS_TOTAL: &str = "vanish_ban_requests_total";
const METRIC_FLUSH_MS: &str = "vanish_flush_ms";

/// Purge dispatcher that turns pending bans into cache-server requests.
///
/// The dispatcher:
/// 1. Builds a plan from the pending set (ordering, optional dedup)
/// 2. Issues the requests with bounded concurrency, each under a timeout
/// 3. Retries failed entries up to the configured limit
/// 4. Reports every entry's final outcome in plan order
pub struct PurgeDispatcher {
    config: DispatchConfig,
    transport: Arc<dyn BanTransport>,
}

impl PurgeDispatcher {
    pub fn new(config: DispatchConfig, transport: Arc<dyn BanTransport>) -> Self {
        Self { config, transport }
    }

    /// Send every entry of `bans` to `target`.
    #[instrument(skip(self, bans))]
    pub async fn dispatch(&self, target: &str, bans: PendingBanSet) -> FlushResult {
        self.dispatch_with_id(Uuid::new_v4(), target, &bans).await
    }

    pub(crate) async fn dispatch_with_id(
        &self,
        flush_id: Uuid,
        target: &str,
        bans: &PendingBanSet,
    ) -> FlushResult {
        let started_at = Instant::now();
        let plan = BanPlan::from_pending(bans, self.config.dedup);
        let concurrency = self.config.concurrency_non_zero().get();

        // Observable: log dispatch start with plan details
        info!(
            flush_id = %flush_id,
            target,
            plan = %plan,
            concurrency,
            "Ban dispatch starting"
        );

        let duplicates_skipped = plan.duplicates_skipped;
        let mut indexed: Vec<(usize, EntryOutcome)> =
            stream::iter(plan.entries.into_iter().enumerate())
                .map(|(index, entry)| async move {
                    (index, self.send_with_retry(target, entry).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;
        indexed.sort_by_key(|(index, _)| *index);
        let outcomes = indexed.into_iter().map(|(_, outcome)| outcome).collect();

        let elapsed = started_at.elapsed();
        let result = FlushResult::from_outcomes(
            flush_id,
            target.to_string(),
            duplicates_skipped,
            outcomes,
            elapsed,
        );

        histogram!(
            METRIC_FLUSH_MS,
            "result" => if result.is_success() { "ok" } else { "partial" }
        )
        .record(elapsed.as_secs_f64() * 1000.0);

        // Observable: log dispatch complete
        if result.is_success() {
            info!(
                flush_id = %flush_id,
                attempted = result.attempted,
                succeeded = result.succeeded,
                duplicates_skipped,
                elapsed_ms = result.elapsed_ms,
                "Ban dispatch complete"
            );
        } else {
            warn!(
                flush_id = %flush_id,
                attempted = result.attempted,
                succeeded = result.succeeded,
                failed = result.failed,
                elapsed_ms = result.elapsed_ms,
                "Ban dispatch completed with failures"
            );
        }

        result
    }

    async fn send_with_retry(&self, target: &str, entry: BanTarget) -> EntryOutcome {
        let max_attempts = self.config.max_attempts();
        let mut attempt = 1;

        loop {
            let result = self.send_once(target, &entry).await;
            let outcome = match &result {
                Ok(_) => "success",
                Err(reason) => reason.label(),
            };
            counter!(
                METRIC_BAN_REQUESTS_TOTAL,
                "method" => entry.ban_method(),
                "outcome" => outcome
            )
            .increment(1);

            match result {
                Ok(code) => {
                    debug!(ban = %entry, status = code, attempt, "Ban accepted");
                    return EntryOutcome {
                        target: entry,
                        attempts: attempt,
                        result: Ok(code),
                    };
                }
                Err(reason) if attempt < max_attempts && reason.is_retryable() => {
                    debug!(ban = %entry, attempt, reason = %reason, "Ban failed, retrying");
                    tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    attempt += 1;
                }
                Err(reason) => {
                    warn!(ban = %entry, attempts = attempt, reason = %reason, "Ban failed");
                    return EntryOutcome {
                        target: entry,
                        attempts: attempt,
                        result: Err(reason),
                    };
                }
            }
        }
    }

    async fn send_once(&self, target: &str, entry: &BanTarget) -> Result<u16, FailureReason> {
        let timeout = self.config.request_timeout();
        match tokio::time::timeout(timeout, self.transport.send(target, entry)).await {
            Err(_) => Err(FailureReason::timeout(timeout)),
            Ok(Err(TransportError::InvalidRequest(message))) => {
                Err(FailureReason::InvalidRequest { message })
            }
            Ok(Err(err)) => Err(FailureReason::Transport {
                message: err.to_string(),
            }),
            Ok(Ok(code)) if (200..300).contains(&code) => Ok(code),
            Ok(Ok(code)) => Err(FailureReason::Status { code }),
        }
    }

    /// Get the underlying config.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }
}
