//! Aggregate outcome of a flush.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::ban::BanTarget;

/// Why a single ban request did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The cache server answered with a non-2xx status.
    Status { code: u16 },
    /// The request never produced a response.
    Transport { message: String },
    /// No response arrived within the per-request timeout.
    Timeout { after_ms: u64 },
    /// The request could not be built; resending it cannot help.
    InvalidRequest { message: String },
}

impl FailureReason {
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            after_ms: after.as_millis() as u64,
        }
    }

    /// Short label used for the `outcome` metric dimension.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Transport { .. } => "transport",
            Self::Timeout { .. } => "timeout",
            Self::InvalidRequest { .. } => "invalid_request",
        }
    }

    /// False for failures that would repeat identically on every attempt.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest { .. })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { code } => write!(f, "cache server responded with status {code}"),
            Self::Transport { message } => write!(f, "transport error: {message}"),
            Self::Timeout { after_ms } => write!(f, "timed out after {after_ms}ms"),
            Self::InvalidRequest { message } => write!(f, "invalid request: {message}"),
        }
    }
}

/// A ban entry that failed after exhausting its attempts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanFailure {
    pub target: BanTarget,
    pub reason: FailureReason,
    pub attempts: u32,
}

/// Final outcome for one planned entry.
#[derive(Debug, Clone)]
pub(crate) struct EntryOutcome {
    pub target: BanTarget,
    pub attempts: u32,
    pub result: Result<u16, FailureReason>,
}

/// Summary returned by every completed flush, including partially failed ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlushResult {
    /// Correlates this flush with its log lines.
    pub flush_id: Uuid,
    /// Resolved cache-server base URL; empty when nothing was pending.
    pub target: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub duplicates_skipped: usize,
    /// Failed entries in issue order.
    pub failures: Vec<BanFailure>,
    pub elapsed_ms: u64,
}

impl FlushResult {
    /// Result of flushing an empty buffer.
    pub fn empty(flush_id: Uuid) -> Self {
        Self {
            flush_id,
            target: String::new(),
            attempted: 0,
            succeeded: 0,
            failed: 0,
            duplicates_skipped: 0,
            failures: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub(crate) fn from_outcomes(
        flush_id: Uuid,
        target: String,
        duplicates_skipped: usize,
        outcomes: Vec<EntryOutcome>,
        elapsed: Duration,
    ) -> Self {
        let attempted = outcomes.len();
        let failures: Vec<BanFailure> = outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.result {
                Ok(_) => None,
                Err(reason) => Some(BanFailure {
                    target: outcome.target,
                    reason,
                    attempts: outcome.attempts,
                }),
            })
            .collect();

        Self {
            flush_id,
            target,
            attempted,
            succeeded: attempted - failures.len(),
            failed: failures.len(),
            duplicates_skipped,
            failures,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// True when every attempted entry succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for FlushResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flush {}: attempted={} succeeded={} failed={} duplicates_skipped={}",
            self.flush_id, self.attempted, self.succeeded, self.failed, self.duplicates_skipped
        )
    }
}
