//! Pending ban buffer.
//!
//! Collects exact paths and regex patterns between flushes. Appends and drains
//! share one mutex, so a drain observes either all or none of a concurrent
//! append and no entry is handed out twice.

use std::sync::{Mutex, MutexGuard};

use metrics::gauge;
use tracing::{debug, warn};

use crate::domain::ban::{BanTarget, PendingBanSet};

const METRIC_BAN_PENDING: &str = "vanish_ban_pending";

/// In-memory, insertion-ordered ban buffer.
#[derive(Debug, Default)]
pub struct BanAccumulator {
    pending: Mutex<PendingBanSet>,
}

impl BanAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a ban target on the list matching its kind.
    pub fn add(&self, target: BanTarget) {
        match target {
            BanTarget::ExactPath { path } => self.add_exact_path(path),
            BanTarget::RegexPattern { pattern } => self.add_regex_pattern(pattern),
        }
    }

    pub fn add_exact_path(&self, path: impl Into<String>) {
        let path = path.into();
        debug!(path = %path, "Ban path queued");
        let mut pending = self.buffer("add_exact_path");
        pending.exact_paths.push(path);
        gauge!(METRIC_BAN_PENDING).set(pending.len() as f64);
    }

    /// Queue a regex ban verbatim; the cache server owns pattern validation.
    pub fn add_regex_pattern(&self, pattern: impl Into<String>) {
        let pattern = pattern.into();
        debug!(pattern = %pattern, "Ban pattern queued");
        let mut pending = self.buffer("add_regex_pattern");
        pending.regex_patterns.push(pattern);
        gauge!(METRIC_BAN_PENDING).set(pending.len() as f64);
    }

    /// Take everything queued so far, leaving the buffer empty.
    pub fn drain(&self) -> PendingBanSet {
        let drained = std::mem::take(&mut *self.buffer("drain"));
        gauge!(METRIC_BAN_PENDING).set(0.0);
        drained
    }

    pub fn len(&self) -> usize {
        self.buffer("len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer("is_empty").is_empty()
    }

    fn buffer(&self, op: &'static str) -> MutexGuard<'_, PendingBanSet> {
        self.pending.lock().unwrap_or_else(|poisoned| {
            warn!(
                op,
                lock_kind = "mutex.lock",
                result = "poisoned_recovered",
                hint = "a panic interrupted another append or drain",
                "Recovered from poisoned ban buffer lock"
            );
            poisoned.into_inner()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn drain_preserves_insertion_order_and_duplicates() {
        let acc = BanAccumulator::new();
        acc.add_exact_path("/a");
        acc.add_exact_path("/b");
        acc.add_exact_path("/a");
        acc.add_regex_pattern("^/tag/");

        let drained = acc.drain();
        assert_eq!(drained.exact_paths, vec!["/a", "/b", "/a"]);
        assert_eq!(drained.regex_patterns, vec!["^/tag/"]);
    }

    #[test]
    fn drain_leaves_buffer_empty() {
        let acc = BanAccumulator::new();
        acc.add_exact_path("/a");
        assert_eq!(acc.len(), 1);

        let _ = acc.drain();
        assert!(acc.is_empty());
        assert!(acc.drain().is_empty());
    }

    #[test]
    fn add_routes_by_variant() {
        let acc = BanAccumulator::new();
        acc.add(BanTarget::exact_path("/post"));
        acc.add(BanTarget::regex(".*\\.css$"));

        let drained = acc.drain();
        assert_eq!(drained.exact_paths, vec!["/post"]);
        assert_eq!(drained.regex_patterns, vec![".*\\.css$"]);
    }

    #[test]
    fn regex_patterns_are_not_validated() {
        let acc = BanAccumulator::new();
        acc.add_regex_pattern("([unclosed");
        assert_eq!(acc.drain().regex_patterns, vec!["([unclosed"]);
    }

    #[test]
    fn concurrent_appends_are_neither_lost_nor_duplicated() {
        let acc = Arc::new(BanAccumulator::new());
        let writers: Vec<_> = (0..8)
            .map(|worker| {
                let acc = Arc::clone(&acc);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        acc.add_exact_path(format!("/w{worker}/{i}"));
                    }
                })
            })
            .collect();

        let mut seen = Vec::new();
        while writers.iter().any(|w| !w.is_finished()) {
            seen.extend(acc.drain().exact_paths);
        }
        for writer in writers {
            writer.join().expect("writer thread");
        }
        seen.extend(acc.drain().exact_paths);

        let unique: HashSet<_> = seen.iter().cloned().collect();
        assert_eq!(seen.len(), 8 * 250);
        assert_eq!(unique.len(), seen.len());
    }

    #[test]
    fn accumulator_recovers_from_poisoned_lock() {
        let acc = BanAccumulator::new();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = acc.pending.lock().expect("buffer lock should be acquired");
            panic!("poison buffer lock");
        }));

        acc.add_exact_path("/after-panic");
        assert_eq!(acc.len(), 1);
    }
}
