//! Flush plan generation.
//!
//! Turns a drained `PendingBanSet` into the ordered list of ban requests to issue.

use std::collections::HashSet;
use std::fmt;

use crate::domain::ban::{BanTarget, PendingBanSet};

/// Ban requests for one flush, in issue order.
///
/// Exact paths come first, then regex patterns, each in insertion order. With
/// dedup enabled only the first occurrence of a target survives.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BanPlan {
    pub entries: Vec<BanTarget>,
    /// Number of queued targets dropped as repeats.
    pub duplicates_skipped: usize,
}

impl fmt::Display for BanPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let urls = self
            .entries
            .iter()
            .filter(|entry| matches!(entry, BanTarget::ExactPath { .. }))
            .count();
        write!(
            f,
            "BanPlan {{ url: {}, regex: {}, duplicates_skipped: {} }}",
            urls,
            self.entries.len() - urls,
            self.duplicates_skipped,
        )
    }
}

impl BanPlan {
    pub fn from_pending(pending: &PendingBanSet, dedup: bool) -> Self {
        if !dedup {
            return Self {
                entries: pending.targets().collect(),
                duplicates_skipped: 0,
            };
        }

        let mut seen = HashSet::new();
        let mut plan = Self::default();
        for target in pending.targets() {
            if seen.contains(&target) {
                plan.duplicates_skipped += 1;
                continue;
            }
            seen.insert(target.clone());
            plan.entries.push(target);
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(paths: &[&str], patterns: &[&str]) -> PendingBanSet {
        PendingBanSet {
            exact_paths: paths.iter().map(|p| p.to_string()).collect(),
            regex_patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let plan = BanPlan::from_pending(&pending(&["/a", "/b", "/a"], &["^/x", "^/x"]), true);

        assert_eq!(
            plan.entries,
            vec![
                BanTarget::exact_path("/a"),
                BanTarget::exact_path("/b"),
                BanTarget::regex("^/x"),
            ]
        );
        assert_eq!(plan.duplicates_skipped, 2);
    }

    #[test]
    fn same_key_in_both_lists_is_not_a_duplicate() {
        let plan = BanPlan::from_pending(&pending(&["/a"], &["/a"]), true);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.duplicates_skipped, 0);
    }

    #[test]
    fn dedup_disabled_issues_everything() {
        let plan = BanPlan::from_pending(&pending(&["/a", "/a"], &[]), false);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.duplicates_skipped, 0);
    }

    #[test]
    fn empty_pending_set_yields_empty_plan() {
        let plan = BanPlan::from_pending(&PendingBanSet::default(), true);
        assert!(plan.is_empty());
    }

    #[test]
    fn display_summarizes_counts() {
        let plan = BanPlan::from_pending(&pending(&["/a", "/a"], &["^/b"]), true);
        assert_eq!(
            plan.to_string(),
            "BanPlan { url: 1, regex: 1, duplicates_skipped: 1 }"
        );
    }
}
