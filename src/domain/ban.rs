//! Ban targets and the pending ban set handed from the accumulator to the dispatcher.

use std::fmt;

use serde::Serialize;

pub const BAN_METHOD_HEADER: &str = "X-Ban-Method";
pub const BAN_URL_HEADER: &str = "X-Ban-Url";
pub const BAN_REGEX_HEADER: &str = "X-Ban-Regex";

/// A single cache-server ban instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BanTarget {
    /// Canonical request path, always starting with `/`, possibly carrying `?query` and `#fragment`.
    ExactPath { path: String },
    /// Pattern evaluated by the cache server; never rewritten on this side.
    RegexPattern { pattern: String },
}

impl BanTarget {
    /// Build an exact-path target, enforcing the leading slash.
    pub fn exact_path(path: impl Into<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self::ExactPath { path }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::RegexPattern {
            pattern: pattern.into(),
        }
    }

    /// Value for the `X-Ban-Method` header.
    pub fn ban_method(&self) -> &'static str {
        match self {
            Self::ExactPath { .. } => "url",
            Self::RegexPattern { .. } => "regex",
        }
    }

    /// Header carrying the ban key.
    pub fn ban_header(&self) -> &'static str {
        match self {
            Self::ExactPath { .. } => BAN_URL_HEADER,
            Self::RegexPattern { .. } => BAN_REGEX_HEADER,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::ExactPath { path } => path,
            Self::RegexPattern { pattern } => pattern,
        }
    }
}

impl fmt::Display for BanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ban_method(), self.key())
    }
}

/// Snapshot of everything queued since the last drain.
///
/// Duplicates are kept here; the flush-time plan decides whether to collapse them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingBanSet {
    pub exact_paths: Vec<String>,
    pub regex_patterns: Vec<String>,
}

impl PendingBanSet {
    pub fn len(&self) -> usize {
        self.exact_paths.len() + self.regex_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact_paths.is_empty() && self.regex_patterns.is_empty()
    }

    /// Exact paths first, then regex patterns, each in insertion order.
    pub fn targets(&self) -> impl Iterator<Item = BanTarget> + '_ {
        let paths = self
            .exact_paths
            .iter()
            .map(|path| BanTarget::ExactPath { path: path.clone() });
        let patterns = self
            .regex_patterns
            .iter()
            .map(|pattern| BanTarget::RegexPattern {
                pattern: pattern.clone(),
            });
        paths.chain(patterns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_path_enforces_leading_slash() {
        assert_eq!(BanTarget::exact_path("foo").key(), "/foo");
        assert_eq!(BanTarget::exact_path("/foo").key(), "/foo");
    }

    #[test]
    fn headers_follow_variant() {
        let url = BanTarget::exact_path("/a");
        assert_eq!(url.ban_method(), "url");
        assert_eq!(url.ban_header(), "X-Ban-Url");

        let regex = BanTarget::regex("^/tag/.*");
        assert_eq!(regex.ban_method(), "regex");
        assert_eq!(regex.ban_header(), "X-Ban-Regex");
        assert_eq!(regex.key(), "^/tag/.*");
    }

    #[test]
    fn display_is_method_prefixed() {
        assert_eq!(BanTarget::exact_path("/a?b=1").to_string(), "url:/a?b=1");
        assert_eq!(BanTarget::regex(".*").to_string(), "regex:.*");
    }

    #[test]
    fn pending_set_yields_paths_before_patterns() {
        let set = PendingBanSet {
            exact_paths: vec!["/a".into(), "/b".into()],
            regex_patterns: vec!["^/c".into()],
        };

        let targets: Vec<_> = set.targets().collect();
        assert_eq!(
            targets,
            vec![
                BanTarget::exact_path("/a"),
                BanTarget::exact_path("/b"),
                BanTarget::regex("^/c"),
            ]
        );
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
        assert!(PendingBanSet::default().is_empty());
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(BanTarget::exact_path("/a")).expect("serialize");
        assert_eq!(json["kind"], "exact_path");
        assert_eq!(json["path"], "/a");
    }
}
