//! Repository filtering for discovery passes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::github::types::RepoSummary;

/// Decides which repositories a discovery pass descends into.
///
/// A repo is skipped when it is in the ignore set (configured ignores plus
/// the org's `ignored_repos` rows, merged by the caller), or when its
/// `pushed_at` precedes the active watermark. A repo without a `pushed_at`
/// is treated as unchanged whenever a watermark is active.
#[derive(Debug, Clone)]
pub struct RepoFilter {
    ignores: HashSet<String>,
    watermark: Option<DateTime<Utc>>,
}

impl RepoFilter {
    #[must_use]
    pub fn new(ignores: HashSet<String>, watermark: Option<DateTime<Utc>>) -> Self {
        Self { ignores, watermark }
    }

    #[must_use]
    pub fn should_crawl(&self, repo: &RepoSummary) -> bool {
        if self.ignores.contains(&repo.name) {
            tracing::debug!(repo = %repo.name, "repo ignored");
            return false;
        }

        match (self.watermark, repo.pushed_at) {
            (Some(watermark), Some(pushed_at)) => {
                if pushed_at < watermark {
                    tracing::debug!(
                        repo = %repo.name,
                        %pushed_at,
                        %watermark,
                        "repo unchanged since watermark"
                    );
                    false
                } else {
                    true
                }
            }
            (Some(_), None) => false,
            (None, _) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(name: &str, pushed_at: Option<&str>) -> RepoSummary {
        RepoSummary {
            name: name.to_string(),
            pushed_at: pushed_at.map(|s| s.parse().unwrap()),
        }
    }

    fn ts(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_no_watermark_crawls_everything_not_ignored() {
        let filter = RepoFilter::new(HashSet::new(), None);
        assert!(filter.should_crawl(&repo("a", Some("2020-01-01T00:00:00Z"))));
        assert!(filter.should_crawl(&repo("b", None)));
    }

    #[test]
    fn test_ignored_repo_is_skipped_regardless_of_timestamp() {
        let ignores: HashSet<String> = ["legacy".to_string()].into();
        let filter = RepoFilter::new(ignores, None);
        assert!(!filter.should_crawl(&repo("legacy", Some("2026-01-01T00:00:00Z"))));
        assert!(filter.should_crawl(&repo("active", Some("2026-01-01T00:00:00Z"))));
    }

    #[test]
    fn test_watermark_drops_stale_repos() {
        let filter = RepoFilter::new(HashSet::new(), Some(ts("2026-01-15T00:00:00Z")));
        assert!(!filter.should_crawl(&repo("stale", Some("2026-01-01T00:00:00Z"))));
        assert!(filter.should_crawl(&repo("fresh", Some("2026-02-01T00:00:00Z"))));
    }

    #[test]
    fn test_push_at_watermark_boundary_is_kept() {
        let filter = RepoFilter::new(HashSet::new(), Some(ts("2026-01-15T00:00:00Z")));
        assert!(filter.should_crawl(&repo("exact", Some("2026-01-15T00:00:00Z"))));
    }

    #[test]
    fn test_missing_pushed_at_with_watermark_is_skipped() {
        let filter = RepoFilter::new(HashSet::new(), Some(ts("2026-01-15T00:00:00Z")));
        assert!(!filter.should_crawl(&repo("unknown", None)));
    }
}
