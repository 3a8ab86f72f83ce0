//! Typed configuration for a crawl run.
//!
//! The CLI layer (flags, config file, environment) assembles a [`CrawlConfig`]
//! and hands it to the engine; nothing in the core reads the environment.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Which phases a crawl run executes.
///
/// The discovery and enrichment phases are independently idempotent, so any
/// combination is valid; `Both` seeds both drivers on the same worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlMode {
    /// Walk the organization and record natural keys (repos -> commits/pulls).
    Discover,
    /// Poll the store for unenriched rows and fill in their metadata.
    Enrich,
    /// Run both phases interleaved on the shared pool.
    Both,
}

impl CrawlMode {
    /// Whether the discovery driver should be seeded.
    pub fn discovers(self) -> bool {
        matches!(self, Self::Discover | Self::Both)
    }

    /// Whether the enrichment drivers should be seeded.
    pub fn enriches(self) -> bool {
        matches!(self, Self::Enrich | Self::Both)
    }
}

/// How the rate governor waits when the upstream quota is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottlePolicy {
    /// Sleep a fixed cool-down and re-check.
    ///
    /// The remaining count can stay at zero for a short window after the
    /// reset epoch passes, so a fixed delay with re-check is the safer
    /// default.
    Cooldown(Duration),
    /// Sleep until the reset epoch reported by the quota headers.
    UntilReset,
}

/// Immutable configuration for a crawl run.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Organization to crawl.
    pub org: String,
    /// API token (sent as a bearer authorization header).
    pub token: String,
    /// Base URL of the upstream API.
    pub base_url: String,
    /// Which phases to run.
    pub mode: CrawlMode,
    /// Number of workers sharing the task queue.
    pub scale: usize,
    /// Row limit for each enrichment poll query.
    pub query_limit: u64,
    /// Page size requested from list endpoints.
    pub per_page: u32,
    /// Repository names excluded from discovery (in addition to the
    /// `ignored_repos` table).
    pub ignores: HashSet<String>,
    /// Lower time bound for commit listings and the repository filter.
    pub since: Option<DateTime<Utc>>,
    /// Upper time bound for commit listings.
    pub until: Option<DateTime<Utc>>,
    /// Keep crawling: drivers re-enqueue themselves instead of closing the
    /// queue when a pass completes.
    pub loop_mode: bool,
    /// Cool-down between passes that found nothing, and the fixed throttle
    /// delay under `ThrottlePolicy::Cooldown`.
    pub delay: Duration,
    /// Throttle behavior when the quota is exhausted.
    pub throttle: ThrottlePolicy,
    /// Optional proactive pacing bound (requests per second). `None` relies
    /// on the reactive governor alone.
    pub requests_per_second: Option<u32>,
    /// Remember validator tokens per URL and send conditional requests.
    pub etag_cache: bool,
    /// Whether to walk pull requests in addition to commits.
    pub pulls: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            org: String::new(),
            token: String::new(),
            base_url: "https://api.github.com".to_string(),
            mode: CrawlMode::Both,
            scale: 5,
            query_limit: 1000,
            per_page: 100,
            ignores: HashSet::new(),
            since: None,
            until: None,
            loop_mode: false,
            delay: Duration::from_secs(15),
            throttle: ThrottlePolicy::Cooldown(Duration::from_secs(15)),
            requests_per_second: None,
            etag_cache: true,
            pulls: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crawl_config_default() {
        let config = CrawlConfig::default();

        assert_eq!(config.scale, 5);
        assert_eq!(config.query_limit, 1000);
        assert_eq!(config.per_page, 100);
        assert_eq!(config.delay, Duration::from_secs(15));
        assert!(!config.loop_mode);
        assert!(config.etag_cache);
        assert_eq!(config.base_url, "https://api.github.com");
    }

    #[test]
    fn test_crawl_mode_phases() {
        assert!(CrawlMode::Discover.discovers());
        assert!(!CrawlMode::Discover.enriches());
        assert!(CrawlMode::Enrich.enriches());
        assert!(!CrawlMode::Enrich.discovers());
        assert!(CrawlMode::Both.discovers());
        assert!(CrawlMode::Both.enriches());
    }
}
