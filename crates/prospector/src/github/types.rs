//! Wire types for the source-hosting API.
//!
//! Only the fields the crawler consumes are modeled; everything else in the
//! JSON payloads is ignored by serde.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

/// One repository from an org repository listing.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    #[serde(default)]
    pub pushed_at: Option<DateTime<Utc>>,
}

/// One commit from a repository commit listing. The listing payload carries
/// more, but discovery only needs the sha.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
}

/// A single commit fetched from the commit detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub stats: Option<CommitStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitAuthor {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CommitStats {
    #[serde(default)]
    pub additions: i32,
    #[serde(default)]
    pub deletions: i32,
    #[serde(default)]
    pub total: i32,
}

/// One pull request from a repository pull listing.
#[derive(Debug, Clone, Deserialize)]
pub struct PullSummary {
    pub number: i64,
}

/// A single pull request fetched from the pull detail endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullDetail {
    pub number: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comments: Option<i32>,
    #[serde(default)]
    pub commits: Option<i32>,
    #[serde(default)]
    pub additions: Option<i32>,
    #[serde(default)]
    pub deletions: Option<i32>,
    #[serde(default)]
    pub changed_files: Option<i32>,
}

/// Response body of the `/rate_limit` endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitResources {
    pub core: RateLimitWindow,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RateLimitWindow {
    pub limit: u64,
    pub remaining: u64,
    /// Unix epoch seconds at which the window resets.
    pub reset: i64,
}
