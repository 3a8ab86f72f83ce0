//! The unit of crawl work.

use std::fmt;

use uuid::Uuid;

/// One schedulable step of a crawl.
///
/// Listing tasks fan out into more tasks; detail tasks are leaves; the
/// drivers (`ListRepos`, `PollCommits`, `PollPulls`) re-enqueue themselves
/// until their phase converges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlTask {
    /// Walk the organization repository listing and fan out per-repo
    /// listing tasks.
    ListRepos,
    /// Walk one repository's commit listing and record natural keys.
    ListCommits { repo: String },
    /// Walk one repository's pull listing and record natural keys.
    ListPulls { repo: String },
    /// Fetch one commit and write its enrichment fields by record id.
    CommitDetail { repo: String, sha: String, id: Uuid },
    /// Fetch one pull and write its enrichment fields by record id.
    PullDetail { repo: String, number: i64, id: Uuid },
    /// Scan the store for unenriched commits and fan out detail tasks.
    PollCommits,
    /// Scan the store for unenriched pulls and fan out detail tasks.
    PollPulls,
}

impl CrawlTask {
    /// Drivers own a slot in the pool's driver count; the queue closes when
    /// the last one finishes.
    #[must_use]
    pub fn is_driver(&self) -> bool {
        matches!(
            self,
            CrawlTask::ListRepos | CrawlTask::PollCommits | CrawlTask::PollPulls
        )
    }
}

impl fmt::Display for CrawlTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlTask::ListRepos => write!(f, "list-repos"),
            CrawlTask::ListCommits { repo } => write!(f, "list-commits {repo}"),
            CrawlTask::ListPulls { repo } => write!(f, "list-pulls {repo}"),
            CrawlTask::CommitDetail { repo, sha, .. } => {
                write!(f, "commit-detail {repo}@{sha}")
            }
            CrawlTask::PullDetail { repo, number, .. } => {
                write!(f, "pull-detail {repo}#{number}")
            }
            CrawlTask::PollCommits => write!(f, "poll-commits"),
            CrawlTask::PollPulls => write!(f, "poll-pulls"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(CrawlTask::ListRepos.to_string(), "list-repos");
        assert_eq!(
            CrawlTask::ListCommits {
                repo: "widgets".to_string()
            }
            .to_string(),
            "list-commits widgets"
        );
        assert_eq!(
            CrawlTask::CommitDetail {
                repo: "widgets".to_string(),
                sha: "abc123".to_string(),
                id: Uuid::nil(),
            }
            .to_string(),
            "commit-detail widgets@abc123"
        );
        assert_eq!(
            CrawlTask::PullDetail {
                repo: "widgets".to_string(),
                number: 42,
                id: Uuid::nil(),
            }
            .to_string(),
            "pull-detail widgets#42"
        );
    }

    #[test]
    fn test_is_driver() {
        assert!(CrawlTask::ListRepos.is_driver());
        assert!(CrawlTask::PollCommits.is_driver());
        assert!(CrawlTask::PollPulls.is_driver());
        assert!(
            !CrawlTask::ListCommits {
                repo: "widgets".to_string()
            }
            .is_driver()
        );
    }
}
