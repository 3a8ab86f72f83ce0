//! Task execution: discovery, enrichment, and the self-requeueing drivers.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::github::GitHubError;
use crate::github::types::{CommitDetail, CommitSummary, PullDetail, PullSummary, RepoSummary};
use crate::store::{self, CommitEnrichment, PullEnrichment, StoreError};

use super::context::CrawlContext;
use super::filter::RepoFilter;
use super::task::CrawlTask;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Api(#[from] GitHubError),
}

/// Execute one task. Errors are fatal to the task only; the worker loop
/// logs them and moves on.
pub async fn execute(ctx: &Arc<CrawlContext>, task: CrawlTask) -> Result<(), CrawlError> {
    match task {
        CrawlTask::ListRepos => {
            let res = list_repos(ctx).await;
            ctx.discovery_done();
            res
        }
        CrawlTask::ListCommits { repo } => {
            let res = list_commits(ctx, &repo).await;
            ctx.discovery_done();
            res
        }
        CrawlTask::ListPulls { repo } => {
            let res = list_pulls(ctx, &repo).await;
            ctx.discovery_done();
            res
        }
        CrawlTask::CommitDetail { repo, sha, id } => commit_detail(ctx, &repo, &sha, id).await,
        CrawlTask::PullDetail { repo, number, id } => pull_detail(ctx, &repo, number, id).await,
        CrawlTask::PollCommits => poll_commits(ctx).await,
        CrawlTask::PollPulls => poll_pulls(ctx).await,
    }
}

/// Requeue a driver task, or release its slot when shutdown was requested
/// or the queue is already closed.
fn requeue_driver(ctx: &CrawlContext, task: CrawlTask) {
    if ctx.is_shutdown() || !ctx.queue.push(task) {
        ctx.driver_done();
    }
}

// ---------- discovery ----------

/// Discovery driver: walk the org listing, filter, and fan out per-repo
/// listing tasks.
async fn list_repos(ctx: &Arc<CrawlContext>) -> Result<(), CrawlError> {
    let org = ctx.config.org.clone();
    let watermark = ctx.begin_pass();

    let mut ignores = ctx.config.ignores.clone();
    match store::ignore::load(&ctx.db, &org).await {
        Ok(stored) => ignores.extend(stored),
        Err(err) => {
            tracing::error!(org, error = %err, "loading ignore list failed");
            ctx.driver_done();
            return Err(err.into());
        }
    }
    let filter = RepoFilter::new(ignores, watermark);

    let mut pages = ctx.client.paginate::<RepoSummary>(ctx.client.repos_url(&org));
    let mut seen = 0usize;
    let mut queued = 0usize;
    loop {
        match pages.next_page().await {
            Ok(Some(repos)) => {
                for repo in repos {
                    seen += 1;
                    if !filter.should_crawl(&repo) {
                        continue;
                    }
                    queued += 1;
                    ctx.push_discovery(CrawlTask::ListCommits {
                        repo: repo.name.clone(),
                    });
                    if ctx.config.pulls {
                        ctx.push_discovery(CrawlTask::ListPulls { repo: repo.name });
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                tracing::error!(org, error = %err, "repo listing failed mid-pass");
                break;
            }
        }
    }

    ctx.finish_pass();
    tracing::info!(org, seen, queued, "discovery pass complete");

    if ctx.config.loop_mode {
        if queued == 0 {
            tokio::time::sleep(ctx.config.delay).await;
        }
        if ctx.is_shutdown() || !ctx.push_discovery(CrawlTask::ListRepos) {
            ctx.driver_done();
        }
    } else {
        ctx.driver_done();
    }
    Ok(())
}

/// Walk one repository's commit listing, recording each sha once.
async fn list_commits(ctx: &Arc<CrawlContext>, repo: &str) -> Result<(), CrawlError> {
    let org = &ctx.config.org;
    let url = ctx
        .client
        .commits_url(org, repo, ctx.config.since, ctx.config.until);

    let mut pages = ctx.client.paginate::<CommitSummary>(url);
    let mut seen = 0usize;
    let mut created = 0usize;
    while let Some(items) = pages.next_page().await? {
        for commit in items {
            seen += 1;
            if store::commit::find_or_create(&ctx.db, org, repo, &commit.sha).await? {
                created += 1;
            }
        }
    }

    tracing::info!(org, repo, seen, created, "commit discovery complete");
    Ok(())
}

/// Walk one repository's pull listing, recording each number once.
async fn list_pulls(ctx: &Arc<CrawlContext>, repo: &str) -> Result<(), CrawlError> {
    let org = &ctx.config.org;
    let url = ctx.client.pulls_url(org, repo);

    let mut pages = ctx.client.paginate::<PullSummary>(url);
    let mut seen = 0usize;
    let mut created = 0usize;
    while let Some(items) = pages.next_page().await? {
        for pull in items {
            seen += 1;
            if store::pull::find_or_create(&ctx.db, org, repo, pull.number).await? {
                created += 1;
            }
        }
    }

    tracing::info!(org, repo, seen, created, "pull discovery complete");
    Ok(())
}

// ---------- enrichment ----------

/// Fetch one commit and write its enrichment fields by record id.
///
/// A fetch or decode failure is logged and the task dropped; the row stays
/// unenriched and the next poll picks it up again.
async fn commit_detail(
    ctx: &Arc<CrawlContext>,
    repo: &str,
    sha: &str,
    id: Uuid,
) -> Result<(), CrawlError> {
    let org = &ctx.config.org;
    let url = ctx.client.commit_url(org, repo, sha);

    let detail: CommitDetail = match ctx.client.get_json(&url).await {
        Ok(detail) => detail,
        Err(err) => {
            tracing::warn!(org, repo, sha, %id, error = %err, "commit fetch failed, will re-poll");
            return Ok(());
        }
    };

    let (email, date) = detail
        .commit
        .author
        .map(|a| (a.email, a.date))
        .unwrap_or((None, None));
    let stats = detail.stats.unwrap_or_default();

    store::commit::enrich(
        &ctx.db,
        id,
        CommitEnrichment {
            author_email: email.unwrap_or_default(),
            author_date: date,
            message: detail.commit.message.unwrap_or_default(),
            additions: stats.additions,
            deletions: stats.deletions,
            total: stats.total,
        },
    )
    .await?;

    tracing::debug!(org, repo, sha, %id, "commit enriched");
    Ok(())
}

/// Fetch one pull and write its enrichment fields by record id.
async fn pull_detail(
    ctx: &Arc<CrawlContext>,
    repo: &str,
    number: i64,
    id: Uuid,
) -> Result<(), CrawlError> {
    let org = &ctx.config.org;
    let url = ctx.client.pull_url(org, repo, number);

    let detail: PullDetail = match ctx.client.get_json(&url).await {
        Ok(detail) => detail,
        Err(err) => {
            tracing::warn!(org, repo, number, %id, error = %err, "pull fetch failed, will re-poll");
            return Ok(());
        }
    };

    store::pull::enrich(
        &ctx.db,
        id,
        PullEnrichment {
            title: detail.title.unwrap_or_default(),
            comments: detail.comments.unwrap_or_default(),
            commits: detail.commits.unwrap_or_default(),
            additions: detail.additions.unwrap_or_default(),
            deletions: detail.deletions.unwrap_or_default(),
            changed_files: detail.changed_files.unwrap_or_default(),
        },
    )
    .await?;

    tracing::debug!(org, repo, number, %id, "pull enriched");
    Ok(())
}

/// Enrichment driver for commits: scan for unenriched rows, fan out detail
/// tasks, and requeue until the scan comes back empty.
async fn poll_commits(ctx: &Arc<CrawlContext>) -> Result<(), CrawlError> {
    if ctx.is_shutdown() {
        ctx.driver_done();
        return Ok(());
    }

    let org = &ctx.config.org;
    let rows = match store::commit::find_unenriched(&ctx.db, org, ctx.config.query_limit).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(org, error = %err, "unenriched commit scan failed");
            ctx.driver_done();
            return Err(err.into());
        }
    };

    if rows.is_empty() {
        // An empty scan only means convergence once no discovery task can
        // still write rows behind it.
        if ctx.config.loop_mode || ctx.discovery_active() {
            tokio::time::sleep(ctx.config.delay).await;
            requeue_driver(ctx, CrawlTask::PollCommits);
        } else {
            tracing::info!(org, "commit enrichment converged");
            ctx.driver_done();
        }
        return Ok(());
    }

    tracing::debug!(org, pending = rows.len(), "queueing commit enrichment");
    for row in rows {
        ctx.queue.push(CrawlTask::CommitDetail {
            repo: row.repo,
            sha: row.sha,
            id: row.id,
        });
    }
    requeue_driver(ctx, CrawlTask::PollCommits);
    Ok(())
}

/// Enrichment driver for pulls; mirrors [`poll_commits`].
async fn poll_pulls(ctx: &Arc<CrawlContext>) -> Result<(), CrawlError> {
    if ctx.is_shutdown() {
        ctx.driver_done();
        return Ok(());
    }

    let org = &ctx.config.org;
    let rows = match store::pull::find_unenriched(&ctx.db, org, ctx.config.query_limit).await {
        Ok(rows) => rows,
        Err(err) => {
            tracing::error!(org, error = %err, "unenriched pull scan failed");
            ctx.driver_done();
            return Err(err.into());
        }
    };

    if rows.is_empty() {
        if ctx.config.loop_mode || ctx.discovery_active() {
            tokio::time::sleep(ctx.config.delay).await;
            requeue_driver(ctx, CrawlTask::PollPulls);
        } else {
            tracing::info!(org, "pull enrichment converged");
            ctx.driver_done();
        }
        return Ok(());
    }

    tracing::debug!(org, pending = rows.len(), "queueing pull enrichment");
    for row in rows {
        ctx.queue.push(CrawlTask::PullDetail {
            repo: row.repo,
            number: row.number,
            id: row.id,
        });
    }
    requeue_driver(ctx, CrawlTask::PollPulls);
    Ok(())
}
