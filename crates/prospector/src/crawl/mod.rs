//! Continuation-driven crawl: a shared task queue, a fixed worker pool, and
//! drivers that re-enqueue themselves until their phase converges.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use sea_orm::DatabaseConnection;

use crate::config::CrawlConfig;
use crate::github::GitHubClient;

pub mod context;
pub mod engine;
pub mod filter;
pub mod scheduler;
pub mod task;

pub use context::CrawlContext;
pub use engine::CrawlError;
pub use filter::RepoFilter;
pub use scheduler::{TaskQueue, WorkerPool};
pub use task::CrawlTask;

/// Run a crawl to completion: seed the configured drivers, spawn the worker
/// pool, and wait for the queue to close and drain.
pub async fn run(
    config: CrawlConfig,
    db: DatabaseConnection,
    shutdown: Arc<AtomicBool>,
) -> Result<(), CrawlError> {
    let client = GitHubClient::new(&config)?;
    run_with_client(config, db, client, shutdown).await
}

/// [`run`] with a caller-supplied client, the seam tests use to substitute
/// a scripted transport.
pub async fn run_with_client(
    config: CrawlConfig,
    db: DatabaseConnection,
    client: GitHubClient,
    shutdown: Arc<AtomicBool>,
) -> Result<(), CrawlError> {
    let scale = config.scale;
    let ctx = CrawlContext::new(config, db, client, shutdown);
    ctx.seed();

    let pool = WorkerPool::spawn(Arc::clone(&ctx), scale);
    pool.join().await;

    tracing::info!("crawl finished");
    Ok(())
}
