//! Shared state for one crawl run.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use chrono::{DateTime, Utc};
use sea_orm::DatabaseConnection;

use crate::config::CrawlConfig;
use crate::github::GitHubClient;

use super::scheduler::TaskQueue;
use super::task::CrawlTask;

/// Push-time watermark for repository filtering.
///
/// `current` is the filter bound for the running pass; `next` is captured
/// when a pass begins and promoted when it finishes, so a pass never filters
/// against its own start time.
#[derive(Debug, Default)]
struct Watermark {
    current: Option<DateTime<Utc>>,
    next: Option<DateTime<Utc>>,
}

/// Everything a task needs, threaded through the pool as one `Arc`.
pub struct CrawlContext {
    pub config: CrawlConfig,
    pub db: DatabaseConnection,
    pub client: GitHubClient,
    pub queue: TaskQueue,
    shutdown: Arc<AtomicBool>,
    drivers: AtomicUsize,
    discovery: AtomicUsize,
    watermark: Mutex<Watermark>,
}

impl CrawlContext {
    #[must_use]
    pub fn new(
        config: CrawlConfig,
        db: DatabaseConnection,
        client: GitHubClient,
        shutdown: Arc<AtomicBool>,
    ) -> Arc<Self> {
        Arc::new(Self {
            config,
            db,
            client,
            queue: TaskQueue::new(),
            shutdown,
            drivers: AtomicUsize::new(0),
            discovery: AtomicUsize::new(0),
            watermark: Mutex::new(Watermark::default()),
        })
    }

    /// Seed the driver tasks for the configured mode. With nothing to seed
    /// the queue closes immediately so the pool does not hang.
    pub fn seed(&self) {
        let mut seeded = 0usize;
        if self.config.mode.discovers() {
            self.driver_started();
            self.push_discovery(CrawlTask::ListRepos);
            seeded += 1;
        }
        if self.config.mode.enriches() {
            self.driver_started();
            self.queue.push(CrawlTask::PollCommits);
            seeded += 1;
            if self.config.pulls {
                self.driver_started();
                self.queue.push(CrawlTask::PollPulls);
                seeded += 1;
            }
        }
        if seeded == 0 {
            self.queue.close();
        }
    }

    // ---------- shutdown ----------

    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    // ---------- driver accounting ----------

    pub fn driver_started(&self) {
        self.drivers.fetch_add(1, Ordering::SeqCst);
    }

    /// A driver that will not requeue itself releases its slot; the last one
    /// out closes the queue.
    pub fn driver_done(&self) {
        if self.drivers.fetch_sub(1, Ordering::SeqCst) == 1 {
            tracing::info!("last driver finished, closing queue");
            self.queue.close();
        }
    }

    // ---------- discovery accounting ----------

    /// Whether any discovery task (org listing or per-repo listing) is still
    /// queued or executing. One-shot enrichment drivers keep polling while
    /// this holds, so a scan that lands before discovery has written its rows
    /// does not converge early.
    #[must_use]
    pub fn discovery_active(&self) -> bool {
        self.discovery.load(Ordering::SeqCst) > 0
    }

    /// Push a discovery task, accounting for it until it has executed.
    pub fn push_discovery(&self, task: CrawlTask) -> bool {
        self.discovery.fetch_add(1, Ordering::SeqCst);
        let pushed = self.queue.push(task);
        if !pushed {
            self.discovery.fetch_sub(1, Ordering::SeqCst);
        }
        pushed
    }

    /// Release one discovery task's slot after it has run.
    pub fn discovery_done(&self) {
        self.discovery.fetch_sub(1, Ordering::SeqCst);
    }

    // ---------- watermark ----------

    /// Begin a discovery pass: capture the pass start time and return the
    /// active filter bound (previous pass start, falling back to the
    /// configured `since`).
    pub fn begin_pass(&self) -> Option<DateTime<Utc>> {
        let now = Utc::now();
        match self.watermark.lock() {
            Ok(mut wm) => {
                wm.next = Some(now);
                wm.current.or(self.config.since)
            }
            Err(_) => self.config.since,
        }
    }

    /// Finish a discovery pass: promote the captured start time to the
    /// active bound for the next pass.
    pub fn finish_pass(&self) {
        if let Ok(mut wm) = self.watermark.lock() {
            if let Some(next) = wm.next.take() {
                wm.current = Some(next);
            }
        }
    }
}
