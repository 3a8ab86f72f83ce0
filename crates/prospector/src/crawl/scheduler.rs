//! Shared task queue and fixed-size worker pool.

use std::sync::Arc;

use async_channel::{Receiver, Sender};
use tokio::task::JoinHandle;

use super::context::CrawlContext;
use super::engine;
use super::task::CrawlTask;

/// Unbounded FIFO queue shared by all workers.
///
/// Any clone can enqueue; workers compete for tasks. Closing the queue lets
/// workers drain what is already buffered and then exit.
#[derive(Debug, Clone)]
pub struct TaskQueue {
    tx: Sender<CrawlTask>,
    rx: Receiver<CrawlTask>,
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }

    /// Enqueue a task. Returns false when the queue is already closed, which
    /// during shutdown is expected rather than an error.
    pub fn push(&self, task: CrawlTask) -> bool {
        match self.tx.try_send(task) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(task = %err.into_inner(), "queue closed, task dropped");
                false
            }
        }
    }

    /// Receive the next task; `Err` means closed and drained.
    pub async fn recv(&self) -> Result<CrawlTask, async_channel::RecvError> {
        self.rx.recv().await
    }

    /// Close the queue. Buffered tasks are still delivered.
    pub fn close(&self) -> bool {
        self.tx.close()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Fixed-size pool of workers draining one [`TaskQueue`].
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `scale` workers against the context's queue.
    #[must_use]
    pub fn spawn(ctx: Arc<CrawlContext>, scale: usize) -> Self {
        let scale = scale.max(1);
        let handles = (0..scale)
            .map(|worker_id| {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(worker_loop(ctx, worker_id))
            })
            .collect();
        Self { handles }
    }

    /// Wait for every worker to exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(err) = handle.await {
                tracing::error!(error = %err, "worker panicked");
            }
        }
    }
}

/// recv -> execute -> repeat, until the queue is closed and drained.
///
/// A failed task is logged and the worker moves on; no task error stops
/// the pool.
async fn worker_loop(ctx: Arc<CrawlContext>, worker_id: usize) {
    tracing::debug!(worker_id, "worker started");
    while let Ok(task) = ctx.queue.recv().await {
        tracing::debug!(worker_id, task = %task, "executing task");
        if let Err(err) = engine::execute(&ctx, task.clone()).await {
            tracing::error!(worker_id, task = %task, error = %err, "task failed");
        }
    }
    tracing::debug!(worker_id, "worker exiting, queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_close() {
        let queue = TaskQueue::new();
        assert!(queue.is_empty());
        assert!(queue.push(CrawlTask::ListRepos));
        assert_eq!(queue.len(), 1);

        assert!(queue.close());
        assert!(queue.is_closed());
        assert!(!queue.push(CrawlTask::PollCommits));
    }

    #[tokio::test]
    async fn test_closed_queue_still_delivers_buffered_tasks() {
        let queue = TaskQueue::new();
        queue.push(CrawlTask::ListRepos);
        queue.push(CrawlTask::PollCommits);
        queue.close();

        assert_eq!(queue.recv().await, Ok(CrawlTask::ListRepos));
        assert_eq!(queue.recv().await, Ok(CrawlTask::PollCommits));
        assert!(queue.recv().await.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_one_queue() {
        let queue = TaskQueue::new();
        let clone = queue.clone();
        queue.push(CrawlTask::ListRepos);
        assert_eq!(clone.recv().await, Ok(CrawlTask::ListRepos));
    }
}
