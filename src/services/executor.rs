//! Submit/drain executors for record submissions.
//!
//! Leaf-level record calls (results, host counter patches, play closing
//! patches) go through an [`Executor`]. With `callback_threads = 0` every
//! submission runs inline on the dispatch path, the deterministic mode.
//! With a pool, submissions run concurrently on tokio workers and `drain`
//! is the only synchronization point: it completes after every submission
//! accepted since the executor was created (or last drained) has finished.
//!
//! Pooled failures are logged and swallowed; a late failure on one host's
//! result does not abort an otherwise healthy run record. Structural calls
//! never go through an executor and keep their fail-fast behavior.

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::domain::errors::RecordResult;

/// Upper bound on the worker pool, protecting the record client's shared
/// connection pool.
pub const MAX_POOL_SIZE: usize = 4;

/// A unit of record-submission work.
pub type Submission = BoxFuture<'static, RecordResult<()>>;

/// Shared submit/drain contract for inline and pooled execution.
#[async_trait]
pub trait Executor: Send {
    /// Run or enqueue `work`. Inline execution surfaces the work's error;
    /// pooled execution returns as soon as the work is spawned and logs
    /// failures from the worker.
    async fn submit(&mut self, label: &'static str, work: Submission) -> RecordResult<()>;

    /// Complete all work submitted since creation or the previous drain.
    /// Never cancels: waiting to completion is what keeps records from
    /// being lost.
    async fn drain(&mut self);
}

/// Executes every submission synchronously on the dispatch path.
#[derive(Debug, Default)]
pub struct InlineExecutor;

#[async_trait]
impl Executor for InlineExecutor {
    async fn submit(&mut self, _label: &'static str, work: Submission) -> RecordResult<()> {
        work.await
    }

    async fn drain(&mut self) {}
}

/// Bounded pool of concurrent submissions.
pub struct PooledExecutor {
    capacity: usize,
    workers: tokio::task::JoinSet<()>,
}

impl PooledExecutor {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.clamp(1, MAX_POOL_SIZE),
            workers: tokio::task::JoinSet::new(),
        }
    }

    async fn reap_one(&mut self) {
        if let Some(Err(err)) = self.workers.join_next().await {
            warn!(error = %err, "record submission worker panicked");
        }
    }
}

#[async_trait]
impl Executor for PooledExecutor {
    async fn submit(&mut self, label: &'static str, work: Submission) -> RecordResult<()> {
        // Enqueueing is bounded: wait for a slot when the pool is full.
        while self.workers.len() >= self.capacity {
            self.reap_one().await;
        }
        self.workers.spawn(async move {
            if let Err(err) = work.await {
                warn!(error = %err, label, "record submission failed");
            }
        });
        Ok(())
    }

    async fn drain(&mut self) {
        let outstanding = self.workers.len();
        if outstanding > 0 {
            debug!(outstanding, "draining submission pool");
        }
        while !self.workers.is_empty() {
            self.reap_one().await;
        }
    }
}

/// Select the executor implementation for a configured pool size.
pub fn executor_for(callback_threads: usize) -> Box<dyn Executor> {
    if callback_threads == 0 {
        Box::new(InlineExecutor)
    } else {
        Box::new(PooledExecutor::new(callback_threads))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn inline_executor_runs_work_at_submit_time() {
        let mut executor = InlineExecutor;
        let ran = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&ran);
        executor
            .submit(
                "test",
                Box::pin(async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .await
            .unwrap();

        // Already complete, before any drain.
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inline_executor_surfaces_errors() {
        let mut executor = InlineExecutor;
        let result = executor
            .submit(
                "test",
                Box::pin(async {
                    Err(crate::domain::errors::RecordError::Http(
                        "boom".to_string(),
                    ))
                }),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn pooled_executor_completes_everything_by_drain() {
        let mut executor = PooledExecutor::new(2);
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let counter = Arc::clone(&ran);
            executor
                .submit(
                    "test",
                    Box::pin(async move {
                        tokio::time::sleep(Duration::from_millis(5)).await;
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )
                .await
                .unwrap();
        }

        executor.drain().await;
        assert_eq!(ran.load(Ordering::SeqCst), 10);
    }

    #[tokio::test]
    async fn pooled_executor_swallows_work_errors() {
        let mut executor = PooledExecutor::new(1);
        executor
            .submit(
                "test",
                Box::pin(async {
                    Err(crate::domain::errors::RecordError::Http(
                        "boom".to_string(),
                    ))
                }),
            )
            .await
            .unwrap();
        executor.drain().await;
    }

    #[test]
    fn pool_size_is_capped() {
        let executor = PooledExecutor::new(64);
        assert_eq!(executor.capacity, MAX_POOL_SIZE);
    }
}
