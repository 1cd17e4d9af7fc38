//! Bounded work pool.

use std::future::Future;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Runs tasks with at most `limit` handlers in flight.
///
/// Tasks start in input order. The first `limit` start immediately and each
/// completion starts the next queued task. Handlers record their own
/// outcome; the pool only drives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundedWorkPool {
    limit: usize,
}

impl BoundedWorkPool {
    /// Creates a pool. A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs every task and returns once all handlers have finished.
    pub async fn run<I, F, Fut>(&self, tasks: I, handler: F)
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = ()>,
    {
        self.run_until_cancelled(tasks, handler, &CancellationToken::new())
            .await;
    }

    /// Like [`run`](Self::run) but stops starting new tasks once `token` is
    /// cancelled. Handlers already in flight are awaited.
    ///
    /// Returns the number of tasks that were started.
    pub async fn run_until_cancelled<I, F, Fut>(
        &self,
        tasks: I,
        mut handler: F,
        token: &CancellationToken,
    ) -> usize
    where
        I: IntoIterator,
        F: FnMut(I::Item) -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut queue = tasks.into_iter();
        let mut in_flight = FuturesUnordered::new();
        let mut started = 0usize;

        while in_flight.len() < self.limit && !token.is_cancelled() {
            match queue.next() {
                Some(task) => {
                    in_flight.push(handler(task));
                    started += 1;
                }
                None => break,
            }
        }
        trace!(started, limit = self.limit, "Pool filled");

        while in_flight.next().await.is_some() {
            if token.is_cancelled() {
                continue;
            }
            if let Some(task) = queue.next() {
                in_flight.push(handler(task));
                started += 1;
            }
        }

        if token.is_cancelled() {
            debug!(started, "Pool stopped early");
        }
        started
    }
}
