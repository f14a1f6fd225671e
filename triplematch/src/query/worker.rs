//! Stage worker pool.
//!
//! Every running stage occupies one worker for its whole lifetime, because
//! it blocks on its pipes. Workers come from tokio's blocking pool, which
//! reuses idle threads across queries and retires them after the configured
//! keep-alive.

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

use crate::config::EngineConfig;

use super::error::QueryError;

/// A pool of reusable blocking workers.
#[derive(Debug)]
pub struct WorkerPool {
    /// Present when the pool owns its runtime.
    runtime: Option<Runtime>,
    handle: Handle,
}

impl WorkerPool {
    /// Start a pool with its own runtime.
    ///
    /// # Errors
    ///
    /// Returns `WorkerPool` if the runtime cannot be built.
    pub fn new(config: &EngineConfig) -> Result<Self, QueryError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(config.max_workers)
            .thread_keep_alive(config.worker_keep_alive)
            .thread_name("triplematch-worker")
            .enable_all()
            .build()
            .map_err(|e| QueryError::WorkerPool(e.to_string()))?;
        info!(
            max_workers = config.max_workers,
            keep_alive_ms = config.worker_keep_alive.as_millis(),
            "Started stage worker pool"
        );
        let handle = runtime.handle().clone();
        Ok(Self {
            runtime: Some(runtime),
            handle,
        })
    }

    /// Use the blocking pool of an existing runtime.
    #[must_use]
    pub const fn from_handle(handle: Handle) -> Self {
        Self {
            runtime: None,
            handle,
        }
    }

    /// Run `work` on a worker. Returns immediately.
    pub fn spawn<F>(&self, work: F)
    where
        F: FnOnce() + Send + 'static,
    {
        drop(self.handle.spawn_blocking(work));
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Never wait on stage workers: a stage blocked on a pipe whose
        // consumer is still alive would hang the drop.
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_spawn_runs_work() {
        let pool = WorkerPool::new(&EngineConfig::default()).expect("pool");
        let (tx, rx) = mpsc::channel();
        for i in 0..4 {
            let tx = tx.clone();
            pool.spawn(move || tx.send(i).expect("send"));
        }
        let mut seen: Vec<i32> = (0..4)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).expect("work ran"))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_from_handle() {
        let pool = WorkerPool::from_handle(Handle::current());
        let (tx, rx) = tokio::sync::oneshot::channel();
        pool.spawn(move || {
            let _ = tx.send(42);
        });
        assert_eq!(rx.await.expect("work ran"), 42);
    }
}
