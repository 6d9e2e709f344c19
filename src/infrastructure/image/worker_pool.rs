//! Fixed-size pool of long-lived workers draining a [`RequestQueue`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::request_queue::RequestQueue;
use crate::domain::errors::LoaderError;

/// Default number of workers.
pub const DEFAULT_WORKER_COUNT: usize = 5;

/// Work executed by a pool worker for each dequeued item.
#[async_trait]
pub trait TaskHandler<T>: Send + Sync + 'static {
    /// Executes one task. Failures must be handled here; panics are caught
    /// by the worker and logged.
    async fn handle(&self, task: T);
}

/// Handles of the spawned workers.
#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `count` workers on the current tokio runtime.
    ///
    /// Each worker loops on `queue.take()` until the queue is closed, running
    /// `handler` for every task. A failing or panicking task never stops the
    /// worker.
    ///
    /// # Errors
    /// Returns `LoaderError::NoRuntime` outside a tokio runtime.
    pub fn spawn<T, H>(
        count: usize,
        queue: Arc<RequestQueue<T>>,
        handler: Arc<H>,
    ) -> Result<Self, LoaderError>
    where
        T: Send + 'static,
        H: TaskHandler<T>,
    {
        let runtime = Handle::try_current().map_err(|_| LoaderError::NoRuntime)?;
        let workers = (0..count)
            .map(|id| runtime.spawn(run_worker(id, queue.clone(), handler.clone())))
            .collect();
        info!(workers = count, "Started artwork worker pool");
        Ok(Self { workers })
    }

    /// Number of workers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    /// Returns true if the pool has no workers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Waits for every worker to exit. Workers exit once their queue is
    /// closed and their current task has finished.
    pub async fn join(self) {
        for (id, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.await {
                error!(worker = id, error = %e, "Artwork worker ended abnormally");
            }
        }
        info!("Artwork worker pool stopped");
    }
}

async fn run_worker<T, H>(id: usize, queue: Arc<RequestQueue<T>>, handler: Arc<H>)
where
    T: Send + 'static,
    H: TaskHandler<T>,
{
    debug!(worker = id, "Artwork worker started");
    while let Some(task) = queue.take().await {
        if let Err(panic) = AssertUnwindSafe(handler.handle(task)).catch_unwind().await {
            error!(
                worker = id,
                panic = panic_message(panic.as_ref()),
                "Unexpected panic in artwork task"
            );
        }
    }
    debug!(worker = id, "Artwork worker stopped");
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
