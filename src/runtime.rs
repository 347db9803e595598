//! Worker pool used by the tile pipeline
//!
//! Async work (HTTP requests, pipeline state machines) runs as tokio tasks;
//! blocking work (disk access, image decoding and encoding, channel delivery)
//! runs on tokio's blocking threads, bounded by a semaphore so a burst of
//! tile requests cannot monopolise them.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::{MapError, Result};

/// Bounded pool of blocking workers on top of a tokio runtime
#[derive(Debug, Clone)]
pub struct WorkerPool {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_blocking: usize,
}

impl WorkerPool {
    pub fn new(handle: Handle, max_blocking: usize) -> Self {
        let max_blocking = max_blocking.max(1);
        Self {
            handle,
            permits: Arc::new(Semaphore::new(max_blocking)),
            max_blocking,
        }
    }

    /// Uses the runtime the caller is running in.
    pub fn current(max_blocking: usize) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| MapError::Runtime(e.to_string()))?;
        Ok(Self::new(handle, max_blocking))
    }

    /// Spawn a future on the runtime without waiting for it
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.handle.spawn(future);
    }

    /// Run `work` on a blocking thread once a permit is available.
    pub async fn run_blocking<F, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let _permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| MapError::Runtime("worker pool closed".to_string()))?;

        match self.handle.spawn_blocking(work).await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        }
    }

    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn max_blocking(&self) -> usize {
        self.max_blocking
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }
}
