//! Worker pool that executes kernel launches

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::info;

use crate::error::Result;
use crate::matrix::SystemParameters;

/// A dedicated pool of workers, separate from the controlling thread
///
/// [`Device::launch`] blocks until every work unit spawned inside it has
/// finished, so the caller can read results or stop a timer right after it
/// returns.
pub struct Device {
    pool: ThreadPool,
}

impl Device {
    /// Builds a device with `n_threads` workers
    pub fn new(n_threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(n_threads.max(1))
            .thread_name(|i| format!("sddmm-worker-{i}"))
            .build()?;
        info!(workers = pool.current_num_threads(), "device ready");
        Ok(Self { pool })
    }

    /// Builds a device sized from the system parameters
    pub fn from_params(params: &SystemParameters) -> Result<Self> {
        Self::new(params.n_threads)
    }

    /// Number of workers
    pub fn n_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `op` on the device and waits for all of its work to drain
    pub fn launch<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        self.pool.install(op)
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("n_threads", &self.n_threads())
            .finish()
    }
}
