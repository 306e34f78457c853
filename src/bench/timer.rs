//! Iteration timing and last-level-cache flushing

use aligned_vec::AVec;
use std::hint::black_box;
use std::time::{Duration, Instant};

use crate::matrix::SystemParameters;

/// Evicts the working set from the last-level cache
///
/// Owns a cache-line-aligned buffer twice the size of the LLC. Flushing
/// writes every byte and then reads one byte per cache line back, so all of
/// the previously cached operand lines are displaced.
pub struct CacheFlusher {
    buffer: AVec<u8>,
    stride: usize,
    epoch: u8,
}

impl CacheFlusher {
    /// Creates a flusher for a cache of `llc_size` bytes
    pub fn new(llc_size: usize, cache_line_size: usize) -> Self {
        let len = llc_size.saturating_mul(2).max(cache_line_size);
        Self {
            buffer: AVec::from_iter(cache_line_size, (0..len).map(|_| 0u8)),
            stride: cache_line_size.max(1),
            epoch: 0,
        }
    }

    /// Flusher sized from the system parameters
    pub fn from_params(params: &SystemParameters) -> Self {
        Self::new(params.llc_size, params.cache_line_size)
    }

    /// Size of the flush buffer in bytes
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True if the buffer is empty (never, for a constructed flusher)
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Overwrites the buffer and returns a checksum so the writes cannot be elided
    pub fn flush(&mut self) -> u64 {
        self.epoch = self.epoch.wrapping_add(1);
        self.buffer.fill(self.epoch);

        let checksum = self
            .buffer
            .iter()
            .step_by(self.stride)
            .fold(0u64, |acc, &x| acc.wrapping_add(u64::from(x)));
        black_box(checksum)
    }
}

impl std::fmt::Debug for CacheFlusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFlusher")
            .field("bytes", &self.buffer.len())
            .field("stride", &self.stride)
            .finish()
    }
}

/// Start/stop wall-clock timer around blocking kernel launches
///
/// `start(Some(flusher))` flushes the cache before taking the start timestamp, so the
/// flush itself is never inside the timed window.
#[derive(Debug, Default)]
pub struct KernelTimer {
    started: Option<Instant>,
    elapsed: Duration,
}

impl KernelTimer {
    /// Creates a stopped timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing, optionally flushing the cache first
    pub fn start(&mut self, flusher: Option<&mut CacheFlusher>) {
        if let Some(flusher) = flusher {
            flusher.flush();
        }
        self.started = Some(Instant::now());
    }

    /// Stops timing; has no effect if the timer is not running
    pub fn stop(&mut self) {
        if let Some(started) = self.started.take() {
            self.elapsed = started.elapsed();
        }
    }

    /// Duration of the last start/stop window
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Duration of the last window in milliseconds
    pub fn elapsed_msecs(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1e3
    }
}
