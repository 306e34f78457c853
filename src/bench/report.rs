//! Measurements, throughput and report lines

use std::fmt;
use std::time::Duration;

use crate::kernels::Strategy;
use crate::matrix::SparsityPattern;

/// Floating-point operations of one SDDMM: one multiply and one add per term
pub fn flop_count(nnz: usize, k: usize) -> f64 {
    2.0 * nnz as f64 * k as f64
}

/// Throughput in GFLOP/s: `2 * nnz * K / (mean_secs * 1e9)`
pub fn gflops(nnz: usize, k: usize, mean: Duration) -> f64 {
    flop_count(nnz, k) / (mean.as_secs_f64() * 1e9)
}

/// Timing of one strategy under one protocol
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Mean duration of one timed iteration
    pub mean: Duration,
    /// Untimed iterations run first
    pub warmup_iters: usize,
    /// Timed iterations
    pub repeat_iters: usize,
    /// Whether the cache was flushed before every timed iteration
    pub flushed: bool,
}

impl Measurement {
    /// Mean iteration time in milliseconds
    pub fn mean_msecs(&self) -> f64 {
        self.mean.as_secs_f64() * 1e3
    }
}

/// Outcome of the advisory reference comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// Validation was not run
    Skipped,
    /// All positions within tolerance
    Passed,
    /// Some positions outside tolerance
    Mismatch {
        /// Number of mismatching positions
        mismatches: usize,
        /// First mismatching position
        position: usize,
    },
}

/// One report line for one strategy
#[derive(Debug, Clone)]
pub struct Report {
    /// Strategy measured
    pub strategy: Strategy,
    /// Rows M of S and A
    pub m: usize,
    /// Columns N of S, rows of B
    pub n: usize,
    /// Inner dimension K
    pub k: usize,
    /// Nonzeros of S
    pub nnz: usize,
    /// Timing
    pub measurement: Measurement,
    /// Reference comparison
    pub verdict: Verdict,
}

impl Report {
    /// Builds a report from the pattern shape and a measurement
    pub fn new(
        strategy: Strategy,
        pattern: &SparsityPattern,
        k: usize,
        measurement: Measurement,
        verdict: Verdict,
    ) -> Self {
        Self {
            strategy,
            m: pattern.n_rows(),
            n: pattern.n_cols(),
            k,
            nnz: pattern.nnz(),
            measurement,
            verdict,
        }
    }

    /// Sampled fraction `nnz / (M * N)`
    pub fn sparsity(&self) -> f64 {
        let cells = self.m as f64 * self.n as f64;
        if cells == 0.0 {
            0.0
        } else {
            self.nnz as f64 / cells
        }
    }

    /// Throughput of the mean iteration in GFLOP/s
    pub fn gflops(&self) -> f64 {
        gflops(self.nnz, self.k, self.measurement.mean)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "[{}] Report: sddmm (A({} x {}) * B^T({} x {})) odot S({} x {}) sparsity {:.6} (nnz={})",
            self.strategy,
            self.m,
            self.k,
            self.n,
            self.k,
            self.m,
            self.n,
            self.sparsity(),
            self.nnz
        )?;
        write!(
            f,
            " Time {:.6} (ms), Throughput {:.6} (gflops).",
            self.measurement.mean_msecs(),
            self.gflops()
        )?;
        match &self.verdict {
            Verdict::Skipped => Ok(()),
            Verdict::Passed => write!(f, " Validation passed."),
            Verdict::Mismatch {
                mismatches,
                position,
            } => write!(
                f,
                " Validation FAILED: {} mismatch(es), first at {}.",
                mismatches, position
            ),
        }
    }
}
