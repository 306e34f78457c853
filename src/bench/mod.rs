//! Benchmark harness comparing SDDMM strategies
//!
//! The harness owns the pattern, the generated dense operands and the
//! reference output, and walks a fixed state machine:
//!
//! ```text
//! Idle --load--> Loaded --validate--> Validated --benchmark--> Benchmarked --report--> Reported
//!                  \________________benchmark_________________/     ^  |
//!                                                                   |__| (repeatable)
//! ```
//!
//! Each benchmark runs `warmup_iters` untimed iterations followed by
//! `repeat_iters` timed ones. With cache flushing on, the last-level cache is
//! flushed before every timed iteration and each iteration is timed on its
//! own; with it off, the timed iterations form one contiguous window whose
//! length is divided by the count.

pub mod report;
pub mod timer;
pub mod validate;

use ndarray::{Array2, ArrayView2};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::kernels::{create_strategy, Device, SampledProduct, Scalar, Strategy};
use crate::matrix::{reference_sddmm, BenchParams, SddmmConfig, SparsityPattern, Tolerance};
use crate::utils::{random_dense, random_values, seeded_rng, try_alloc};

pub use report::{flop_count, gflops, Measurement, Report, Verdict};
pub use timer::{CacheFlusher, KernelTimer};
pub use validate::compare_outputs;

/// Harness lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarnessState {
    /// Nothing loaded
    Idle,
    /// Pattern and operands ready
    Loaded,
    /// Reference output computed
    Validated,
    /// At least one strategy measured
    Benchmarked,
    /// Reports handed out; terminal
    Reported,
}

impl HarnessState {
    /// Lowercase state name for messages
    pub fn name(&self) -> &'static str {
        match self {
            HarnessState::Idle => "idle",
            HarnessState::Loaded => "loaded",
            HarnessState::Validated => "validated",
            HarnessState::Benchmarked => "benchmarked",
            HarnessState::Reported => "reported",
        }
    }
}

/// Pattern plus the operands generated for it
struct Workload<T> {
    pattern: SparsityPattern,
    k: usize,
    a: Array2<T>,
    b: Array2<T>,
    // Carried for parity with library SDDMM calls that take a sparse value
    // array; no strategy reads it.
    values: Vec<T>,
}

/// Drives warmup and timed iterations of each strategy and collects reports
pub struct BenchmarkHarness<T: Scalar> {
    config: SddmmConfig,
    device: Arc<Device>,
    state: HarnessState,
    workload: Option<Workload<T>>,
    reference: Option<Vec<T>>,
    flusher: Option<CacheFlusher>,
    reports: Vec<Report>,
}

impl<T: Scalar> BenchmarkHarness<T> {
    /// Creates an idle harness with its own device
    pub fn new(config: SddmmConfig) -> Result<Self> {
        let device = Arc::new(Device::from_params(&config.system_params)?);
        Ok(Self::with_device(config, device))
    }

    /// Creates an idle harness on an existing device
    pub fn with_device(config: SddmmConfig, device: Arc<Device>) -> Self {
        Self {
            config,
            device,
            state: HarnessState::Idle,
            workload: None,
            reference: None,
            flusher: None,
            reports: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> HarnessState {
        self.state
    }

    /// Device the strategies run on
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// Benchmark protocol in use
    pub fn params(&self) -> &BenchParams {
        &self.config.bench
    }

    /// Loaded pattern, if any
    pub fn pattern(&self) -> Option<&SparsityPattern> {
        self.workload.as_ref().map(|w| &w.pattern)
    }

    /// Dense operands A and B, if loaded
    pub fn operands(&self) -> Option<(ArrayView2<'_, T>, ArrayView2<'_, T>)> {
        self.workload.as_ref().map(|w| (w.a.view(), w.b.view()))
    }

    /// The generated sparse value array, which no strategy reads
    pub fn sparse_values(&self) -> Option<&[T]> {
        self.workload.as_ref().map(|w| w.values.as_slice())
    }

    /// Reference output, once validated
    pub fn reference(&self) -> Option<&[T]> {
        self.reference.as_deref()
    }

    /// Reports collected so far
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    fn expect_state(&self, action: &'static str, allowed: &[HarnessState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(Error::InvalidState {
                action,
                state: self.state.name(),
            })
        }
    }

    fn transition(&mut self, next: HarnessState) {
        debug!(from = self.state.name(), to = next.name(), "harness transition");
        self.state = next;
    }

    /// Generates reproducible operands for `pattern` with inner dimension `k`
    ///
    /// # Errors
    ///
    /// - `InvalidState` unless idle
    /// - `InvalidInput` if `k == 0`
    /// - `AllocationFailure` if operands or the flush buffer cannot be reserved
    pub fn load(&mut self, pattern: SparsityPattern, k: usize) -> Result<()> {
        self.expect_state("load", &[HarnessState::Idle])?;
        if k == 0 {
            return Err(Error::InvalidInput {
                arg: "K",
                reason: "must be greater than 0".to_string(),
            });
        }

        let mut rng = seeded_rng(self.config.bench.seed);
        let values = random_values(pattern.nnz(), &mut rng)?;
        let a = random_dense(pattern.n_rows(), k, &mut rng)?;
        let b = random_dense(pattern.n_cols(), k, &mut rng)?;

        if self.config.bench.flush_cache {
            self.flusher = Some(CacheFlusher::from_params(&self.config.system_params));
        }

        info!(
            m = pattern.n_rows(),
            n = pattern.n_cols(),
            k,
            nnz = pattern.nnz(),
            flush_cache = self.config.bench.flush_cache,
            "workload loaded"
        );

        self.workload = Some(Workload {
            pattern,
            k,
            a,
            b,
            values,
        });
        self.transition(HarnessState::Loaded);
        Ok(())
    }

    /// Runs the reference once and keeps its output as the acceptance baseline
    pub fn validate(&mut self) -> Result<&[T]> {
        self.expect_state("validate", &[HarnessState::Loaded])?;
        let w = self.loaded()?;
        let reference = reference_sddmm(&w.pattern, w.a.view(), w.b.view(), w.k)?;

        self.reference = Some(reference);
        self.transition(HarnessState::Validated);
        Ok(self.reference.as_deref().unwrap_or(&[]))
    }

    fn loaded(&self) -> Result<&Workload<T>> {
        self.workload.as_ref().ok_or(Error::InvalidState {
            action: "run",
            state: self.state.name(),
        })
    }

    /// Measures one strategy and records its report
    ///
    /// A numeric mismatch against the reference is logged and recorded in the
    /// report's verdict; it does not fail the call.
    pub fn benchmark(&mut self, engine: &dyn SampledProduct<T>) -> Result<Report> {
        self.expect_state(
            "benchmark",
            &[
                HarnessState::Loaded,
                HarnessState::Validated,
                HarnessState::Benchmarked,
            ],
        )?;

        let workload = self.workload.as_ref().ok_or(Error::InvalidState {
            action: "benchmark",
            state: self.state.name(),
        })?;
        engine.prepare(&workload.pattern)?;

        let (measurement, output) = run_protocol(
            engine,
            workload,
            &self.config.bench,
            self.flusher.as_mut(),
        )?;

        let tolerance = self.config.bench.tolerance.unwrap_or_else(Tolerance::for_scalar::<T>);
        let verdict = match (&self.reference, self.config.bench.validate) {
            (Some(reference), true) => {
                match compare_outputs(engine.name(), &output, reference, &tolerance) {
                    Ok(()) => Verdict::Passed,
                    Err(Error::NumericMismatch {
                        mismatches,
                        position,
                        expected,
                        got,
                        ..
                    }) => {
                        warn!(
                            strategy = engine.name(),
                            mismatches, position, expected, got, "output deviates from reference"
                        );
                        Verdict::Mismatch {
                            mismatches,
                            position,
                        }
                    }
                    Err(other) => return Err(other),
                }
            }
            _ => Verdict::Skipped,
        };

        let report = Report::new(
            engine.strategy(),
            &workload.pattern,
            workload.k,
            measurement,
            verdict,
        );
        info!(
            strategy = engine.name(),
            mean_ms = report.measurement.mean_msecs(),
            gflops = report.gflops(),
            "strategy measured"
        );

        self.reports.push(report.clone());
        self.transition(HarnessState::Benchmarked);
        Ok(report)
    }

    /// Builds and measures every benchmarked strategy in order
    pub fn run_all(&mut self) -> Result<Vec<Report>> {
        let mut reports = Vec::with_capacity(Strategy::BENCHMARKED.len());
        for tag in Strategy::BENCHMARKED {
            let engine = create_strategy::<T>(tag, &self.device, &self.config.kernel);
            reports.push(self.benchmark(engine.as_ref())?);
        }
        Ok(reports)
    }

    /// Hands out all reports and ends the run
    pub fn report(&mut self) -> Result<Vec<Report>> {
        self.expect_state("report", &[HarnessState::Benchmarked])?;
        self.transition(HarnessState::Reported);
        Ok(std::mem::take(&mut self.reports))
    }
}

/// Runs warmup plus timed iterations and returns the mean and the last output
///
/// The output buffer is reserved once up front; timed windows cover only
/// the strategy writing into it.
fn run_protocol<T: Scalar>(
    engine: &dyn SampledProduct<T>,
    workload: &Workload<T>,
    params: &BenchParams,
    mut flusher: Option<&mut CacheFlusher>,
) -> Result<(Measurement, Vec<T>)> {
    let warmup = params.warmup_iters;
    let repeat = params.repeat_iters.max(1);
    let flushed = params.flush_cache && flusher.is_some();

    let mut output = try_alloc(workload.pattern.nnz(), "strategy output")?;
    let run = |out: &mut [T]| {
        engine.compute_into(&workload.pattern, workload.a.view(), workload.b.view(), workload.k, out)
    };
    let mut timer = KernelTimer::new();

    let mean = if flushed {
        let mut total = Duration::ZERO;
        for iter in 0..warmup + repeat {
            let timed = iter >= warmup;
            if timed {
                timer.start(flusher.as_deref_mut());
            }
            run(black_box(output.as_mut_slice()))?;
            if timed {
                timer.stop();
                total += timer.elapsed();
            }
        }
        total.div_f64(repeat as f64)
    } else {
        for iter in 0..warmup + repeat {
            if iter == warmup {
                timer.start(None);
            }
            run(black_box(output.as_mut_slice()))?;
        }
        timer.stop();
        timer.elapsed().div_f64(repeat as f64)
    };

    let measurement = Measurement {
        mean,
        warmup_iters: warmup,
        repeat_iters: repeat,
        flushed,
    };
    Ok((measurement, output))
}
