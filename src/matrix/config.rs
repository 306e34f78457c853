//! Configuration and system parameters for the SDDMM kernels and benchmark

use num_traits::Float;

/// System parameters for performance tuning
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Size of cache line in bytes
    pub cache_line_size: usize,
    /// Size of the last-level cache in bytes, used to size the flush buffer
    pub llc_size: usize,
    /// Number of worker threads on the device
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            cache_line_size: 64,        // Common cache line size
            llc_size: 32 * 1024 * 1024, // 32MB, covers most desktop and server parts
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// Work decomposition parameters shared by the parallel kernels
#[derive(Debug, Clone)]
pub struct KernelParams {
    /// Maximum rows handled by one CSR work unit
    pub rows_per_unit: usize,
    /// Nonzeros handled by one COO work unit
    pub entries_per_unit: usize,
    /// Lanes cooperating on one dot product (clamped to `1..=64`)
    pub group_width: usize,
    /// K at which one dot product is split across pool workers
    pub cooperative_k_threshold: usize,
    /// Upper bound in bytes on one product tile of the dense-GEMM baseline
    pub baseline_workspace_bytes: usize,
}

impl Default for KernelParams {
    fn default() -> Self {
        Self {
            rows_per_unit: 4,
            entries_per_unit: 256,
            group_width: 32,
            cooperative_k_threshold: 16 * 1024,
            baseline_workspace_bytes: 256 * 1024 * 1024,
        }
    }
}

/// Acceptance tolerance for comparing a strategy against the reference
///
/// `x` matches `y` iff `|x - y| <= atol + rtol * |y|`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
}

impl Tolerance {
    /// Tolerance for single-precision accumulation
    pub fn for_f32() -> Self {
        Self {
            rtol: 1e-4,
            atol: 1e-5,
        }
    }

    /// Tolerance for double-precision accumulation
    pub fn for_f64() -> Self {
        Self {
            rtol: 1e-9,
            atol: 1e-12,
        }
    }

    /// Tolerance matching the precision of `T`
    ///
    /// Types with a machine epsilon coarser than `f64`'s get the
    /// single-precision tolerance.
    pub fn for_scalar<T: Float>() -> Self {
        match T::epsilon().to_f64() {
            Some(eps) if eps <= f64::EPSILON => Self::for_f64(),
            _ => Self::for_f32(),
        }
    }

    /// Checks one value against its reference
    ///
    /// Two NaNs match, and infinities match only when equal.
    pub fn matches(&self, got: f64, expected: f64) -> bool {
        if got.is_nan() || expected.is_nan() {
            return got.is_nan() && expected.is_nan();
        }
        if got.is_infinite() || expected.is_infinite() {
            return got == expected;
        }
        (got - expected).abs() <= self.atol + self.rtol * expected.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::for_f32()
    }
}

/// Benchmark protocol parameters
#[derive(Debug, Clone)]
pub struct BenchParams {
    /// Untimed iterations before measurement
    pub warmup_iters: usize,
    /// Timed iterations
    pub repeat_iters: usize,
    /// Flush the last-level cache before every timed iteration
    pub flush_cache: bool,
    /// Tolerance for the advisory reference comparison; `None` picks it
    /// from the element type
    pub tolerance: Option<Tolerance>,
    /// Seed for operand generation
    pub seed: u64,
    /// Compare every strategy against the reference
    pub validate: bool,
}

impl Default for BenchParams {
    fn default() -> Self {
        Self {
            warmup_iters: 10,
            repeat_iters: 100,
            flush_cache: false,
            tolerance: None,
            seed: 42,
            validate: true,
        }
    }
}

impl BenchParams {
    /// Environment variable selecting cache-flush mode
    pub const FLUSH_ENV: &'static str = "FLUSH_L2";

    /// Defaults, with cache-flush mode taken from `FLUSH_L2`
    pub fn from_env() -> Self {
        Self {
            flush_cache: flush_mode_from(std::env::var(Self::FLUSH_ENV).ok().as_deref()),
            ..Self::default()
        }
    }
}

/// Interprets the `FLUSH_L2` value: only `"ON"` enables flushing
pub fn flush_mode_from(value: Option<&str>) -> bool {
    matches!(value, Some("ON"))
}

/// Configuration for the SDDMM engine and harness
#[derive(Debug, Clone, Default)]
pub struct SddmmConfig {
    /// System parameters for performance tuning
    pub system_params: SystemParameters,
    /// Kernel work decomposition
    pub kernel: KernelParams,
    /// Benchmark protocol
    pub bench: BenchParams,
}

impl SddmmConfig {
    /// Default configuration with the benchmark mode read from the environment
    pub fn from_env() -> Self {
        Self {
            bench: BenchParams::from_env(),
            ..Self::default()
        }
    }

    /// Sets the device thread count
    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.system_params.n_threads = n_threads.max(1);
        self
    }
}
