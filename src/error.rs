//! Error types for the SDDMM engine and benchmark

use thiserror::Error;

/// Result type alias using the crate's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building views, running kernels or benchmarking
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid user-supplied argument
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidInput {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Shapes of the sparsity pattern and dense operands disagree
    #[error("Dimension mismatch in {what}: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Which quantity was checked
        what: &'static str,
        /// Expected extent
        expected: usize,
        /// Actual extent
        got: usize,
    },

    /// A column index does not fit the declared column count
    #[error("Column index {col} at position {position} out of range for {n_cols} columns")]
    OutOfRange {
        /// Linear nonzero position
        position: usize,
        /// Offending column index
        col: usize,
        /// Number of columns of the pattern
        n_cols: usize,
    },

    /// Host memory could not be reserved
    #[error("Allocation failure: could not reserve {bytes} bytes for {what}")]
    AllocationFailure {
        /// What the buffer was for
        what: &'static str,
        /// Requested size in bytes
        bytes: usize,
    },

    /// A strategy's output deviates from the reference beyond tolerance
    #[error(
        "Numeric mismatch in {strategy}: {mismatches} position(s) differ, first at {position} \
         (expected {expected}, got {got})"
    )]
    NumericMismatch {
        /// Strategy that produced the output
        strategy: String,
        /// Number of positions outside tolerance
        mismatches: usize,
        /// First mismatching position
        position: usize,
        /// Reference value at that position
        expected: f64,
        /// Strategy value at that position
        got: f64,
    },

    /// The worker pool could not be built
    #[error("Device error: {0}")]
    Device(#[from] rayon::ThreadPoolBuildError),

    /// Harness operation attempted in the wrong state
    #[error("Invalid harness state: cannot {action} while {state}")]
    InvalidState {
        /// Operation attempted
        action: &'static str,
        /// Current state name
        state: &'static str,
    },

    /// I/O failure while reading a matrix file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NumPy archive could not be read
    #[error("NPZ error: {0}")]
    Npz(#[from] ndarray_npy::ReadNpzError),

    /// Malformed matrix file
    #[error("Parse error at line {line}: {reason}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },
}

impl Error {
    /// True for errors that abort a benchmark run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::NumericMismatch { .. })
    }
}
