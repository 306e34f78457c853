//! # SDDMM: Sampled Dense-Dense Matrix Multiplication
//!
//! Given a sparsity pattern `S` (M×N) and dense operands `A` (M×K) and
//! `B` (N×K), SDDMM computes `C = (A·Bᵗ) ⊙ S`: one dot product of length K
//! for every stored nonzero, written in the pattern's nonzero order.
//!
//! ## Overview
//!
//! The crate provides:
//!
//! - A sequential reference oracle ([`reference_sddmm`])
//! - A row-parallel kernel over the CSR layout ([`RowParallelKernel`])
//! - An edge-parallel kernel over the COO layout ([`EdgeParallelKernel`])
//! - A dense GEMM baseline that multiplies tiles of `A·Bᵗ` and gathers
//!   ([`DenseGemmBaseline`])
//! - A benchmarking harness with warmup, repeat and optional cache flushing
//!   ([`BenchmarkHarness`])
//!
//! ## Usage
//!
//! ```
//! use ndarray::array;
//! use sddmm::{reference_sddmm, SparsityPattern};
//!
//! // [. x .]
//! // [x . x]
//! let s = SparsityPattern::new(2, 3, vec![0, 1, 3], vec![1, 0, 2]).unwrap();
//! let a = array![[1.0f64, 2.0], [3.0, 4.0]];
//! let b = array![[1.0f64, 0.0], [0.0, 1.0], [1.0, 1.0]];
//!
//! let c = reference_sddmm(&s, a.view(), b.view(), 2).unwrap();
//! assert_eq!(c, vec![2.0, 3.0, 7.0]);
//! ```
//!
//! Every strategy implements [`SampledProduct`], so they can be swapped:
//!
//! ```
//! use std::sync::Arc;
//! use ndarray::array;
//! use sddmm::{create_strategy, Device, KernelParams, SparsityPattern, Strategy};
//!
//! let s = SparsityPattern::new(2, 2, vec![0, 1, 2], vec![1, 0]).unwrap();
//! let a = array![[1.0f32, 1.0], [2.0, 0.0]];
//! let b = array![[3.0f32, 4.0], [5.0, 6.0]];
//!
//! let device = Arc::new(Device::new(2).unwrap());
//! let kernel = create_strategy::<f32>(Strategy::EdgeParallel, &device, &KernelParams::default());
//! let c = kernel.compute(&s, a.view(), b.view(), 2).unwrap();
//! assert_eq!(c, vec![11.0, 6.0]);
//! ```

pub mod bench;
pub mod error;
pub mod io;
pub mod kernels;
pub mod matrix;
pub mod utils;

// Re-export primary components
pub use bench::{BenchmarkHarness, HarnessState, Measurement, Report, Verdict};
pub use error::{Error, Result};
pub use io::{parse_matrix_market, read_matrix_market, read_npz, read_pattern};
pub use kernels::{
    create_strategy, DenseGemmBaseline, Device, EdgeParallelKernel, ReferenceEngine,
    RowParallelKernel, SampledProduct, Scalar, Strategy,
};
pub use matrix::{
    reference_sddmm, reference_sddmm_into, BenchParams, KernelParams, SddmmConfig,
    SparsityPattern, SystemParameters, Tolerance,
};
pub use utils::{from_sprs_csr, to_sprs_csr};

/// Version information for the SDDMM library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
