//! Execution strategies for sampled dense-dense matrix multiplication
//!
//! Every strategy implements [`SampledProduct`], so callers (the benchmark
//! harness in particular) can hold a list of boxed strategies and run them
//! generically. The strategies differ in how work is decomposed:
//!
//! - **Row-parallel (CSR)**: one work unit per small range of rows; the A row
//!   is reused across all of the row's nonzeros, but skewed row lengths
//!   leave some units with far more work than others.
//! - **Edge-parallel (COO)**: one work unit per fixed-size chunk of nonzeros,
//!   independent of row boundaries; balanced regardless of skew, at the cost
//!   of re-reading A rows that span chunk boundaries.
//! - **Dense baseline**: full GEMM into a scratch workspace followed by a gather.
//! - **Reference**: the sequential oracle.

pub mod baseline;
pub mod device;
pub mod edge_parallel;
pub mod reduce;
pub mod row_parallel;

use ndarray::{ArrayView2, LinalgScalar};
use num_traits::Float;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::matrix::{reference_sddmm_into, KernelParams, SparsityPattern};
use crate::utils::try_alloc;

pub use baseline::DenseGemmBaseline;
pub use device::Device;
pub use edge_parallel::EdgeParallelKernel;
pub use reduce::LaneGroup;
pub use row_parallel::RowParallelKernel;

/// Element types the engine computes with
pub trait Scalar:
    Float + LinalgScalar + Send + Sync + fmt::Debug + fmt::Display + 'static
{
}

impl<T> Scalar for T where
    T: Float + LinalgScalar + Send + Sync + fmt::Debug + fmt::Display + 'static
{
}

/// Strategy tag used to select an implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Sequential oracle
    Reference,
    /// Dense GEMM followed by a gather of sampled positions
    DenseBaseline,
    /// One work unit per row range over the CSR layout
    RowParallel,
    /// One work unit per chunk of nonzeros over the COO layout
    EdgeParallel,
}

impl Strategy {
    /// Strategies measured by a benchmark run, in reporting order
    pub const BENCHMARKED: [Strategy; 3] = [
        Strategy::DenseBaseline,
        Strategy::RowParallel,
        Strategy::EdgeParallel,
    ];

    /// Short label printed in reports
    pub fn label(&self) -> &'static str {
        match self {
            Strategy::Reference => "reference",
            Strategy::DenseBaseline => "dense-gemm",
            Strategy::RowParallel => "SDDMM-csr",
            Strategy::EdgeParallel => "SDDMM-coo",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A way of computing `C = (A·Bᵗ) sampled at the pattern's nonzeros`
///
/// The output holds one value per nonzero in the pattern's linear order.
/// Implementations overwrite every output slot and never read its previous
/// contents.
pub trait SampledProduct<T: Scalar>: Send + Sync {
    /// Which strategy this is
    fn strategy(&self) -> Strategy;

    /// Label used in reports and logs
    fn name(&self) -> &'static str {
        self.strategy().label()
    }

    /// Prepares any scratch space for the given pattern ahead of timed runs
    fn prepare(&self, _pattern: &SparsityPattern) -> Result<()> {
        Ok(())
    }

    /// Computes the sampled product into `out`, which must hold nnz slots
    ///
    /// # Errors
    ///
    /// `DimensionMismatch` if A is not `M×K`, B is not `N×K` or `out` is not
    /// nnz long; `AllocationFailure` if scratch space cannot be reserved.
    fn compute_into(
        &self,
        pattern: &SparsityPattern,
        a: ArrayView2<'_, T>,
        b: ArrayView2<'_, T>,
        k: usize,
        out: &mut [T],
    ) -> Result<()>;

    /// Computes the sampled product into a freshly allocated vector
    fn compute(
        &self,
        pattern: &SparsityPattern,
        a: ArrayView2<'_, T>,
        b: ArrayView2<'_, T>,
        k: usize,
    ) -> Result<Vec<T>> {
        let mut c = try_alloc(pattern.nnz(), "output")?;
        self.compute_into(pattern, a, b, k, &mut c)?;
        Ok(c)
    }
}

/// The sequential oracle as a strategy
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceEngine;

impl<T: Scalar> SampledProduct<T> for ReferenceEngine {
    fn strategy(&self) -> Strategy {
        Strategy::Reference
    }

    fn compute_into(
        &self,
        pattern: &SparsityPattern,
        a: ArrayView2<'_, T>,
        b: ArrayView2<'_, T>,
        k: usize,
        out: &mut [T],
    ) -> Result<()> {
        reference_sddmm_into(pattern, a, b, k, out)
    }
}

/// Creates the implementation for a strategy tag
pub fn create_strategy<T: Scalar>(
    strategy: Strategy,
    device: &Arc<Device>,
    params: &KernelParams,
) -> Box<dyn SampledProduct<T>> {
    match strategy {
        Strategy::Reference => Box::new(ReferenceEngine),
        Strategy::DenseBaseline => Box::new(DenseGemmBaseline::new(Arc::clone(device), params)),
        Strategy::RowParallel => Box::new(RowParallelKernel::new(Arc::clone(device), params)),
        Strategy::EdgeParallel => Box::new(EdgeParallelKernel::new(Arc::clone(device), params)),
    }
}
