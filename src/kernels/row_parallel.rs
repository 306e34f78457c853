//! Row-parallel SDDMM over the CSR layout
//!
//! The row range is bisected recursively with `rayon::join`; each half
//! receives the disjoint output slice `C[row_ptr[lo]..row_ptr[hi]]`, so no
//! two work units ever touch the same output position. Once a range holds at
//! most `rows_per_unit` rows it is processed by one unit, which walks each
//! row's nonzeros in order and reuses the row of A for all of them.
//!
//! Rows with very different nonzero counts leave units unevenly loaded.
//! That is the accepted cost of this layout; see the edge-parallel kernel for
//! the balanced alternative.

use ndarray::ArrayView2;
use std::ops::Range;
use std::sync::Arc;
use tracing::trace;

use crate::error::Result;
use crate::kernels::{Device, LaneGroup, SampledProduct, Scalar, Strategy};
use crate::matrix::operands::{check_operands, check_output, row_major};
use crate::matrix::{KernelParams, SparsityPattern};

/// CSR strategy: one work unit per small range of rows
#[derive(Debug)]
pub struct RowParallelKernel {
    device: Arc<Device>,
    rows_per_unit: usize,
    lanes: LaneGroup,
}

impl RowParallelKernel {
    /// Creates the kernel on a device
    pub fn new(device: Arc<Device>, params: &KernelParams) -> Self {
        Self {
            device,
            rows_per_unit: params.rows_per_unit.max(1),
            lanes: LaneGroup::from_params(params),
        }
    }

    /// Rows per work unit
    pub fn rows_per_unit(&self) -> usize {
        self.rows_per_unit
    }

    fn process_rows<T: Scalar>(
        &self,
        pattern: &SparsityPattern,
        a: &[T],
        b: &[T],
        k: usize,
        rows: Range<usize>,
        out: &mut [T],
    ) {
        // Ranges made only of empty rows have nothing to write
        if out.is_empty() {
            return;
        }

        let row_ptr = pattern.row_ptr();

        if rows.len() <= self.rows_per_unit {
            let base = row_ptr[rows.start];
            let col_idx = pattern.col_idx();
            for r in rows {
                let a_row = &a[r * k..(r + 1) * k];
                for p in pattern.row_range(r) {
                    let c = col_idx[p];
                    out[p - base] = self.lanes.dot(a_row, &b[c * k..(c + 1) * k]);
                }
            }
            return;
        }

        let mid = rows.start + rows.len() / 2;
        let split = row_ptr[mid] - row_ptr[rows.start];
        let (lo, hi) = out.split_at_mut(split);
        rayon::join(
            || self.process_rows(pattern, a, b, k, rows.start..mid, lo),
            || self.process_rows(pattern, a, b, k, mid..rows.end, hi),
        );
    }
}

impl<T: Scalar> SampledProduct<T> for RowParallelKernel {
    fn strategy(&self) -> Strategy {
        Strategy::RowParallel
    }

    fn compute_into(
        &self,
        pattern: &SparsityPattern,
        a: ArrayView2<'_, T>,
        b: ArrayView2<'_, T>,
        k: usize,
        out: &mut [T],
    ) -> Result<()> {
        check_operands(pattern, &a, &b, k)?;
        check_output(pattern, out)?;

        let a = row_major(&a);
        let b = row_major(&b);

        trace!(rows = pattern.n_rows(), nnz = pattern.nnz(), k, "launching csr kernel");
        self.device.launch(|| {
            self.process_rows(pattern, &a, &b, k, 0..pattern.n_rows(), out);
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::reference_sddmm;
    use ndarray::{array, Array2};

    fn kernel(rows_per_unit: usize) -> RowParallelKernel {
        let params = KernelParams {
            rows_per_unit,
            ..KernelParams::default()
        };
        RowParallelKernel::new(Arc::new(Device::new(4).unwrap()), &params)
    }

    #[test]
    fn test_concrete_scenario() {
        let s = SparsityPattern::new(4, 4, vec![0, 1, 3, 3, 4], vec![1, 0, 2, 3]).unwrap();
        let a = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 0.0]];
        let b = array![[1.0f32, 1.0], [2.0, 0.0], [0.0, 2.0], [1.0, 1.0]];

        for rows_per_unit in [1, 2, 4, 16] {
            let c = kernel(rows_per_unit).compute(&s, a.view(), b.view(), 2).unwrap();
            assert_eq!(c, vec![2.0, 1.0, 2.0, 2.0]);
        }
    }

    #[test]
    fn compute_into_reuses_buffer() {
        let s = SparsityPattern::new(4, 4, vec![0, 1, 3, 3, 4], vec![1, 0, 2, 3]).unwrap();
        let a = array![[1.0f32, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 0.0]];
        let b = array![[1.0f32, 1.0], [2.0, 0.0], [0.0, 2.0], [1.0, 1.0]];
        let engine = kernel(2);

        let mut out = vec![f32::NAN; 4];
        engine.compute_into(&s, a.view(), b.view(), 2, &mut out).unwrap();
        assert_eq!(out, vec![2.0, 1.0, 2.0, 2.0]);

        let mut short = vec![0.0f32; 3];
        let err = engine.compute_into(&s, a.view(), b.view(), 2, &mut short).unwrap_err();
        assert!(matches!(err, crate::Error::DimensionMismatch { what: "output length", .. }));
    }

    #[test]
    fn all_rows_empty() {
        let s = SparsityPattern::empty(64, 8);
        let a = Array2::<f64>::ones((64, 3));
        let b = Array2::<f64>::ones((8, 3));
        let c = kernel(1).compute(&s, a.view(), b.view(), 3).unwrap();
        assert!(c.is_empty());
    }

    #[test]
    fn single_dense_row_among_empty_rows() {
        let n = 50;
        let mut row_ptr = vec![0; 11];
        for r in 5..=10 {
            row_ptr[r] = n;
        }
        let s = SparsityPattern::new(10, n, row_ptr, (0..n).collect()).unwrap();
        let a = Array2::from_shape_fn((10, 4), |(i, j)| (i * 4 + j) as f64);
        let b = Array2::from_shape_fn((n, 4), |(i, j)| (i + j) as f64);

        let expected = reference_sddmm(&s, a.view(), b.view(), 4).unwrap();
        let c = kernel(1).compute(&s, a.view(), b.view(), 4).unwrap();
        assert_eq!(c, expected);
    }

    #[test]
    fn rejects_wrong_k() {
        let s = SparsityPattern::new(1, 1, vec![0, 1], vec![0]).unwrap();
        let a = Array2::<f32>::ones((1, 3));
        let b = Array2::<f32>::ones((1, 3));
        assert!(kernel(1).compute(&s, a.view(), b.view(), 2).is_err());
    }
}
