//! Edge-parallel SDDMM over the COO layout
//!
//! The output is cut into fixed-size chunks of `entries_per_unit` nonzeros
//! and every chunk is an independent work unit. A unit reads `row_of[p]` and
//! `col_idx[p]` directly, so row boundaries play no part in scheduling and a
//! single very long row is spread over many units.
//!
//! Within a unit, consecutive entries of the same row share one A row. Units
//! never share A rows with each other, which is the memory-reuse price paid
//! for the even load.

use ndarray::ArrayView2;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::trace;

use crate::error::Result;
use crate::kernels::{Device, LaneGroup, SampledProduct, Scalar, Strategy};
use crate::matrix::operands::{check_operands, check_output, row_major};
use crate::matrix::{KernelParams, SparsityPattern};

/// COO strategy: one work unit per chunk of nonzeros
#[derive(Debug)]
pub struct EdgeParallelKernel {
    device: Arc<Device>,
    entries_per_unit: usize,
    lanes: LaneGroup,
}

impl EdgeParallelKernel {
    /// Creates the kernel on a device
    pub fn new(device: Arc<Device>, params: &KernelParams) -> Self {
        Self {
            device,
            entries_per_unit: params.entries_per_unit.max(1),
            lanes: LaneGroup::from_params(params),
        }
    }

    /// Nonzeros per work unit
    pub fn entries_per_unit(&self) -> usize {
        self.entries_per_unit
    }

    fn process_chunk<T: Scalar>(
        &self,
        pattern: &SparsityPattern,
        a: &[T],
        b: &[T],
        k: usize,
        base: usize,
        out: &mut [T],
    ) {
        let row_of = &pattern.row_of()[base..base + out.len()];
        let col_idx = &pattern.col_idx()[base..base + out.len()];

        let mut current = usize::MAX;
        let mut a_row: &[T] = &[];

        for ((slot, &r), &c) in out.iter_mut().zip(row_of).zip(col_idx) {
            if r != current {
                a_row = &a[r * k..(r + 1) * k];
                current = r;
            }
            *slot = self.lanes.dot(a_row, &b[c * k..(c + 1) * k]);
        }
    }
}

impl<T: Scalar> SampledProduct<T> for EdgeParallelKernel {
    fn strategy(&self) -> Strategy {
        Strategy::EdgeParallel
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
        let chunk = self.entries_per_unit;

        trace!(nnz = pattern.nnz(), k, chunk, "launching coo kernel");
        self.device.launch(|| {
            out.par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(unit, slots)| self.process_chunk(pattern, &a, &b, k, unit * chunk, slots));
        });

        Ok(())
    }
}
