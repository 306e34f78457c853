//! Dense GEMM baseline
//!
//! Plays the role of an off-the-shelf library call. The pattern is cut into
//! row tiles; each tile gathers the A rows and B rows its nonzeros touch,
//! multiplies them with `ndarray`'s general matrix multiply into a scratch
//! product, then gathers the sampled positions. A tile's product never
//! exceeds `baseline_workspace_bytes` unless a single row alone needs more.
//! The tile plan and scratch space are set up in `prepare`, ahead of timed
//! runs, and reused while the pattern stays the same.

use ndarray::linalg::general_mat_mul;
use ndarray::{ArrayView2, ArrayViewMut2};
use rayon::prelude::*;
use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::error::{Error, Result};
use crate::kernels::{Device, SampledProduct, Scalar, Strategy};
use crate::matrix::operands::{check_operands, check_output, row_major};
use crate::matrix::{KernelParams, SparsityPattern};
use crate::utils::try_alloc;

/// A band of nonempty rows and the distinct columns they sample
#[derive(Debug, Clone, PartialEq, Eq)]
struct Tile {
    /// Nonempty rows, ascending
    rows: Vec<usize>,
    /// Distinct sampled columns, ascending
    cols: Vec<usize>,
    /// Positions of the tile's nonzeros in the pattern's linear order
    span: Range<usize>,
}

impl Tile {
    fn cells(&self) -> usize {
        self.rows.len().saturating_mul(self.cols.len())
    }
}

/// Tiles for one pattern, with the largest extents any of them needs
#[derive(Debug)]
struct Plan {
    pattern: SparsityPattern,
    tiles: Vec<Tile>,
    max_rows: usize,
    max_cols: usize,
    max_cells: usize,
}

impl Plan {
    fn new(pattern: &SparsityPattern, max_cells: usize) -> Self {
        let tiles = plan_tiles(pattern, max_cells);
        Self {
            pattern: pattern.clone(),
            max_rows: tiles.iter().map(|t| t.rows.len()).max().unwrap_or(0),
            max_cols: tiles.iter().map(|t| t.cols.len()).max().unwrap_or(0),
            max_cells: tiles.iter().map(Tile::cells).max().unwrap_or(0),
            tiles,
        }
    }
}

/// Greedily packs consecutive nonempty rows while the product stays within `max_cells`
fn plan_tiles(pattern: &SparsityPattern, max_cells: usize) -> Vec<Tile> {
    let row_ptr = pattern.row_ptr();
    let mut tiles = Vec::new();
    let mut rows: Vec<usize> = Vec::new();
    let mut cols = BTreeSet::new();

    let close = |rows: &mut Vec<usize>, cols: &mut BTreeSet<usize>, tiles: &mut Vec<Tile>| {
        if let (Some(&first), Some(&last)) = (rows.first(), rows.last()) {
            tiles.push(Tile {
                span: row_ptr[first]..row_ptr[last + 1],
                rows: std::mem::take(rows),
                cols: std::mem::take(cols).into_iter().collect(),
            });
        }
    };

    for r in 0..pattern.n_rows() {
        let row = pattern.row_cols(r);
        if row.is_empty() {
            continue;
        }

        let fresh = row.iter().filter(|c| !cols.contains(*c)).collect::<BTreeSet<_>>().len();
        let grown = (rows.len() + 1).saturating_mul(cols.len() + fresh);
        if !rows.is_empty() && grown > max_cells {
            close(&mut rows, &mut cols, &mut tiles);
        }

        rows.push(r);
        cols.extend(row.iter().copied());
    }
    close(&mut rows, &mut cols, &mut tiles);

    tiles
}

fn grow<T: Scalar>(buf: &mut Vec<T>, len: usize, what: &'static str) -> Result<()> {
    if buf.len() < len {
        *buf = try_alloc(len, what)?;
    }
    Ok(())
}

fn checked_len(a: usize, b: usize, what: &'static str) -> Result<usize> {
    a.checked_mul(b).ok_or(Error::AllocationFailure {
        what,
        bytes: usize::MAX,
    })
}

#[derive(Debug)]
struct Scratch<T> {
    plan: Option<Plan>,
    product: Vec<T>,
    a_rows: Vec<T>,
    b_rows: Vec<T>,
}

/// Tiled dense GEMM followed by a gather
#[derive(Debug)]
pub struct DenseGemmBaseline<T> {
    device: Arc<Device>,
    max_tile_cells: usize,
    scratch: Mutex<Scratch<T>>,
}

impl<T: Scalar> DenseGemmBaseline<T> {
    /// Creates the baseline with no scratch space reserved yet
    pub fn new(device: Arc<Device>, params: &KernelParams) -> Self {
        Self {
            device,
            max_tile_cells: (params.baseline_workspace_bytes / std::mem::size_of::<T>()).max(1),
            scratch: Mutex::new(Scratch {
                plan: None,
                product: Vec::new(),
                a_rows: Vec::new(),
                b_rows: Vec::new(),
            }),
        }
    }

    /// Bytes of product workspace the pattern needs, at most one tile's worth
    ///
    /// # Errors
    ///
    /// `AllocationFailure` if the size does not fit in `usize`.
    pub fn buffer_size(&self, pattern: &SparsityPattern) -> Result<usize> {
        let cells = plan_tiles(pattern, self.max_tile_cells)
            .iter()
            .map(Tile::cells)
            .max()
            .unwrap_or(0);
        checked_len(cells, std::mem::size_of::<T>(), "dense-gemm workspace")
    }

    fn lock(&self) -> MutexGuard<'_, Scratch<T>> {
        self.scratch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn plan_for<'p>(&self, slot: &'p mut Option<Plan>, pattern: &SparsityPattern) -> &'p Plan {
        if !matches!(slot, Some(plan) if plan.pattern == *pattern) {
            *slot = None;
        }
        slot.get_or_insert_with(|| {
            let plan = Plan::new(pattern, self.max_tile_cells);
            debug!(
                tiles = plan.tiles.len(),
                bytes = plan.max_cells.saturating_mul(std::mem::size_of::<T>()),
                "planned dense-gemm tiles"
            );
            plan
        })
    }
}

impl<T: Scalar> SampledProduct<T> for DenseGemmBaseline<T> {
    fn strategy(&self) -> Strategy {
        Strategy::DenseBaseline
    }

    fn prepare(&self, pattern: &SparsityPattern) -> Result<()> {
        let mut guard = self.lock();
        let scratch = &mut *guard;
        let plan = self.plan_for(&mut scratch.plan, pattern);
        grow(&mut scratch.product, plan.max_cells, "dense-gemm workspace")
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
        if k == 0 {
            out.fill(T::zero());
            return Ok(());
        }

        let mut guard = self.lock();
        let scratch = &mut *guard;
        let plan = self.plan_for(&mut scratch.plan, pattern);
        grow(&mut scratch.product, plan.max_cells, "dense-gemm workspace")?;
        grow(&mut scratch.a_rows, checked_len(plan.max_rows, k, "dense-gemm A tile")?, "dense-gemm A tile")?;
        grow(&mut scratch.b_rows, checked_len(plan.max_cols, k, "dense-gemm B tile")?, "dense-gemm B tile")?;

        let a = row_major(&a);
        let b = row_major(&b);
        let (product, a_rows, b_rows) = (&mut scratch.product, &mut scratch.a_rows, &mut scratch.b_rows);

        self.device.launch(|| {
            for tile in &plan.tiles {
                let (m, n) = (tile.rows.len(), tile.cols.len());

                let a_tile = &mut a_rows[..m * k];
                a_tile
                    .par_chunks_mut(k)
                    .zip(tile.rows.par_iter())
                    .for_each(|(dst, &r)| dst.copy_from_slice(&a[r * k..(r + 1) * k]));
                let b_tile = &mut b_rows[..n * k];
                b_tile
                    .par_chunks_mut(k)
                    .zip(tile.cols.par_iter())
                    .for_each(|(dst, &c)| dst.copy_from_slice(&b[c * k..(c + 1) * k]));

                let lhs = ArrayView2::from_shape((m, k), &a_tile[..])?;
                let rhs = ArrayView2::from_shape((n, k), &b_tile[..])?;
                let mut ws = ArrayViewMut2::from_shape((m, n), &mut product[..m * n])?;
                // beta = 0: the workspace is overwritten, never read
                general_mat_mul(T::one(), &lhs, &rhs.t(), T::zero(), &mut ws);

                let ws = &product[..m * n];
                let span = tile.span.clone();
                out[span.clone()]
                    .par_iter_mut()
                    .zip(pattern.row_of()[span.clone()].par_iter().zip(pattern.col_idx()[span].par_iter()))
                    .for_each(|(slot, (&r, &c))| {
                        let i = tile.rows.partition_point(|&x| x < r);
                        let j = tile.cols.partition_point(|&x| x < c);
                        *slot = ws[i * n + j];
                    });
            }
            Ok::<(), ndarray::ShapeError>(())
        })
        .map_err(|_| Error::DimensionMismatch {
            what: "dense-gemm tile",
            expected: plan.max_cells,
            got: plan.max_cells,
        })
    }
}
