//! Immutable sparsity pattern in CSR layout with its derived COO row array

use std::fmt;
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::expand_row_ptr;

/// The sampling pattern S of an SDDMM, stored in CSR layout
///
/// The pattern holds three arrays:
/// - row_ptr: size n_rows + 1, row r owns positions `row_ptr[r]..row_ptr[r + 1]`
/// - col_idx: size nnz, column index of every nonzero
/// - row_of: size nnz, row index of every nonzero (the COO row array)
///
/// `row_of` is expanded once at construction and always agrees with
/// `row_ptr`. Column indices are validated against `n_cols` once here,
/// so kernels index operands without per-access checks.
///
/// Duplicate columns within a row are kept as independent entries.
#[derive(Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    row_of: Vec<usize>,
}

impl SparsityPattern {
    /// Creates a validated pattern from CSR row pointers and column indices
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `row_ptr.len() != n_rows + 1`, `row_ptr[0] != 0`,
    ///   `row_ptr` decreases anywhere, or `row_ptr[n_rows] != col_idx.len()`
    /// - `OutOfRange` if any column index is `>= n_cols`
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Result<Self> {
        if row_ptr.len() != n_rows + 1 {
            return Err(Error::DimensionMismatch {
                what: "row_ptr length",
                expected: n_rows + 1,
                got: row_ptr.len(),
            });
        }
        if row_ptr[0] != 0 {
            return Err(Error::DimensionMismatch {
                what: "row_ptr[0]",
                expected: 0,
                got: row_ptr[0],
            });
        }
        if let Some(r) = row_ptr.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::DimensionMismatch {
                what: "row_ptr monotonicity",
                expected: row_ptr[r],
                got: row_ptr[r + 1],
            });
        }
        if row_ptr[n_rows] != col_idx.len() {
            return Err(Error::DimensionMismatch {
                what: "row_ptr[n_rows] (nnz)",
                expected: col_idx.len(),
                got: row_ptr[n_rows],
            });
        }
        if let Some(position) = col_idx.iter().position(|&c| c >= n_cols) {
            return Err(Error::OutOfRange {
                position,
                col: col_idx[position],
                n_cols,
            });
        }

        let row_of = expand_row_ptr(&row_ptr);
        debug!(n_rows, n_cols, nnz = col_idx.len(), "built sparsity pattern");

        Ok(Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            row_of,
        })
    }

    /// Creates a pattern from the loader tuple `{M, N, nnz, row_ptr, col_idx}`
    ///
    /// Same as [`SparsityPattern::new`], additionally checking the declared nnz.
    pub fn from_parts(
        n_rows: usize,
        n_cols: usize,
        nnz: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
    ) -> Result<Self> {
        if col_idx.len() != nnz {
            return Err(Error::DimensionMismatch {
                what: "col_idx length (nnz)",
                expected: nnz,
                got: col_idx.len(),
            });
        }
        Self::new(n_rows, n_cols, row_ptr, col_idx)
    }

    /// Creates a pattern with no nonzeros
    pub fn empty(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            row_ptr: vec![0; n_rows + 1],
            col_idx: Vec::new(),
            row_of: Vec::new(),
        }
    }

    /// Number of rows M
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns N
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of nonzero entries
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// CSR row pointers
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// Column index of every nonzero, in linear order
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// Row index of every nonzero, in linear order
    pub fn row_of(&self) -> &[usize] {
        &self.row_of
    }

    /// Linear position range of row `r`
    pub fn row_range(&self, r: usize) -> std::ops::Range<usize> {
        self.row_ptr[r]..self.row_ptr[r + 1]
    }

    /// Column indices of row `r`
    pub fn row_cols(&self, r: usize) -> &[usize] {
        &self.col_idx[self.row_range(r)]
    }

    /// Number of nonzeros in row `r`
    pub fn row_nnz(&self, r: usize) -> usize {
        self.row_ptr[r + 1] - self.row_ptr[r]
    }

    /// Fraction of sampled positions, `nnz / (M * N)`
    pub fn density(&self) -> f64 {
        let cells = self.n_rows as f64 * self.n_cols as f64;
        if cells == 0.0 {
            0.0
        } else {
            self.nnz() as f64 / cells
        }
    }

    /// Iterates `(row, col)` coordinates in linear order
    pub fn coords(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.row_of.iter().copied().zip(self.col_idx.iter().copied())
    }

    /// True when every row's column indices are strictly increasing
    pub fn has_sorted_unique_rows(&self) -> bool {
        (0..self.n_rows).all(|r| self.row_cols(r).windows(2).all(|w| w[0] < w[1]))
    }
}

impl fmt::Debug for SparsityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparsityPattern {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        let max_rows_to_print = 5.min(self.n_rows);

        for r in 0..max_rows_to_print {
            let cols = self.row_cols(r);
            if cols.is_empty() {
                writeln!(f, "    row {}: (empty)", r)?;
            } else {
                let shown = 8.min(cols.len());
                write!(f, "    row {}: {:?}", r, &cols[..shown])?;
                if cols.len() > shown {
                    write!(f, " ... ({} more)", cols.len() - shown)?;
                }
                writeln!(f)?;
            }
        }

        if self.n_rows > max_rows_to_print {
            writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
        }

        write!(f, "}}")
    }
}
