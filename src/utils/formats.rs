//! Utilities for converting between sparsity patterns and sprs matrices

use sprs::CsMat;

use crate::error::{Error, Result};
use crate::matrix::SparsityPattern;

/// Builds an sprs CSR matrix carrying `values` on the pattern's nonzeros
///
/// # Errors
///
/// - `DimensionMismatch` if `values.len() != pattern.nnz()`
/// - `InvalidInput` if a row has unsorted or duplicate column indices,
///   which sprs does not accept
pub fn to_sprs_csr<T: Clone>(pattern: &SparsityPattern, values: Vec<T>) -> Result<CsMat<T>> {
    if values.len() != pattern.nnz() {
        return Err(Error::DimensionMismatch {
            what: "sparse values length",
            expected: pattern.nnz(),
            got: values.len(),
        });
    }

    CsMat::try_new(
        (pattern.n_rows(), pattern.n_cols()),
        pattern.row_ptr().to_vec(),
        pattern.col_idx().to_vec(),
        values,
    )
    .map_err(|(_, _, _, err)| Error::InvalidInput {
        arg: "pattern",
        reason: format!("not representable as an sprs matrix: {err}"),
    })
}

/// Extracts the sparsity pattern of an sprs matrix, converting CSC to CSR first
///
/// Stored values are ignored.
pub fn from_sprs_csr<T: Clone + Default>(matrix: &CsMat<T>) -> Result<SparsityPattern> {
    let csr;
    let matrix = if matrix.is_csr() {
        matrix
    } else {
        csr = matrix.to_csr();
        &csr
    };

    let (n_rows, n_cols) = matrix.shape();
    let row_ptr = matrix.indptr().to_proper().into_owned();
    let col_idx = matrix.indices().to_vec();

    SparsityPattern::new(n_rows, n_cols, row_ptr, col_idx)
}
