//! NumPy `.npz` pattern reader
//!
//! The archive holds three integer arrays: `shape` (`[M, N, nnz]`, or
//! `[M, N]` as written by `scipy.sparse.save_npz`), `indptr` and `indices`.
//! Any `data` array is ignored.

use ndarray::{Array1, Ix1, OwnedRepr};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::info;

use crate::error::{Error, Result};
use crate::matrix::SparsityPattern;

/// Reads the sparsity pattern stored in a `.npz` archive
pub fn read_npz<P: AsRef<Path>>(path: P) -> Result<SparsityPattern> {
    let file = File::open(path.as_ref())?;
    let pattern = parse_npz(file)?;
    info!(
        path = %path.as_ref().display(),
        rows = pattern.n_rows(),
        cols = pattern.n_cols(),
        nnz = pattern.nnz(),
        "loaded sparsity pattern"
    );
    Ok(pattern)
}

/// Builds a pattern from the `shape`, `indptr` and `indices` arrays of an archive
pub fn parse_npz<R: Read + Seek>(reader: R) -> Result<SparsityPattern> {
    let mut npz = NpzReader::new(reader)?;
    let names = npz.names()?;

    let shape = read_indices(&mut npz, &names, "shape")?;
    let row_ptr = read_indices(&mut npz, &names, "indptr")?;
    let col_idx = read_indices(&mut npz, &names, "indices")?;

    let (n_rows, n_cols, nnz) = match shape[..] {
        [m, n, nnz] => (m, n, nnz),
        [m, n] => (m, n, col_idx.len()),
        _ => {
            return Err(Error::InvalidInput {
                arg: "shape",
                reason: format!("expected [M, N, nnz] or [M, N], got {} values", shape.len()),
            })
        }
    };

    SparsityPattern::from_parts(n_rows, n_cols, nnz, row_ptr, col_idx)
}

/// Reads a 1-D integer array stored as `i64` or `i32`
fn read_indices<R: Read + Seek>(
    npz: &mut NpzReader<R>,
    names: &[String],
    name: &'static str,
) -> Result<Vec<usize>> {
    let entry = names
        .iter()
        .find(|n| n.as_str() == name || n.strip_suffix(".npy") == Some(name))
        .ok_or_else(|| Error::InvalidInput {
            arg: name,
            reason: "array missing from archive".to_string(),
        })?;

    let wide: Vec<i64> = match npz.by_name::<OwnedRepr<i64>, Ix1>(entry) {
        Ok(values) => values.to_vec(),
        Err(_) => {
            let narrow: Array1<i32> = npz.by_name::<OwnedRepr<i32>, Ix1>(entry)?;
            narrow.iter().map(|&v| i64::from(v)).collect()
        }
    };

    wide.into_iter()
        .map(|v| {
            usize::try_from(v).map_err(|_| Error::InvalidInput {
                arg: name,
                reason: format!("negative or oversized value {v}"),
            })
        })
        .collect()
}
