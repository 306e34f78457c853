//! Sparse-matrix file loading
//!
//! Only the sparsity pattern is kept; stored values are discarded because
//! the benchmark generates its own operands.

pub mod matrix_market;
pub mod npz;

use std::path::Path;

use crate::error::Result;
use crate::matrix::SparsityPattern;

pub use matrix_market::{parse_matrix_market, read_matrix_market};
pub use npz::{parse_npz, read_npz};

/// Reads a pattern, choosing the format from the file extension
///
/// `.npz` files go through [`read_npz`]; everything else is read as
/// Matrix Market.
pub fn read_pattern<P: AsRef<Path>>(path: P) -> Result<SparsityPattern> {
    let path = path.as_ref();
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("npz") => read_npz(path),
        _ => read_matrix_market(path),
    }
}
