//! Advisory comparison of strategy output against the reference

use num_traits::Float;

use crate::error::{Error, Result};
use crate::matrix::{Tolerance, SparsityPattern};

/// Checks `got` against `expected` position by position
///
/// # Errors
///
/// - `DimensionMismatch` if the lengths differ
/// - `NumericMismatch` naming the first offending position and the total count
pub fn compare_outputs<T: Float>(
    strategy: &str,
    got: &[T],
    expected: &[T],
    tolerance: &Tolerance,
) -> Result<()> {
    if got.len() != expected.len() {
        return Err(Error::DimensionMismatch {
            what: "output length",
            expected: expected.len(),
            got: got.len(),
        });
    }

    let mut first = None;
    let mut mismatches = 0;

    for (p, (&g, &e)) in got.iter().zip(expected).enumerate() {
        let g = g.to_f64().unwrap_or(f64::NAN);
        let e = e.to_f64().unwrap_or(f64::NAN);
        if !tolerance.matches(g, e) {
            mismatches += 1;
            first.get_or_insert((p, e, g));
        }
    }

    match first {
        None => Ok(()),
        Some((position, expected, got)) => Err(Error::NumericMismatch {
            strategy: strategy.to_string(),
            mismatches,
            position,
            expected,
            got,
        }),
    }
}

/// Reorders each row's entries of `values` by ascending column
///
/// Returns the sorted pattern alongside the permuted values, so outputs of
/// two patterns holding the same per-row multisets can be compared.
pub fn sort_rows<T: Copy>(pattern: &SparsityPattern, values: &[T]) -> Result<(SparsityPattern, Vec<T>)> {
    if values.len() != pattern.nnz() {
        return Err(Error::DimensionMismatch {
            what: "values length",
            expected: pattern.nnz(),
            got: values.len(),
        });
    }

    let mut col_idx = Vec::with_capacity(pattern.nnz());
    let mut sorted = Vec::with_capacity(values.len());

    for r in 0..pattern.n_rows() {
        let range = pattern.row_range(r);
        let mut entries: Vec<(usize, T)> = pattern.col_idx()[range.clone()]
            .iter()
            .copied()
            .zip(values[range].iter().copied())
            .collect();
        entries.sort_by_key(|&(c, _)| c);
        for (c, v) in entries {
            col_idx.push(c);
            sorted.push(v);
        }
    }

    let sorted_pattern = SparsityPattern::new(
        pattern.n_rows(),
        pattern.n_cols(),
        pattern.row_ptr().to_vec(),
        col_idx,
    )?;
    Ok((sorted_pattern, sorted))
}
