//! Utility functions and helpers

pub mod formats;
pub mod random;

pub use formats::{from_sprs_csr, to_sprs_csr};
pub use random::{random_dense, random_values, seeded_rng};

use num_traits::Zero;

use crate::error::{Error, Result};

/// Reserves a zeroed buffer of `len` elements, reporting exhaustion instead of aborting
pub fn try_alloc<T: Zero + Clone>(len: usize, what: &'static str) -> Result<Vec<T>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len).map_err(|_| Error::AllocationFailure {
        what,
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    buf.resize(len, T::zero());
    Ok(buf)
}

/// Computes an exclusive prefix sum (scan) of per-row counts
///
/// The result has one more element than the input and starts at zero,
/// which is exactly a CSR row pointer for the given row lengths.
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0);

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// Expands CSR row pointers into one row index per nonzero (the COO row array)
///
/// `row_ptr` must be monotonically non-decreasing; empty rows contribute nothing.
pub fn expand_row_ptr(row_ptr: &[usize]) -> Vec<usize> {
    let nnz = row_ptr.last().copied().unwrap_or(0);
    let mut row_of = Vec::with_capacity(nnz);

    for (row, bounds) in row_ptr.windows(2).enumerate() {
        let len = bounds[1] - bounds[0];
        row_of.extend(std::iter::repeat(row).take(len));
    }

    row_of
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_alloc_zeroes() {
        let v: Vec<f32> = try_alloc(5, "test").unwrap();
        assert_eq!(v, vec![0.0; 5]);
    }

    #[test]
    fn try_alloc_reports_exhaustion() {
        let err = try_alloc::<f64>(usize::MAX / 2, "huge").unwrap_err();
        assert!(matches!(err, Error::AllocationFailure { what: "huge", .. }));
    }

    #[test]
    fn test_exclusive_scan() {
        let input = vec![1, 2, 3, 4];
        let expected = vec![0, 1, 3, 6, 10];
        assert_eq!(exclusive_scan(&input), expected);

        let input = vec![0, 0, 5, 0];
        let expected = vec![0, 0, 0, 5, 5];
        assert_eq!(exclusive_scan(&input), expected);
    }

    #[test]
    fn test_expand_row_ptr() {
        assert_eq!(expand_row_ptr(&[0, 1, 3, 3, 4]), vec![0, 1, 1, 3]);
        assert_eq!(expand_row_ptr(&[0, 0, 0]), Vec::<usize>::new());
        assert_eq!(expand_row_ptr(&[0]), Vec::<usize>::new());
    }

    #[test]
    fn scan_then_expand_recovers_rows() {
        let counts = [2, 0, 1, 3];
        let row_of = expand_row_ptr(&exclusive_scan(&counts));
        assert_eq!(row_of, vec![0, 0, 2, 3, 3, 3]);
    }
}
