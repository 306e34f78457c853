//! Dense operand checks and row-major access

use ndarray::ArrayView2;
use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::matrix::SparsityPattern;

/// Validates `A (M×K)` and `B (N×K)` against the pattern and the declared K
pub fn check_operands<T>(
    pattern: &SparsityPattern,
    a: &ArrayView2<'_, T>,
    b: &ArrayView2<'_, T>,
    k: usize,
) -> Result<()> {
    let checks = [
        ("A rows", pattern.n_rows(), a.nrows()),
        ("A columns (K)", k, a.ncols()),
        ("B rows", pattern.n_cols(), b.nrows()),
        ("B columns (K)", k, b.ncols()),
    ];

    for (what, expected, got) in checks {
        if expected != got {
            return Err(Error::DimensionMismatch {
                what,
                expected,
                got,
            });
        }
    }

    Ok(())
}

/// Checks that an output buffer holds exactly one slot per nonzero
pub fn check_output<T>(pattern: &SparsityPattern, out: &[T]) -> Result<()> {
    if out.len() != pattern.nnz() {
        return Err(Error::DimensionMismatch {
            what: "output length",
            expected: pattern.nnz(),
            got: out.len(),
        });
    }
    Ok(())
}

/// Borrows the operand as one row-major slice, copying only if it is not already laid out that way
pub fn row_major<'a, T: Clone>(x: &'a ArrayView2<'_, T>) -> Cow<'a, [T]> {
    match x.as_slice() {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(x.iter().cloned().collect()),
    }
}
