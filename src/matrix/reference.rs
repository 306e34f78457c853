//! Reference implementation of SDDMM
//!
//! This provides the baseline for correctness testing of the parallel
//! strategies. It is a plain sequential loop with an ascending-index
//! accumulation order, so its output is reproducible bit-for-bit.

use ndarray::ArrayView2;
use num_traits::Float;

use crate::error::Result;
use crate::matrix::operands::{check_operands, check_output, row_major};
use crate::utils::try_alloc;
use crate::matrix::SparsityPattern;

/// Computes `C[p] = Σ_t A[row_of[p]][t] * B[col_idx[p]][t]` for every nonzero p
///
/// The output has one value per nonzero in the pattern's linear order and
/// never depends on any previous output contents.
///
/// # Errors
///
/// `DimensionMismatch` if A is not `M×K` or B is not `N×K`.
pub fn reference_sddmm<T: Float>(
    pattern: &SparsityPattern,
    a: ArrayView2<'_, T>,
    b: ArrayView2<'_, T>,
    k: usize,
) -> Result<Vec<T>> {
    let mut c = try_alloc(pattern.nnz(), "reference output")?;
    reference_sddmm_into(pattern, a, b, k, &mut c)?;
    Ok(c)
}

/// Same as [`reference_sddmm`], writing into a caller-owned buffer of length nnz
///
/// Every slot of `out` is overwritten; its previous contents are never read.
pub fn reference_sddmm_into<T: Float>(
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

    for (slot, (r, col)) in out.iter_mut().zip(pattern.coords()) {
        let a_row = &a[r * k..(r + 1) * k];
        let b_row = &b[col * k..(col + 1) * k];
        let mut acc = T::zero();
        for t in 0..k {
            acc = acc + a_row[t] * b_row[t];
        }
        *slot = acc;
    }

    Ok(())
}
