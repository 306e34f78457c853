//! Basic tests for sparsity patterns and operand checks

use ndarray::Array2;
use sddmm::matrix::check_operands;
use sddmm::{Error, SparsityPattern};

/// 4×4 pattern with an empty row:
/// [. x . .]
/// [x . x .]
/// [. . . .]
/// [. . . x]
fn sample() -> SparsityPattern {
    SparsityPattern::new(4, 4, vec![0, 1, 3, 3, 4], vec![1, 0, 2, 3]).unwrap()
}

#[test]
fn test_pattern_creation() {
    let s = sample();

    assert_eq!(s.n_rows(), 4);
    assert_eq!(s.n_cols(), 4);
    assert_eq!(s.nnz(), 4);
    assert_eq!(s.row_of(), &[0, 1, 1, 3]);

    // Check each row
    assert_eq!(s.row_cols(0), &[1]);
    assert_eq!(s.row_cols(1), &[0, 2]);
    assert!(s.row_cols(2).is_empty());
    assert_eq!(s.row_nnz(3), 1);

    let coords: Vec<_> = s.coords().collect();
    assert_eq!(coords, vec![(0, 1), (1, 0), (1, 2), (3, 3)]);
    assert!((s.density() - 0.25).abs() < 1e-12);
}

#[test]
fn test_row_of_agrees_with_row_ptr() {
    let s = SparsityPattern::new(5, 3, vec![0, 0, 3, 3, 4, 6], vec![0, 1, 2, 2, 0, 0]).unwrap();

    for r in 0..s.n_rows() {
        for p in s.row_range(r) {
            assert_eq!(s.row_of()[p], r);
        }
    }
    // Duplicate columns are kept
    assert!(!s.has_sorted_unique_rows());
}

#[test]
fn test_invalid_row_ptr() {
    let short = SparsityPattern::new(3, 3, vec![0, 1, 2], vec![0, 1]);
    assert!(matches!(short, Err(Error::DimensionMismatch { .. })));

    let offset = SparsityPattern::new(2, 3, vec![1, 1, 2], vec![0, 1]);
    assert!(matches!(offset, Err(Error::DimensionMismatch { .. })));

    let decreasing = SparsityPattern::new(2, 3, vec![0, 2, 1], vec![0]);
    assert!(matches!(decreasing, Err(Error::DimensionMismatch { .. })));

    let wrong_nnz = SparsityPattern::new(2, 3, vec![0, 1, 2], vec![0, 1, 2]);
    assert!(matches!(wrong_nnz, Err(Error::DimensionMismatch { .. })));
}

#[test]
fn test_column_out_of_range() {
    let err = SparsityPattern::new(2, 3, vec![0, 1, 2], vec![0, 3]).unwrap_err();
    assert!(matches!(
        err,
        Error::OutOfRange {
            position: 1,
            col: 3,
            n_cols: 3
        }
    ));
}

#[test]
fn test_from_parts_checks_declared_nnz() {
    let err = SparsityPattern::from_parts(2, 2, 3, vec![0, 1, 2], vec![0, 1]).unwrap_err();
    assert!(matches!(err, Error::DimensionMismatch { .. }));

    let ok = SparsityPattern::from_parts(2, 2, 2, vec![0, 1, 2], vec![0, 1]).unwrap();
    assert_eq!(ok.nnz(), 2);
}

#[test]
fn test_empty_pattern() {
    let s = SparsityPattern::empty(3, 7);
    assert_eq!(s.nnz(), 0);
    assert_eq!(s.row_ptr(), &[0, 0, 0, 0]);
    assert!(s.row_of().is_empty());
    assert_eq!(s, SparsityPattern::new(3, 7, vec![0; 4], vec![]).unwrap());
}

#[test]
fn test_operand_shapes() {
    let s = sample();
    let a = Array2::<f32>::zeros((4, 8));
    let b = Array2::<f32>::zeros((4, 8));
    assert!(check_operands(&s, &a.view(), &b.view(), 8).is_ok());

    let short_a = Array2::<f32>::zeros((3, 8));
    assert!(matches!(
        check_operands(&s, &short_a.view(), &b.view(), 8),
        Err(Error::DimensionMismatch { what: "A rows", .. })
    ));

    assert!(matches!(
        check_operands(&s, &a.view(), &b.view(), 4),
        Err(Error::DimensionMismatch { .. })
    ));
}
