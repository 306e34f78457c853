//! Validate the reference oracle against a dense ndarray product

use ndarray::{array, Array2};
use sddmm::utils::{random_dense, seeded_rng};
use sddmm::{reference_sddmm, to_sprs_csr, SparsityPattern};

/// Create a 4x5 pattern:
/// [x x . . .]
/// [. x x . x]
/// [. . . . .]
/// [x . . x x]
fn create_test_pattern() -> SparsityPattern {
    let row_ptr = vec![0, 2, 5, 5, 8];
    let col_idx = vec![0, 1, 1, 2, 4, 0, 3, 4];
    SparsityPattern::new(4, 5, row_ptr, col_idx).unwrap()
}

#[test]
fn test_reference_vs_dense_product() {
    let s = create_test_pattern();
    let mut rng = seeded_rng(11);
    let a: Array2<f64> = random_dense(4, 6, &mut rng).unwrap();
    let b: Array2<f64> = random_dense(5, 6, &mut rng).unwrap();

    let c = reference_sddmm(&s, a.view(), b.view(), 6).unwrap();
    let full = a.dot(&b.t());

    for (p, (r, col)) in s.coords().enumerate() {
        assert!(
            (c[p] - full[[r, col]]).abs() < 1e-12,
            "Value mismatch at ({}, {}): {} vs {}",
            r,
            col,
            c[p],
            full[[r, col]]
        );
    }
}

#[test]
fn test_reference_as_sprs_matrix() {
    let s = create_test_pattern();
    let a = array![[1.0f64, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, -1.0]];
    let b = array![[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0], [7.0, 8.0], [9.0, 10.0]];

    let c = reference_sddmm(&s, a.view(), b.view(), 2).unwrap();
    let sampled = to_sprs_csr(&s, c).unwrap();

    // Only sampled positions are stored
    assert_eq!(sampled.nnz(), 8);
    assert_eq!(sampled.get(0, 1), Some(&3.0));
    assert_eq!(sampled.get(1, 4), Some(&10.0));
    assert_eq!(sampled.get(3, 3), Some(&6.0));
    assert_eq!(sampled.get(2, 0), None);
    assert_eq!(sampled.get(0, 2), None);
}

#[test]
fn test_ascending_accumulation_order() {
    // 1e17 + 1 - 1e17 loses the 1 in f64 when summed left to right
    let s = SparsityPattern::new(1, 1, vec![0, 1], vec![0]).unwrap();
    let a = array![[1e17f64, 1.0, -1e17]];
    let b = array![[1.0f64, 1.0, 1.0]];

    let c = reference_sddmm(&s, a.view(), b.view(), 3).unwrap();
    assert_eq!(c, vec![0.0]);
}

#[test]
fn test_duplicate_entries_computed_independently() {
    let s = SparsityPattern::new(1, 2, vec![0, 3], vec![1, 1, 0]).unwrap();
    let a = array![[2.0f32, 3.0]];
    let b = array![[1.0f32, 1.0], [4.0, 5.0]];

    let c = reference_sddmm(&s, a.view(), b.view(), 2).unwrap();
    assert_eq!(c, vec![23.0, 23.0, 5.0]);
}
