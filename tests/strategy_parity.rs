//! Every strategy must agree with the reference on the same inputs

use ndarray::Array2;
use proptest::prelude::*;
use proptest::strategy::Strategy as _;
use std::sync::{Arc, OnceLock};

use sddmm::bench::validate::sort_rows;
use sddmm::utils::{random_dense, seeded_rng};
use sddmm::{
    create_strategy, reference_sddmm, Device, KernelParams, SampledProduct, SparsityPattern,
    Strategy, Tolerance,
};

fn device() -> Arc<Device> {
    static DEVICE: OnceLock<Arc<Device>> = OnceLock::new();
    Arc::clone(DEVICE.get_or_init(|| Arc::new(Device::new(4).unwrap())))
}

/// Small work units and a low cooperative threshold, so tiny inputs still
/// exercise the splitting paths
fn small_units() -> KernelParams {
    KernelParams {
        rows_per_unit: 1,
        entries_per_unit: 3,
        group_width: 4,
        cooperative_k_threshold: 8,
        ..KernelParams::default()
    }
}

fn pattern_from_rows(n_cols: usize, rows: &[Vec<usize>]) -> SparsityPattern {
    let mut row_ptr = vec![0];
    let mut col_idx = Vec::new();
    for row in rows {
        col_idx.extend_from_slice(row);
        row_ptr.push(col_idx.len());
    }
    SparsityPattern::new(rows.len(), n_cols, row_ptr, col_idx).unwrap()
}

fn operands(s: &SparsityPattern, k: usize, seed: u64) -> (Array2<f64>, Array2<f64>) {
    let mut rng = seeded_rng(seed);
    let a = random_dense(s.n_rows(), k, &mut rng).unwrap();
    let b = random_dense(s.n_cols(), k, &mut rng).unwrap();
    (a, b)
}

fn assert_close(strategy: Strategy, got: &[f64], expected: &[f64]) {
    assert_eq!(got.len(), expected.len(), "{strategy}: output length");
    let tol = Tolerance::for_f64();
    for (p, (&g, &e)) in got.iter().zip(expected).enumerate() {
        assert!(tol.matches(g, e), "{strategy}: position {p}: {g} vs {e}");
    }
}

fn check_all(s: &SparsityPattern, k: usize, seed: u64, params: &KernelParams) {
    let (a, b) = operands(s, k, seed);
    let expected = reference_sddmm(s, a.view(), b.view(), k).unwrap();

    for tag in Strategy::BENCHMARKED {
        let engine = create_strategy::<f64>(tag, &device(), params);
        engine.prepare(s).unwrap();
        let got = engine.compute(s, a.view(), b.view(), k).unwrap();
        assert_close(tag, &got, &expected);
    }
}

#[test]
fn test_skewed_rows() {
    // One full row among many empty or single-entry rows
    let n = 300;
    let mut rows: Vec<Vec<usize>> = (0..64).map(|r| if r % 3 == 0 { vec![r % n] } else { vec![] }).collect();
    rows[17] = (0..n).collect();
    let s = pattern_from_rows(n, &rows);

    check_all(&s, 24, 5, &KernelParams::default());
    check_all(&s, 24, 5, &small_units());
}

#[test]
fn test_all_rows_empty() {
    let s = SparsityPattern::empty(10, 10);
    for tag in Strategy::BENCHMARKED {
        let (a, b) = operands(&s, 4, 0);
        let engine = create_strategy::<f64>(tag, &device(), &KernelParams::default());
        assert!(engine.compute(&s, a.view(), b.view(), 4).unwrap().is_empty());
    }
}

#[test]
fn test_k_equals_one() {
    let s = pattern_from_rows(4, &[vec![0, 3], vec![], vec![1, 2, 2]]);
    check_all(&s, 1, 9, &KernelParams::default());
}

#[test]
fn test_long_k_cooperative_split() {
    let s = pattern_from_rows(3, &[vec![0, 1], vec![2], vec![0, 1, 2]]);
    let params = KernelParams {
        cooperative_k_threshold: 64,
        ..KernelParams::default()
    };
    check_all(&s, 1000, 3, &params);
}

#[test]
fn test_parallel_kernels_agree_bitwise() {
    let rows: Vec<Vec<usize>> = (0..40).map(|r| (0..(r % 7) * 3).map(|j| (r + j * 5) % 50).collect()).collect();
    let s = pattern_from_rows(50, &rows);
    let (a, b) = operands(&s, 96, 21);
    let params = small_units();

    let csr = create_strategy::<f64>(Strategy::RowParallel, &device(), &params);
    let coo = create_strategy::<f64>(Strategy::EdgeParallel, &device(), &params);

    let first = csr.compute(&s, a.view(), b.view(), 96).unwrap();
    let again = csr.compute(&s, a.view(), b.view(), 96).unwrap();
    let edge = coo.compute(&s, a.view(), b.view(), 96).unwrap();

    assert_eq!(first, again);
    assert_eq!(first, edge);
}

#[test]
fn test_f32_within_default_tolerance() {
    let rows: Vec<Vec<usize>> = (0..16).map(|r| vec![r, (r * 3) % 16, 15 - r]).collect();
    let s = pattern_from_rows(16, &rows);
    let mut rng = seeded_rng(77);
    let a: Array2<f32> = random_dense(16, 128, &mut rng).unwrap();
    let b: Array2<f32> = random_dense(16, 128, &mut rng).unwrap();

    let expected = reference_sddmm(&s, a.view(), b.view(), 128).unwrap();
    let tol = Tolerance::for_f32();
    for tag in Strategy::BENCHMARKED {
        let engine = create_strategy::<f32>(tag, &device(), &KernelParams::default());
        let got = engine.compute(&s, a.view(), b.view(), 128).unwrap();
        for (&g, &e) in got.iter().zip(&expected) {
            assert!(tol.matches(f64::from(g), f64::from(e)), "{tag}: {g} vs {e}");
        }
    }
}

/// Random pattern: up to 24 rows and columns, rows of 0..12 entries, duplicates allowed
fn arb_pattern() -> impl proptest::strategy::Strategy<Value = SparsityPattern> {
    (1usize..24, 1usize..24).prop_flat_map(|(m, n)| {
        prop::collection::vec(prop::collection::vec(0..n, 0..12), m)
            .prop_map(move |rows| pattern_from_rows(n, &rows))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_strategies_match_reference(s in arb_pattern(), k in 1usize..48, seed in any::<u64>()) {
        check_all(&s, k, seed, &KernelParams::default());
        check_all(&s, k, seed, &small_units());
    }

    #[test]
    fn prop_within_row_permutation_invariant(s in arb_pattern(), k in 1usize..16, seed in any::<u64>()) {
        let reversed_rows: Vec<Vec<usize>> = (0..s.n_rows())
            .map(|r| s.row_cols(r).iter().rev().copied().collect())
            .collect();
        let reversed = pattern_from_rows(s.n_cols(), &reversed_rows);
        let (a, b) = operands(&s, k, seed);

        for tag in [Strategy::Reference, Strategy::RowParallel, Strategy::EdgeParallel] {
            let engine = create_strategy::<f64>(tag, &device(), &small_units());
            let c = engine.compute(&s, a.view(), b.view(), k).unwrap();
            let c_rev = engine.compute(&reversed, a.view(), b.view(), k).unwrap();

            let (sorted, values) = sort_rows(&s, &c).unwrap();
            let (sorted_rev, values_rev) = sort_rows(&reversed, &c_rev).unwrap();
            prop_assert_eq!(sorted, sorted_rev);
            prop_assert_eq!(values, values_rev);
        }
    }
}
