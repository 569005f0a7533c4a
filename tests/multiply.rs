use foxmm::utils::{results_match, serial_multiply};
use foxmm::{initialize_grid, multiply, multiply_with, shutdown, FoxError, Initialize, RandomInit};
use ndarray::Array2;
use proptest::prelude::*;
use std::time::Duration;

const TOL: f64 = 1e-9;

fn check(workers: usize, n: usize, seed: u64) {
    let grid = initialize_grid(workers).unwrap();
    let a = RandomInit::new(seed).generate(n);
    let b = RandomInit::new(seed + 1).generate(n);
    let c = multiply(&grid, &a, &b, n).unwrap();
    assert!(
        results_match(&c, &serial_multiply(&a, &b), TOL),
        "mismatch for {} workers, n = {}",
        workers,
        n
    );
    shutdown(grid);
}

#[test]
fn all_ones_on_two_by_two_grid() {
    let grid = initialize_grid(4).unwrap();
    let a = Array2::<f64>::ones((4, 4));
    let c = multiply(&grid, &a, &a, 4).unwrap();
    assert_eq!(c, Array2::from_elem((4, 4), 4.));
}

#[test]
fn single_worker_equals_local_product() {
    let grid = initialize_grid(1).unwrap();
    let a = Array2::from_shape_vec((2, 2), vec![1.5, -2., 0.25, 3.]).unwrap();
    let b = Array2::from_shape_vec((2, 2), vec![4., 1., -1., 0.5]).unwrap();
    let c = multiply(&grid, &a, &b, 2).unwrap();
    assert_eq!(c, serial_multiply(&a, &b));
}

#[test]
fn matches_serial_product() {
    check(1, 5, 11);
    check(4, 6, 12);
    check(9, 9, 13);
    check(9, 27, 14);
    check(16, 32, 15);
}

#[test]
fn identity_leaves_matrix_unchanged() {
    for (workers, n) in [(1, 3), (4, 8), (9, 12)] {
        let grid = initialize_grid(workers).unwrap();
        let a = RandomInit::new(n as u64).generate(n);
        let c = multiply(&grid, &a, &Array2::eye(n), n).unwrap();
        assert!(results_match(&c, &a, TOL));
    }
}

#[test]
fn non_square_worker_count_is_rejected() {
    assert!(matches!(initialize_grid(5), Err(FoxError::Configuration(_))));
    assert!(matches!(initialize_grid(0), Err(FoxError::Configuration(_))));
}

#[test]
fn indivisible_size_is_rejected() {
    let grid = initialize_grid(4).unwrap();
    let a = Array2::<f64>::ones((7, 7));
    assert!(matches!(
        multiply(&grid, &a, &a, 7),
        Err(FoxError::Configuration(_))
    ));
}

#[test]
fn timeout_does_not_trigger_on_healthy_run() {
    let grid = initialize_grid(4).unwrap();
    let a = Array2::<f64>::ones((8, 8));
    let c = multiply_with(&grid, &a, &a, 8, Some(Duration::from_secs(10))).unwrap();
    assert!(c.iter().all(|v| *v == 8.));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn product_matches_oracle(q in 1usize..4, k in 1usize..4, seed in any::<u64>()) {
        let n = q * k;
        let grid = initialize_grid(q * q).unwrap();
        let a = RandomInit::new(seed).generate(n);
        let b = RandomInit::new(seed.wrapping_add(1)).generate(n);
        let c = multiply(&grid, &a, &b, n).unwrap();
        prop_assert!(results_match(&c, &serial_multiply(&a, &b), TOL));
    }
}
