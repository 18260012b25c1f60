mod common;

use grid_particles::utils::prefix_sum::{exclusive_scan, exclusive_scan_sequential, PrefixSum};
use rand::Rng;

#[test]
fn exclusive_scan_of_small_counts() {
    let mut counts = vec![3, 0, 2, 1];
    let total = exclusive_scan(&mut counts);
    assert_eq!(counts, vec![0, 3, 3, 5]);
    assert_eq!(total, 6);
}

#[test]
fn empty_scan_is_a_no_op() {
    let mut counts: Vec<u32> = Vec::new();
    assert_eq!(exclusive_scan(&mut counts), 0);
    assert!(counts.is_empty());
}

#[test]
fn parallel_scan_matches_sequential_scan() {
    let mut rng = common::rng(11);
    for n in [1, 2, 3, 5, 17, 512, 1000, 4097, 100_000, 262_144] {
        let original: Vec<u32> = (0..n).map(|_| rng.random_range(0..16)).collect();

        let mut expected = original.clone();
        let expected_total = exclusive_scan_sequential(&mut expected);

        let mut actual = original.clone();
        let actual_total = exclusive_scan(&mut actual);

        assert_eq!(actual_total, expected_total, "total for n = {n}");
        assert_eq!(actual, expected, "offsets for n = {n}");
    }
}

#[test]
fn scan_is_idempotent_for_fixed_counts() {
    let mut rng = common::rng(5);
    let counts: Vec<u32> = (0..30_000).map(|_| rng.random_range(0..4)).collect();
    let mut prefix_sum = PrefixSum::new(counts.len());

    let mut first = counts.clone();
    prefix_sum.execute(&mut first);
    for _ in 0..5 {
        let mut again = counts.clone();
        prefix_sum.execute(&mut again);
        assert_eq!(again, first);
    }
}
