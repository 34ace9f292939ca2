//! Contract tests for the fold splitter.
//!
//! Each FALSIFY test names the property it tries to break. If a test in
//! this file fails, the splitter can leak held-out reactions into training
//! or silently drop records, so treat failures here as release blockers.

use proptest::prelude::*;

use super::*;

fn assert_disjoint(a: &[usize], b: &[usize]) {
    let set: std::collections::HashSet<usize> = a.iter().copied().collect();
    assert!(b.iter().all(|i| !set.contains(i)));
}

// FALSIFY-MS-001: train, valid and test never share an index.
#[test]
fn falsify_ms_001_partitions_are_disjoint() {
    let splitter = CrossValSplitter::new(4).with_random_state(13);
    for fold in 0..4 {
        for member in 0..3 {
            let f = splitter.fold_indices(37, fold, member).unwrap();
            assert_disjoint(&f.train, &f.valid);
            assert_disjoint(&f.train, &f.test);
            assert_disjoint(&f.valid, &f.test);
        }
    }
}

// FALSIFY-MS-002: without sampling, every index appears exactly once.
#[test]
fn falsify_ms_002_partitions_cover_dataset() {
    let splitter = CrossValSplitter::new(4).with_random_state(13);
    for fold in 0..4 {
        let f = splitter.fold_indices(37, fold, 0).unwrap();
        let mut all: Vec<usize> = f
            .train
            .iter()
            .chain(f.valid.iter())
            .chain(f.test.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
    }
}

// FALSIFY-MS-003: the test slices of all folds tile the dataset.
#[test]
fn falsify_ms_003_test_slices_tile_dataset() {
    let splitter = CrossValSplitter::new(5);
    let mut all = Vec::new();
    for fold in 0..5 {
        let (lo, hi) = splitter.test_range(23, fold);
        all.extend(lo..hi);
    }
    assert_eq!(all, (0..23).collect::<Vec<_>>());
}

// FALSIFY-MS-004: the test slice of a fold never depends on the ensemble
// member. A member-dependent test set would make ensemble averaging
// compare predictions of different reactions.
#[test]
fn falsify_ms_004_test_set_invariant_across_members() {
    let splitter = CrossValSplitter::new(3).with_random_state(99);
    for fold in 0..3 {
        let reference = splitter.fold_indices(50, fold, 0).unwrap().test;
        for member in 1..6 {
            let f = splitter.fold_indices(50, fold, member).unwrap();
            assert_eq!(f.test, reference);
        }
    }
}

proptest! {
    // FALSIFY-MS-005: the disjointness and coverage properties hold for
    // arbitrary dataset sizes and fold counts.
    #[test]
    fn falsify_ms_005_partition_properties_hold(
        n in 10usize..200,
        k in 2usize..8,
        member in 0usize..4,
    ) {
        prop_assume!(n >= k * 2);
        let splitter = CrossValSplitter::new(k).with_random_state(1);
        for fold in 0..k {
            let f = splitter.fold_indices(n, fold, member).unwrap();
            let mut all: Vec<usize> = f
                .train
                .iter()
                .chain(f.valid.iter())
                .chain(f.test.iter())
                .copied()
                .collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
        }
    }
}
