//! Fold splitting for ensembled k-fold cross-validation.
//!
//! Each fold carves a contiguous test slice out of the (already shuffled)
//! dataset; the remaining indices are reshuffled per ensemble member and
//! split into training and validation sets. The test slice depends only on
//! the fold index, so every ensemble member of a fold is evaluated on the
//! same reactions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{ReaccionError, Result};

/// Index sets for one (fold, ensemble member) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    /// Fold index in `0..k`.
    pub index: usize,
    /// Training indices, shuffled with the member seed.
    pub train: Vec<usize>,
    /// Validation indices, disjoint from `train`.
    pub valid: Vec<usize>,
    /// Held-out test indices, identical across members of this fold.
    pub test: Vec<usize>,
}

/// K-fold splitter with per-member train/validation reshuffling.
///
/// Fold boundaries follow the evenly spaced grid `i * n / k` (integer
/// floor), so fold sizes differ by at most one even when `k` does not
/// divide `n`.
///
/// # Example
///
/// ```
/// use reaccion::model_selection::CrossValSplitter;
///
/// let splitter = CrossValSplitter::new(5).with_random_state(42);
/// let fold = splitter.fold_indices(100, 0, 0).unwrap();
/// assert_eq!(fold.test, (0..20).collect::<Vec<_>>());
/// assert_eq!(fold.train.len() + fold.valid.len(), 80);
/// ```
#[derive(Debug, Clone)]
pub struct CrossValSplitter {
    k: usize,
    valid_fraction: f32,
    random_state: u64,
    sample: Option<usize>,
    held_out: Option<Vec<usize>>,
}

impl CrossValSplitter {
    /// Creates a splitter with `k` folds, a 10% validation fraction and
    /// random state 0.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            valid_fraction: 0.1,
            random_state: 0,
            sample: None,
            held_out: None,
        }
    }

    /// Sets the fraction of the non-test pool held out for validation.
    #[must_use]
    pub fn with_valid_fraction(mut self, fraction: f32) -> Self {
        self.valid_fraction = fraction;
        self
    }

    /// Sets the base random state.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = random_state;
        self
    }

    /// Caps the training pool at `sample` reactions per fold, drawn with
    /// the member seed. Used for learning-curve runs.
    #[must_use]
    pub fn with_sample(mut self, sample: usize) -> Self {
        self.sample = Some(sample);
        self
    }

    /// Evaluates every fold on this fixed index set instead of a slice of
    /// the dataset. Used when an external held-out test set is provided;
    /// the folds then only vary the train/validation partition.
    #[must_use]
    pub fn with_held_out(mut self, indices: Vec<usize>) -> Self {
        self.held_out = Some(indices);
        self
    }

    /// Number of folds.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// The half-open test range of a fold.
    #[must_use]
    pub fn test_range(&self, n_samples: usize, fold: usize) -> (usize, usize) {
        (fold * n_samples / self.k, (fold + 1) * n_samples / self.k)
    }

    /// The test indices of a fold: the evenly spaced slice, or the fixed
    /// held-out set when one is configured.
    #[must_use]
    pub fn test_indices(&self, n_samples: usize, fold: usize) -> Vec<usize> {
        match &self.held_out {
            Some(indices) => indices.clone(),
            None => {
                let (lo, hi) = self.test_range(n_samples, fold);
                (lo..hi).collect()
            }
        }
    }

    /// Builds the index sets for one (fold, member) pair.
    ///
    /// The member seed is `random_state + fold * 1_000_003 + member`, so
    /// runs with the same configuration reproduce splits exactly while
    /// members within a fold still see different train/validation
    /// partitions. The prime fold stride keeps (fold, member) seeds
    /// distinct for any ensemble smaller than the stride.
    ///
    /// # Errors
    ///
    /// Returns [`ReaccionError::InvalidHyperparameter`] when `k < 2`, when
    /// `fold` is out of range, when the dataset has fewer records than
    /// folds, when the validation fraction is outside `(0, 1)`, or when a
    /// requested sample exceeds the available training pool.
    pub fn fold_indices(&self, n_samples: usize, fold: usize, member: usize) -> Result<Fold> {
        if self.held_out.is_none() && self.k < 2 {
            return Err(invalid("k_fold", self.k, "must be at least 2"));
        }
        if fold >= self.k {
            return Err(invalid("fold", fold, "must be less than k_fold"));
        }
        if self.held_out.is_none() && n_samples < self.k {
            return Err(invalid(
                "k_fold",
                self.k,
                "must not exceed the number of records",
            ));
        }
        if !(self.valid_fraction > 0.0 && self.valid_fraction < 1.0) {
            return Err(ReaccionError::InvalidHyperparameter {
                param: "valid_fraction".to_string(),
                value: self.valid_fraction.to_string(),
                constraint: "must lie strictly between 0 and 1".to_string(),
            });
        }
        if let Some(held) = &self.held_out {
            if held.iter().any(|&i| i >= n_samples) {
                return Err(invalid(
                    "held_out",
                    n_samples,
                    "held-out indices must be within the dataset",
                ));
            }
        }

        let test = self.test_indices(n_samples, fold);
        let in_test: std::collections::HashSet<usize> = test.iter().copied().collect();
        let mut pool: Vec<usize> = (0..n_samples).filter(|i| !in_test.contains(i)).collect();

        let seed = self.random_state + (fold as u64) * 1_000_003 + member as u64;
        let mut rng = StdRng::seed_from_u64(seed);
        pool.shuffle(&mut rng);

        if let Some(sample) = self.sample {
            if sample > pool.len() {
                return Err(invalid(
                    "sample",
                    sample,
                    "must not exceed the non-test pool size",
                ));
            }
            pool.truncate(sample);
        }

        let n_valid = ((pool.len() as f32) * self.valid_fraction).round() as usize;
        let valid = pool[..n_valid].to_vec();
        let train = pool[n_valid..].to_vec();

        Ok(Fold {
            index: fold,
            train,
            valid,
            test,
        })
    }
}

fn invalid(param: &str, value: usize, constraint: &str) -> ReaccionError {
    ReaccionError::InvalidHyperparameter {
        param: param.to_string(),
        value: value.to_string(),
        constraint: constraint.to_string(),
    }
}


#[cfg(test)]
#[path = "tests_kfold_contract.rs"]
mod tests_kfold_contract;
