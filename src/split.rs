//! Seeded train/evaluation split.

use crate::dataset::Dataset;
use crate::error::{Result, SweepError};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

/// Two disjoint subsets that together hold every example of the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub training: Dataset,
    pub evaluation: Dataset,
}

/// Number of evaluation rows for `n` examples.
///
/// `test_fraction * n` is rounded half up, then clamped so that both subsets
/// keep at least one example.
pub fn evaluation_size(n: usize, test_fraction: f64) -> usize {
    let rounded = (test_fraction * n as f64 + 0.5).floor() as usize;
    rounded.clamp(1, n.saturating_sub(1).max(1))
}

/// Shuffled `(training, evaluation)` row indices for `n` examples.
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<(Vec<usize>, Vec<usize>)> {
    if n < 2 {
        return Err(SweepError::TooFewExamples(n));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(SweepError::InvalidTestFraction(test_fraction));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let training = order.split_off(evaluation_size(n, test_fraction));
    Ok((training, order))
}

/// Splits `dataset` into training and evaluation subsets.
///
/// The seed is the only source of randomness, so equal inputs give equal
/// splits.
pub fn split(dataset: &Dataset, test_fraction: f64, seed: u64) -> Result<Split> {
    let (training, evaluation) = split_indices(dataset.len(), test_fraction, seed)?;
    debug!(
        training = training.len(),
        evaluation = evaluation.len(),
        seed,
        "dataset split"
    );
    Ok(Split {
        training: dataset.select(&training),
        evaluation: dataset.select(&evaluation),
    })
}
