use std::cmp::Ordering;
use std::collections::HashMap;

use classweep_helpers::{DataPoint, Distance, Float, Label};
use ndarray::ArrayView1;
use thiserror::Error;

/// Errors that can occur when using the k-NN classifier.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KnnError {
    /// k cannot be zero for a k-NN classifier
    #[error("k cannot be zero for a k-NN classifier")]
    InvalidK,
    /// Cannot predict with an empty training set
    #[error("cannot predict with an empty training set")]
    EmptyTrainingSet,
    /// The query has a different number of features than the training data
    #[error("query has {found} features, training data has {expected}")]
    MismatchedDimensions { expected: usize, found: usize },
    /// Invalid distance comparison (likely due to NaN values in data)
    #[error("invalid distance comparison (likely due to NaN values in data)")]
    InvalidDistance,
    /// Several classes received the same, highest number of votes
    #[error("could not determine a majority class among neighbors")]
    NoMajorityClass,
}

/// A k-Nearest Neighbors (k-NN) classifier.
///
/// This classifier predicts the label of a new data point by finding the `k`
/// most similar points in its training set and taking a majority vote among their labels.
///
/// # Type Parameters
///
/// * `L`: The type of the label (e.g., `String`, `i32`, or a custom `enum`).
/// * `F`: The float type for the features (e.g., `f32`, `f64`).
/// * `D`: The distance metric, which must implement the `Distance` trait.
#[derive(Debug, Clone)]
pub struct KnnClassifier<L, F, D>
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    k: usize,
    training_data: Vec<DataPoint<L, F>>,
    distance: D,
}

impl<L, F, D> KnnClassifier<L, F, D>
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    /// Creates a new k-NN classifier.
    ///
    /// # Arguments
    ///
    /// * `k`: The number of neighbors to consider for classification. Must be greater than 0.
    /// * `training_data`: A vector of `DataPoint`s that the classifier will learn from.
    /// * `distance`: An instance of a struct that implements the `Distance` trait (e.g., `L2Dist`).
    ///
    /// # Errors
    ///
    /// Returns `KnnError::InvalidK` if `k` is 0, as this is not a valid configuration.
    pub fn new(
        k: usize,
        training_data: Vec<DataPoint<L, F>>,
        distance: D,
    ) -> Result<Self, KnnError> {
        if k == 0 {
            return Err(KnnError::InvalidK);
        }
        Ok(Self {
            k,
            training_data,
            distance,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn len(&self) -> usize {
        self.training_data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.training_data.is_empty()
    }

    /// Predicts the label for a new, unseen data point.
    ///
    /// When `k` exceeds the training set size every training point votes.
    ///
    /// # Errors
    ///
    /// Returns `KnnError::EmptyTrainingSet` if the training data is empty.
    /// Returns `KnnError::MismatchedDimensions` if `features` has the wrong length.
    /// Returns `KnnError::InvalidDistance` if a distance is NaN.
    /// Returns `KnnError::NoMajorityClass` if the vote is tied.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, KnnError> {
        let expected = self
            .training_data
            .first()
            .ok_or(KnnError::EmptyTrainingSet)?
            .n_features();
        if features.len() != expected {
            return Err(KnnError::MismatchedDimensions {
                expected,
                found: features.len(),
            });
        }

        // 1. Reduced distance (e.g. squared Euclidean) to every training point.
        let mut distances: Vec<(F, &L)> = Vec::with_capacity(self.training_data.len());
        for dp in &self.training_data {
            let dist = self.distance.rdistance(dp.view(), features);
            if dist.is_nan() {
                return Err(KnnError::InvalidDistance);
            }
            distances.push((dist, &dp.label));
        }

        // 2. Closest first. NaNs were rejected above.
        distances.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        // 3. Votes among the k nearest.
        let num_neighbors = self.k.min(distances.len());
        let mut votes: HashMap<&L, usize> = HashMap::new();
        for (_, label) in &distances[..num_neighbors] {
            *votes.entry(label).or_insert(0) += 1;
        }

        let max_votes = votes
            .values()
            .copied()
            .max()
            .ok_or(KnnError::EmptyTrainingSet)?;
        let mut winners = votes
            .into_iter()
            .filter(|&(_, count)| count == max_votes)
            .map(|(label, _)| label);

        match (winners.next(), winners.next()) {
            (Some(label), None) => Ok(label.clone()),
            _ => Err(KnnError::NoMajorityClass),
        }
    }
}
