//! Linear binary classifiers: logistic regression, the perceptron and the
//! ridge classifier.
//!
//! All three learn a weight vector `w` and an intercept `b`, and predict the
//! positive class (the larger of the two labels) when `w·x + b > 0`.

use classweep_helpers::{DataPoint, Float, Label, sorted_classes, stack_features};
use ndarray::{Array1, Array2, ArrayView1};
use thiserror::Error;

mod logistic;
mod perceptron;
mod ridge;

pub use logistic::LogisticRegression;
pub use perceptron::Perceptron;
pub use ridge::RidgeClassifier;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinearError {
    #[error("training data is empty")]
    EmptyDataSet,
    #[error("data points have different numbers of features")]
    MismatchedDimensions,
    #[error("a binary classifier needs exactly two classes, found {0}")]
    NotBinary(usize),
    #[error("the normal equations are singular")]
    SingularSystem,
}

/// A fitted linear decision function over two classes.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel<L: Label, F: Float> {
    pub weights: Array1<F>,
    pub intercept: F,
    negative: L,
    positive: L,
}

impl<L: Label, F: Float> LinearModel<L, F> {
    pub fn decision_function(&self, features: ArrayView1<F>) -> F {
        self.weights.dot(&features) + self.intercept
    }

    pub fn predict(&self, features: ArrayView1<F>) -> L {
        if self.decision_function(features) > F::zero() {
            self.positive.clone()
        } else {
            self.negative.clone()
        }
    }

    /// `(negative, positive)` labels.
    pub fn classes(&self) -> (&L, &L) {
        (&self.negative, &self.positive)
    }
}

/// Training data reshaped for a binary linear model: the feature matrix, the
/// targets as `0`/`1` and the two labels.
pub(crate) struct BinaryProblem<L, F> {
    pub records: Array2<F>,
    pub targets: Array1<F>,
    pub negative: L,
    pub positive: L,
}

impl<L: Label, F: Float> BinaryProblem<L, F> {
    pub fn from_points(data: &[DataPoint<L, F>]) -> Result<Self, LinearError> {
        if data.is_empty() {
            return Err(LinearError::EmptyDataSet);
        }
        let records = stack_features(data).ok_or(LinearError::MismatchedDimensions)?;
        let classes = sorted_classes(data.iter().map(|dp| &dp.label));
        let [negative, positive]: [L; 2] = classes
            .try_into()
            .map_err(|c: Vec<L>| LinearError::NotBinary(c.len()))?;
        let targets = data
            .iter()
            .map(|dp| {
                if dp.label == positive {
                    F::one()
                } else {
                    F::zero()
                }
            })
            .collect();
        Ok(Self {
            records,
            targets,
            negative,
            positive,
        })
    }

    pub fn into_model(self, weights: Array1<F>, intercept: F) -> LinearModel<L, F> {
        LinearModel {
            weights,
            intercept,
            negative: self.negative,
            positive: self.positive,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_binary_problem_maps_larger_label_to_one() {
        let problem = BinaryProblem::from_points(&fixtures::separable()).unwrap();
        assert_eq!(problem.negative, 0);
        assert_eq!(problem.positive, 1);
        assert_eq!(problem.targets.sum(), 4.0);
        assert_eq!(problem.records.dim(), (8, 2));
    }

    #[test]
    fn test_binary_problem_rejects_other_class_counts() {
        let result = BinaryProblem::from_points(&fixtures::single_class());
        assert_eq!(result.err(), Some(LinearError::NotBinary(1)));

        let three = vec![
            DataPoint::new(array![0.0], 'a'),
            DataPoint::new(array![1.0], 'b'),
            DataPoint::new(array![2.0], 'c'),
        ];
        let result = BinaryProblem::<char, f64>::from_points(&three);
        assert_eq!(result.err(), Some(LinearError::NotBinary(3)));
    }
}
