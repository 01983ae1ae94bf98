//! Tree ensembles: bagged random forests, extremely randomised trees and
//! SAMME AdaBoost over decision stumps.

use classweep_helpers::{DataPoint, Float, Label, sorted_classes};
use decision_tree::{DecisionTree, MaxFeatures, SplitStrategy, TreeError, TreeParams};
use ndarray::ArrayView1;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnsembleError {
    #[error("training data is empty")]
    EmptyDataSet,
    #[error("an ensemble needs at least one estimator")]
    NoEstimators,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Settings for a forest of independently grown trees.
#[derive(Debug, Clone, PartialEq)]
pub struct ForestParams {
    pub n_estimators: usize,
    /// Train every tree on a bootstrap resample of the data.
    pub bootstrap: bool,
    pub tree: TreeParams,
    pub seed: u64,
}

impl ForestParams {
    /// Random forest: 100 best-split trees on bootstrap samples, √features per split.
    pub fn random_forest(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            bootstrap: true,
            tree: TreeParams::default().max_features(MaxFeatures::Sqrt),
            seed,
        }
    }

    /// Extra trees: 100 random-threshold trees on the full data, √features per split.
    pub fn extra_trees(seed: u64) -> Self {
        Self {
            n_estimators: 100,
            bootstrap: false,
            tree: TreeParams::default()
                .split(SplitStrategy::Random)
                .max_features(MaxFeatures::Sqrt),
            seed,
        }
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = n;
        self
    }
}

/// A fitted forest. Predictions are the majority vote of the trees.
#[derive(Debug, Clone)]
pub struct Forest<L: Label, F: Float> {
    trees: Vec<DecisionTree<L, F>>,
    classes: Vec<L>,
}

impl<L: Label, F: Float> Forest<L, F> {
    pub fn fit(data: &[DataPoint<L, F>], params: &ForestParams) -> Result<Self, EnsembleError> {
        if data.is_empty() {
            return Err(EnsembleError::EmptyDataSet);
        }
        if params.n_estimators == 0 {
            return Err(EnsembleError::NoEstimators);
        }

        let classes = sorted_classes(data.iter().map(|dp| &dp.label));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        let unit_weights = vec![F::one(); data.len()];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            let tree_params = params.tree.clone().seed(rng.random());
            let tree = if params.bootstrap {
                // Drawing n rows with replacement equals weighting each row by
                // how often it was drawn.
                let mut counts = vec![F::zero(); data.len()];
                for _ in 0..data.len() {
                    counts[rng.random_range(0..data.len())] += F::one();
                }
                let (sample, weights): (Vec<_>, Vec<_>) = data
                    .iter()
                    .zip(counts)
                    .filter(|(_, w)| *w > F::zero())
                    .map(|(dp, w)| (dp.clone(), w))
                    .unzip();
                DecisionTree::fit_weighted(&sample, &weights, &tree_params)?
            } else {
                DecisionTree::fit_weighted(data, &unit_weights, &tree_params)?
            };
            trees.push(tree);
        }

        Ok(Self { trees, classes })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Majority vote; the smallest label wins ties.
    pub fn predict(&self, features: ArrayView1<F>) -> L {
        let mut votes = vec![0usize; self.classes.len()];
        for tree in &self.trees {
            if let Ok(c) = self.classes.binary_search(&tree.predict(features)) {
                votes[c] += 1;
            }
        }
        let mut best = 0;
        for (c, v) in votes.iter().enumerate() {
            if *v > votes[best] {
                best = c;
            }
        }
        self.classes[best].clone()
    }
}

/// SAMME AdaBoost settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaBoostParams<F: Float> {
    pub n_estimators: usize,
    pub learning_rate: F,
    pub base: TreeParams,
}

impl<F: Float> Default for AdaBoostParams<F> {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: F::one(),
            base: TreeParams::stump(),
        }
    }
}

/// A fitted AdaBoost ensemble of weighted weak learners.
#[derive(Debug, Clone)]
pub struct AdaBoost<L: Label, F: Float> {
    learners: Vec<(F, DecisionTree<L, F>)>,
    classes: Vec<L>,
}

impl<L: Label, F: Float> AdaBoost<L, F> {
    pub fn fit(data: &[DataPoint<L, F>], params: &AdaBoostParams<F>) -> Result<Self, EnsembleError> {
        if data.is_empty() {
            return Err(EnsembleError::EmptyDataSet);
        }
        if params.n_estimators == 0 {
            return Err(EnsembleError::NoEstimators);
        }

        let classes = sorted_classes(data.iter().map(|dp| &dp.label));
        let n_classes = F::from_count(classes.len());
        let mut weights = vec![F::one() / F::from_count(data.len()); data.len()];
        let mut learners = Vec::with_capacity(params.n_estimators);

        for round in 0..params.n_estimators {
            let learner = DecisionTree::fit_weighted(data, &weights, &params.base)?;
            let missed: Vec<bool> = data
                .iter()
                .map(|dp| learner.predict(dp.view()) != dp.label)
                .collect();
            let total: F = weights.iter().copied().sum();
            let error = weights
                .iter()
                .zip(&missed)
                .filter(|(_, m)| **m)
                .map(|(w, _)| *w)
                .sum::<F>()
                / total;

            if error <= F::zero() {
                // A perfect learner decides alone.
                debug!(round, "adaboost found a perfect learner");
                learners.push((F::one(), learner));
                break;
            }
            // SAMME needs better than random guessing over the classes.
            if error >= F::one() - F::one() / n_classes {
                debug!(round, error = ?error, "adaboost learner no better than chance");
                if learners.is_empty() {
                    learners.push((F::one(), learner));
                }
                break;
            }

            let alpha =
                params.learning_rate * (((F::one() - error) / error).ln() + (n_classes - F::one()).ln());
            for (w, m) in weights.iter_mut().zip(&missed) {
                if *m {
                    *w *= alpha.exp();
                }
            }
            let total: F = weights.iter().copied().sum();
            for w in weights.iter_mut() {
                *w /= total;
            }
            learners.push((alpha, learner));
        }

        Ok(Self { learners, classes })
    }

    pub fn n_learners(&self) -> usize {
        self.learners.len()
    }

    /// The class with the largest total learner weight; smallest label on ties.
    pub fn predict(&self, features: ArrayView1<F>) -> L {
        let mut scores = vec![F::zero(); self.classes.len()];
        for (alpha, learner) in &self.learners {
            let label = learner.predict(features);
            if let Ok(c) = self.classes.binary_search(&label) {
                scores[c] += *alpha;
            }
        }
        let mut best = 0;
        for (c, s) in scores.iter().enumerate() {
            if *s > scores[best] {
                best = c;
            }
        }
        self.classes[best].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn students() -> Vec<DataPoint<u8, f64>> {
        let rows = [
            (1.0, 5.0, 0),
            (2.0, 10.0, 0),
            (3.0, 8.0, 0),
            (4.0, 12.0, 0),
            (5.0, 14.0, 1),
            (6.0, 15.0, 1),
            (8.0, 18.0, 1),
            (9.0, 20.0, 1),
            (10.0, 22.0, 1),
        ];
        rows.iter()
            .map(|&(h, a, p)| DataPoint::new(array![h, a], p))
            .collect()
    }

    #[test]
    fn test_random_forest_separates_groups() {
        let forest = Forest::fit(&students(), &ForestParams::random_forest(42)).unwrap();
        assert_eq!(forest.n_trees(), 100);
        assert_eq!(forest.predict(array![1.5, 6.0].view()), 0);
        assert_eq!(forest.predict(array![9.5, 21.0].view()), 1);
    }

    #[test]
    fn test_extra_trees_fit_training_data() {
        let data = students();
        let forest = Forest::fit(&data, &ForestParams::extra_trees(7).n_estimators(25)).unwrap();
        for dp in &data {
            assert_eq!(forest.predict(dp.view()), dp.label);
        }
    }

    #[test]
    fn test_adaboost_stops_at_perfect_stump() {
        let model = AdaBoost::fit(&students(), &AdaBoostParams::default()).unwrap();
        assert_eq!(model.n_learners(), 1);
        assert_eq!(model.predict(array![2.0, 9.0].view()), 0);
        assert_eq!(model.predict(array![8.5, 19.0].view()), 1);
    }

    #[test]
    fn test_adaboost_combines_stumps() {
        // No single threshold separates the 'b' band in the middle.
        let data: Vec<DataPoint<char, f64>> = [
            (0.0, 'a'),
            (1.0, 'a'),
            (2.0, 'b'),
            (3.0, 'b'),
            (4.0, 'a'),
            (5.0, 'a'),
        ]
        .iter()
        .map(|&(x, l)| DataPoint::new(array![x], l))
        .collect();
        let model = AdaBoost::fit(&data, &AdaBoostParams::default()).unwrap();
        assert!(model.n_learners() > 1);
        let correct = data
            .iter()
            .filter(|dp| model.predict(dp.view()) == dp.label)
            .count();
        assert!(correct >= 5);
    }

    #[test]
    fn test_single_class_ensembles() {
        let data: Vec<_> = students().into_iter().filter(|dp| dp.label == 1).collect();
        let forest = Forest::fit(&data, &ForestParams::random_forest(1).n_estimators(5)).unwrap();
        assert_eq!(forest.predict(array![0.0, 0.0].view()), 1);
        let boost = AdaBoost::fit(&data, &AdaBoostParams::default()).unwrap();
        assert_eq!(boost.predict(array![0.0, 0.0].view()), 1);
    }

    #[test]
    fn test_forest_tied_vote_takes_smallest_label() {
        let only = |label: u8| -> DecisionTree<u8, f64> {
            let data: Vec<_> = students()
                .into_iter()
                .map(|dp| DataPoint::new(dp.features, label))
                .collect();
            DecisionTree::fit(&data, &TreeParams::default()).unwrap()
        };
        let forest = Forest {
            trees: vec![only(1), only(0), only(1), only(0)],
            classes: vec![0, 1],
        };
        assert_eq!(forest.predict(array![9.5, 21.0].view()), 0);

        let forest = Forest {
            trees: vec![only(1), only(0), only(1)],
            classes: vec![0, 1],
        };
        assert_eq!(forest.predict(array![1.5, 6.0].view()), 1);
    }

    #[test]
    fn test_errors() {
        let empty: Vec<DataPoint<u8, f64>> = vec![];
        assert_eq!(
            Forest::fit(&empty, &ForestParams::random_forest(0)).unwrap_err(),
            EnsembleError::EmptyDataSet
        );
        assert_eq!(
            Forest::fit(&students(), &ForestParams::random_forest(0).n_estimators(0)).unwrap_err(),
            EnsembleError::NoEstimators
        );
    }
}
