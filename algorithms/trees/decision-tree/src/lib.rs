//! CART decision trees for classification.
//!
//! Splits minimise the weighted Gini impurity of the two children. With
//! [`SplitStrategy::Random`] each candidate feature gets one threshold drawn
//! uniformly between its minimum and maximum in the node (extremely randomised
//! trees). Samples with `x[feature] <= threshold` go left.

use classweep_helpers::{DataPoint, Float, Label, sorted_classes};
use ndarray::ArrayView1;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("training data is empty")]
    EmptyDataSet,
    #[error("data points have different numbers of features")]
    MismatchedDimensions,
    #[error("expected {expected} sample weights, got {found}")]
    WeightCount { expected: usize, found: usize },
    #[error("sample weights must be finite and non-negative")]
    InvalidWeights,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Exhaustive search over midpoints between consecutive distinct values.
    Best,
    /// One uniformly drawn threshold per candidate feature.
    Random,
}

/// How many features are considered at each split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    All,
    Sqrt,
    Count(usize),
}

impl MaxFeatures {
    fn resolve(self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::All => n_features,
            MaxFeatures::Sqrt => (n_features as f64).sqrt().floor() as usize,
            MaxFeatures::Count(n) => n,
        };
        n.clamp(1, n_features.max(1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeParams {
    /// `None` grows until leaves are pure.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub split: SplitStrategy,
    pub max_features: MaxFeatures,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            split: SplitStrategy::Best,
            max_features: MaxFeatures::All,
            seed: 0,
        }
    }
}

impl TreeParams {
    /// A depth-one tree, the weak learner of boosting.
    pub fn stump() -> Self {
        Self {
            max_depth: Some(1),
            ..Self::default()
        }
    }

    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn split(mut self, split: SplitStrategy) -> Self {
        self.split = split;
        self
    }

    pub fn max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node<L, F> {
    Leaf {
        label: L,
    },
    Split {
        feature: usize,
        threshold: F,
        left: Box<Node<L, F>>,
        right: Box<Node<L, F>>,
    },
}

/// A fitted classification tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<L: Label, F: Float> {
    root: Node<L, F>,
    classes: Vec<L>,
}

struct Candidate<F> {
    feature: usize,
    threshold: F,
    impurity: F,
}

struct Builder<'a, L: Label, F: Float, R: Rng> {
    data: &'a [DataPoint<L, F>],
    weights: &'a [F],
    classes: &'a [L],
    params: &'a TreeParams,
    n_features: usize,
    rng: &'a mut R,
}

impl<L: Label, F: Float> DecisionTree<L, F> {
    /// Fits a tree with unit sample weights.
    pub fn fit(data: &[DataPoint<L, F>], params: &TreeParams) -> Result<Self, TreeError> {
        let weights = vec![F::one(); data.len()];
        Self::fit_weighted(data, &weights, params)
    }

    /// Fits a tree where sample `i` counts `weights[i]` times in the impurity.
    pub fn fit_weighted(
        data: &[DataPoint<L, F>],
        weights: &[F],
        params: &TreeParams,
    ) -> Result<Self, TreeError> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(params.seed);
        Self::fit_with_rng(data, weights, params, &mut rng)
    }

    pub fn fit_with_rng<R: Rng>(
        data: &[DataPoint<L, F>],
        weights: &[F],
        params: &TreeParams,
        rng: &mut R,
    ) -> Result<Self, TreeError> {
        let first = data.first().ok_or(TreeError::EmptyDataSet)?;
        let n_features = first.n_features();
        if data.iter().any(|dp| dp.n_features() != n_features) {
            return Err(TreeError::MismatchedDimensions);
        }
        if weights.len() != data.len() {
            return Err(TreeError::WeightCount {
                expected: data.len(),
                found: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w < F::zero()) {
            return Err(TreeError::InvalidWeights);
        }
        if params.min_samples_split < 2 {
            return Err(TreeError::InvalidConfig(
                "min_samples_split must be at least 2".into(),
            ));
        }

        let classes = sorted_classes(data.iter().map(|dp| &dp.label));
        let mut builder = Builder {
            data,
            weights,
            classes: &classes,
            params,
            n_features,
            rng,
        };
        let root = builder.grow((0..data.len()).collect(), 0);
        Ok(Self { root, classes })
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    pub fn predict(&self, features: ArrayView1<F>) -> L {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf { label } => return label.clone(),
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if features[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Length of the longest root-to-leaf path; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        fn walk<L, F>(node: &Node<L, F>) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
            }
        }
        walk(&self.root)
    }

    pub fn n_leaves(&self) -> usize {
        fn walk<L, F>(node: &Node<L, F>) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Split { left, right, .. } => walk(left) + walk(right),
            }
        }
        walk(&self.root)
    }
}

impl<L: Label, F: Float, R: Rng> Builder<'_, L, F, R> {
    fn grow(&mut self, indices: Vec<usize>, depth: usize) -> Node<L, F> {
        let class_weights = self.class_weights(&indices);
        let label = self.leaf_label(&indices, &class_weights);

        let pure = class_weights.iter().filter(|w| **w > F::zero()).count() <= 1;
        let too_deep = self.params.max_depth.is_some_and(|max| depth >= max);
        if pure || too_deep || indices.len() < self.params.min_samples_split {
            return Node::Leaf { label };
        }

        let Some(best) = self.find_split(&indices) else {
            return Node::Leaf { label };
        };

        let (left, right): (Vec<usize>, Vec<usize>) = indices
            .into_iter()
            .partition(|&i| self.data[i].features[best.feature] <= best.threshold);

        Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left: Box::new(self.grow(left, depth + 1)),
            right: Box::new(self.grow(right, depth + 1)),
        }
    }

    fn class_index(&self, label: &L) -> usize {
        // Every label in the data is in `classes`.
        self.classes.binary_search(label).unwrap_or(0)
    }

    fn class_weights(&self, indices: &[usize]) -> Vec<F> {
        let mut totals = vec![F::zero(); self.classes.len()];
        for &i in indices {
            totals[self.class_index(&self.data[i].label)] += self.weights[i];
        }
        totals
    }

    /// Heaviest class; by sample count if the node carries no weight. The
    /// smallest label wins ties.
    fn leaf_label(&self, indices: &[usize], class_weights: &[F]) -> L {
        let totals = if class_weights.iter().any(|w| *w > F::zero()) {
            class_weights.to_vec()
        } else {
            let mut counts = vec![F::zero(); self.classes.len()];
            for &i in indices {
                counts[self.class_index(&self.data[i].label)] += F::one();
            }
            counts
        };
        let mut best = 0;
        for (c, w) in totals.iter().enumerate() {
            if *w > totals[best] {
                best = c;
            }
        }
        self.classes[best].clone()
    }

    fn gini(&self, class_weights: &[F]) -> F {
        let total: F = class_weights.iter().copied().sum();
        if total <= F::zero() {
            return F::zero();
        }
        F::one()
            - class_weights
                .iter()
                .map(|w| {
                    let p = *w / total;
                    p * p
                })
                .sum::<F>()
    }

    fn find_split(&mut self, indices: &[usize]) -> Option<Candidate<F>> {
        let n_candidates = self.params.max_features.resolve(self.n_features);
        let mut features: Vec<usize> = (0..self.n_features).collect();
        features.shuffle(&mut *self.rng);
        let (sampled, rest) = features.split_at_mut(n_candidates);
        sampled.sort_unstable();
        rest.sort_unstable();

        let best = self.best_among(indices, sampled);
        if best.is_some() {
            return best;
        }
        // None of the sampled features can split this node; keep looking.
        self.best_among(indices, rest)
    }

    fn best_among(&mut self, indices: &[usize], features: &[usize]) -> Option<Candidate<F>> {
        let mut best: Option<Candidate<F>> = None;
        for &feature in features {
            let candidate = match self.params.split {
                SplitStrategy::Best => self.best_threshold(indices, feature),
                SplitStrategy::Random => self.random_threshold(indices, feature),
            };
            if let Some(c) = candidate {
                if best.as_ref().is_none_or(|b| c.impurity < b.impurity) {
                    best = Some(c);
                }
            }
        }
        best
    }

    fn best_threshold(&self, indices: &[usize], feature: usize) -> Option<Candidate<F>> {
        let mut order = indices.to_vec();
        order.sort_by(|&a, &b| {
            self.data[a].features[feature]
                .partial_cmp(&self.data[b].features[feature])
                .unwrap_or(Ordering::Equal)
        });

        let total = self.class_weights(&order);
        let mut left = vec![F::zero(); self.classes.len()];
        let mut best: Option<Candidate<F>> = None;

        for pair in 0..order.len() - 1 {
            let i = order[pair];
            let c = self.class_index(&self.data[i].label);
            left[c] += self.weights[i];

            let here = self.data[i].features[feature];
            let next = self.data[order[pair + 1]].features[feature];
            if !(here < next) {
                continue;
            }

            let right: Vec<F> = total.iter().zip(&left).map(|(t, l)| *t - *l).collect();
            let w_left: F = left.iter().copied().sum();
            let w_right: F = right.iter().copied().sum();
            let impurity = w_left * self.gini(&left) + w_right * self.gini(&right);

            if best.as_ref().is_none_or(|b| impurity < b.impurity) {
                let two = F::one() + F::one();
                let mid = (here + next) / two;
                let threshold = if mid < next { mid } else { here };
                best = Some(Candidate {
                    feature,
                    threshold,
                    impurity,
                });
            }
        }
        best
    }

    fn random_threshold(&mut self, indices: &[usize], feature: usize) -> Option<Candidate<F>> {
        let values = indices.iter().map(|&i| self.data[i].features[feature]);
        let (lo, hi) = values.fold((F::infinity(), F::neg_infinity()), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        if !(lo < hi) {
            return None;
        }
        let threshold = self.rng.random_range(lo..hi);

        let mut left = vec![F::zero(); self.classes.len()];
        let mut right = vec![F::zero(); self.classes.len()];
        for &i in indices {
            let c = self.class_index(&self.data[i].label);
            if self.data[i].features[feature] <= threshold {
                left[c] += self.weights[i];
            } else {
                right[c] += self.weights[i];
            }
        }
        let w_left: F = left.iter().copied().sum();
        let w_right: F = right.iter().copied().sum();
        Some(Candidate {
            feature,
            threshold,
            impurity: w_left * self.gini(&left) + w_right * self.gini(&right),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn students() -> Vec<DataPoint<u8, f64>> {
        let hours = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 9.0];
        let attended = [5.0, 10.0, 8.0, 12.0, 14.0, 15.0, 18.0, 20.0];
        let passed = [0, 0, 0, 0, 1, 1, 1, 1];
        hours
            .iter()
            .zip(&attended)
            .zip(&passed)
            .map(|((&h, &a), &p)| DataPoint::new(array![h, a], p))
            .collect()
    }

    #[test]
    fn test_best_split_is_a_single_stump() {
        let tree = DecisionTree::fit(&students(), &TreeParams::default()).unwrap();
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.n_leaves(), 2);
        for dp in students() {
            assert_eq!(tree.predict(dp.view()), dp.label);
        }
        assert_eq!(tree.predict(array![4.4, 13.0].view()), 0);
        assert_eq!(tree.predict(array![4.6, 13.0].view()), 1);
    }

    #[test]
    fn test_xor_needs_depth_two() {
        let data = vec![
            DataPoint::new(array![0.0, 0.0], 'a'),
            DataPoint::new(array![1.0, 1.0], 'a'),
            DataPoint::new(array![0.0, 1.0], 'b'),
            DataPoint::new(array![1.0, 0.0], 'b'),
        ];
        let tree = DecisionTree::fit(&data, &TreeParams::default()).unwrap();
        for dp in &data {
            assert_eq!(tree.predict(dp.view()), dp.label);
        }
        assert_eq!(tree.depth(), 2);

        let stump = DecisionTree::fit(&data, &TreeParams::stump()).unwrap();
        assert_eq!(stump.depth(), 1);
    }

    #[test]
    fn test_random_split_fits_training_data() {
        let params = TreeParams::default().split(SplitStrategy::Random).seed(3);
        let tree = DecisionTree::fit(&students(), &params).unwrap();
        for dp in students() {
            assert_eq!(tree.predict(dp.view()), dp.label);
        }
        let again = DecisionTree::fit(&students(), &params).unwrap();
        assert_eq!(tree, again);
    }

    #[test]
    fn test_weights_shift_the_leaf_label() {
        let data = vec![
            DataPoint::new(array![0.0], 'x'),
            DataPoint::new(array![0.0], 'y'),
            DataPoint::new(array![0.0], 'y'),
        ];
        let unweighted = DecisionTree::fit(&data, &TreeParams::default()).unwrap();
        assert_eq!(unweighted.predict(array![0.0].view()), 'y');

        let weighted =
            DecisionTree::fit_weighted(&data, &[5.0, 1.0, 1.0], &TreeParams::default()).unwrap();
        assert_eq!(weighted.predict(array![0.0].view()), 'x');
    }

    #[test]
    fn test_single_class_is_one_leaf() {
        let data: Vec<_> = students().into_iter().filter(|dp| dp.label == 1).collect();
        let tree = DecisionTree::fit(&data, &TreeParams::default()).unwrap();
        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(array![0.0, 0.0].view()), 1);
    }

    #[test]
    fn test_errors() {
        let empty: Vec<DataPoint<u8, f64>> = vec![];
        assert_eq!(
            DecisionTree::fit(&empty, &TreeParams::default()).unwrap_err(),
            TreeError::EmptyDataSet
        );
        let data = students();
        assert!(matches!(
            DecisionTree::fit_weighted(&data, &[1.0], &TreeParams::default()),
            Err(TreeError::WeightCount { .. })
        ));
        let mut weights = vec![1.0; data.len()];
        weights[0] = -1.0;
        assert_eq!(
            DecisionTree::fit_weighted(&data, &weights, &TreeParams::default()).unwrap_err(),
            TreeError::InvalidWeights
        );
    }

    #[test]
    fn test_max_features_resolution() {
        assert_eq!(MaxFeatures::All.resolve(4), 4);
        assert_eq!(MaxFeatures::Sqrt.resolve(2), 1);
        assert_eq!(MaxFeatures::Sqrt.resolve(9), 3);
        assert_eq!(MaxFeatures::Count(10).resolve(3), 3);
    }
}
