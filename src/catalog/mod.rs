//! The statically declared list of classifiers a sweep runs.

mod adapters;

use crate::dataset::Outcome;
use classweep_helpers::DataPoint;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

pub use adapters::{
    AdaBoostAdapter, DistanceMetric, DummyAdapter, ForestAdapter, GaussianNbAdapter,
    KMeansAdapter, KnnAdapter, LinearAdapter, LinearKind, LvqAdapter, TreeAdapter,
};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// The common interface of every catalog entry.
pub trait Classifier: Send + Sync {
    /// Identifier shown in the report.
    fn name(&self) -> String;

    /// Trains on `data`, replacing any previous fit.
    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError>;

    /// Predicts the class of a single point.
    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError>;
}

/// One entry of the catalog. The order of [`ModelKind::ALL`] is the catalog
/// order used to break ties in the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    KNeighbors,
    NearestCentroid,
    Lvq1,
    Lvq21,
    Lvq3,
    KMeans,
    GaussianNb,
    LogisticRegression,
    Perceptron,
    Ridge,
    DecisionTree,
    ExtraTree,
    RandomForest,
    ExtraTrees,
    AdaBoost,
    Dummy,
}

impl ModelKind {
    pub const ALL: [ModelKind; 16] = [
        ModelKind::KNeighbors,
        ModelKind::NearestCentroid,
        ModelKind::Lvq1,
        ModelKind::Lvq21,
        ModelKind::Lvq3,
        ModelKind::KMeans,
        ModelKind::GaussianNb,
        ModelKind::LogisticRegression,
        ModelKind::Perceptron,
        ModelKind::Ridge,
        ModelKind::DecisionTree,
        ModelKind::ExtraTree,
        ModelKind::RandomForest,
        ModelKind::ExtraTrees,
        ModelKind::AdaBoost,
        ModelKind::Dummy,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            ModelKind::KNeighbors => "KNeighborsClassifier",
            ModelKind::NearestCentroid => "NearestCentroid",
            ModelKind::Lvq1 => "LVQ1",
            ModelKind::Lvq21 => "LVQ2.1",
            ModelKind::Lvq3 => "LVQ3",
            ModelKind::KMeans => "KMeansClassifier",
            ModelKind::GaussianNb => "GaussianNB",
            ModelKind::LogisticRegression => "LogisticRegression",
            ModelKind::Perceptron => "Perceptron",
            ModelKind::Ridge => "RidgeClassifier",
            ModelKind::DecisionTree => "DecisionTreeClassifier",
            ModelKind::ExtraTree => "ExtraTreeClassifier",
            ModelKind::RandomForest => "RandomForestClassifier",
            ModelKind::ExtraTrees => "ExtraTreesClassifier",
            ModelKind::AdaBoost => "AdaBoostClassifier",
            ModelKind::Dummy => "DummyClassifier",
        }
    }

    fn position(self) -> usize {
        ModelKind::ALL
            .iter()
            .position(|&k| k == self)
            .unwrap_or_default()
    }

    /// Seed for this entry's randomness, derived from the sweep seed so that
    /// entries do not share a stream.
    pub fn seed_for(self, sweep_seed: u64) -> u64 {
        sweep_seed ^ (self.position() as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    /// A fresh, unfitted classifier for this entry.
    pub fn build(self, sweep_seed: u64) -> Box<dyn Classifier> {
        let seed = self.seed_for(sweep_seed);
        match self {
            ModelKind::KNeighbors => Box::new(KnnAdapter::new(5, DistanceMetric::L2)),
            ModelKind::NearestCentroid => Box::new(LvqAdapter::nearest_centroid()),
            ModelKind::Lvq1 => Box::new(LvqAdapter::lvq1(seed)),
            ModelKind::Lvq21 => Box::new(LvqAdapter::lvq21(seed)),
            ModelKind::Lvq3 => Box::new(LvqAdapter::lvq3(seed)),
            ModelKind::KMeans => Box::new(KMeansAdapter::new(2, seed)),
            ModelKind::GaussianNb => Box::new(GaussianNbAdapter::new()),
            ModelKind::LogisticRegression => Box::new(LinearAdapter::new(LinearKind::Logistic)),
            ModelKind::Perceptron => Box::new(LinearAdapter::new(LinearKind::Perceptron { seed })),
            ModelKind::Ridge => Box::new(LinearAdapter::new(LinearKind::Ridge)),
            ModelKind::DecisionTree => Box::new(TreeAdapter::decision_tree()),
            ModelKind::ExtraTree => Box::new(TreeAdapter::extra_tree(seed)),
            ModelKind::RandomForest => Box::new(ForestAdapter::random_forest(seed)),
            ModelKind::ExtraTrees => Box::new(ForestAdapter::extra_trees(seed)),
            ModelKind::AdaBoost => Box::new(AdaBoostAdapter::new()),
            ModelKind::Dummy => Box::new(DummyAdapter::most_frequent()),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
