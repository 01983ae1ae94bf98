//! Adapters that put each algorithm crate behind [`Classifier`].
//!
//! Every adapter starts unfitted and answers `predict` with an error until
//! `fit` succeeds. A failed `fit` leaves the adapter unfitted.

use super::{BoxError, Classifier};
use crate::dataset::Outcome;
use classweep_helpers::{DataPoint, Distance, L1Dist, L2Dist, LInfDist, majority_label};
use decision_tree::{DecisionTree, TreeParams};
use dummy::DummyClassifier;
use forest::{AdaBoost, AdaBoostParams, Forest, ForestParams};
use k_means::KMeans;
use k_nn::{KnnClassifier, KnnError};
use linear_models::{LinearModel, LogisticRegression, Perceptron, RidgeClassifier};
use lvq::{Lvq, LvqParams, LvqVariant, PrototypeInit};
use naive_bayes::GaussianNb;
use ndarray::ArrayView1;
use std::fmt;
use tracing::debug;

fn not_initialized() -> BoxError {
    "Classifier not initialized".into()
}

// --- k-NN ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    L1,
    L2,
    LInf,
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::L1 => f.write_str("L1"),
            DistanceMetric::L2 => f.write_str("L2"),
            DistanceMetric::LInf => f.write_str("L-Infinity"),
        }
    }
}

// Erases the distance type of a fitted k-NN classifier.
trait KnnPredictor: Send + Sync {
    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, KnnError>;
}

impl<D: 'static + Distance<f64> + Send + Sync> KnnPredictor for KnnClassifier<Outcome, f64, D> {
    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, KnnError> {
        self.predict(features)
    }
}

pub struct KnnAdapter {
    classifier: Option<Box<dyn KnnPredictor>>,
    k: usize,
    distance_metric: DistanceMetric,
}

impl KnnAdapter {
    pub fn new(k: usize, distance_metric: DistanceMetric) -> Self {
        Self {
            classifier: None,
            k,
            distance_metric,
        }
    }
}

impl Classifier for KnnAdapter {
    fn name(&self) -> String {
        "KNeighborsClassifier".to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.classifier = None;
        if data.is_empty() {
            return Err(KnnError::EmptyTrainingSet.into());
        }
        let k = self.k;
        let owned_data = data.to_vec();
        debug!(k, metric = %self.distance_metric, "fitting k-NN");

        let classifier: Box<dyn KnnPredictor> = match self.distance_metric {
            DistanceMetric::L1 => Box::new(KnnClassifier::new(k, owned_data, L1Dist)?),
            DistanceMetric::L2 => Box::new(KnnClassifier::new(k, owned_data, L2Dist)?),
            DistanceMetric::LInf => Box::new(KnnClassifier::new(k, owned_data, LInfDist)?),
        };
        self.classifier = Some(classifier);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        self.classifier
            .as_ref()
            .ok_or_else(not_initialized)?
            .predict(features)
            .map_err(|e| e.into())
    }
}

// --- LVQ family ---

/// Nearest-prototype classifiers trained with LVQ.
///
/// `NearestCentroid` is the degenerate member: class-mean prototypes and no
/// training epochs.
pub struct LvqAdapter {
    name: &'static str,
    params: LvqParams<f64>,
    min_classes: usize,
    model: Option<Lvq<Outcome, f64, L2Dist>>,
}

impl LvqAdapter {
    fn with_params(name: &'static str, params: LvqParams<f64>) -> Self {
        Self {
            name,
            params,
            min_classes: 1,
            model: None,
        }
    }

    pub fn nearest_centroid() -> Self {
        let params = LvqParams::new(LvqVariant::Lvq1)
            .init(PrototypeInit::ClassMean)
            .epochs(0)
            .seed(0);
        Self {
            min_classes: 2,
            ..Self::with_params("NearestCentroid", params)
        }
    }

    pub fn lvq1(seed: u64) -> Self {
        Self::with_params("LVQ1", LvqParams::new(LvqVariant::Lvq1).seed(seed))
    }

    pub fn lvq21(seed: u64) -> Self {
        let params = LvqParams::new(LvqVariant::Lvq21 { window: 0.3 })
            .init(PrototypeInit::ClassMean)
            .seed(seed);
        Self::with_params("LVQ2.1", params)
    }

    pub fn lvq3(seed: u64) -> Self {
        let params = LvqParams::new(LvqVariant::Lvq3 {
            window: 0.3,
            epsilon: 0.5,
        })
        .init(PrototypeInit::ClassMean)
        .seed(seed);
        Self::with_params("LVQ3", params)
    }
}

impl Classifier for LvqAdapter {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        let n_classes = classweep_helpers::sorted_classes(data.iter().map(|dp| &dp.label)).len();
        if n_classes < self.min_classes {
            return Err(format!(
                "{} needs at least {} classes, got {}",
                self.name, self.min_classes, n_classes
            )
            .into());
        }
        self.model = Some(lvq::fit(data, &self.params, L2Dist)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        self.model
            .as_ref()
            .ok_or_else(not_initialized)?
            .predict(features)
            .map_err(|e| e.into())
    }
}

// --- k-means ---

/// Clusters the training data and labels every cluster with its majority
/// class. Empty clusters take the overall majority.
pub struct KMeansAdapter {
    model: Option<KMeans<f64, L2Dist>>,
    k: usize,
    max_iter: u32,
    tolerance: f64,
    seed: u64,
    cluster_labels: Vec<Outcome>,
}

impl KMeansAdapter {
    pub fn new(k: usize, seed: u64) -> Self {
        Self {
            model: None,
            k,
            max_iter: 100,
            tolerance: 1e-4,
            seed,
            cluster_labels: Vec::new(),
        }
    }
}

impl Classifier for KMeansAdapter {
    fn name(&self) -> String {
        "KMeansClassifier".to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.cluster_labels.clear();

        let mut model =
            KMeans::new(self.k, self.max_iter, self.tolerance, L2Dist).with_seed(self.seed);
        let (assignments, _) = model.fit(data)?;
        let overall = majority_label(data.iter().map(|dp| &dp.label)).ok_or_else(not_initialized)?;

        let cluster_labels = (0..self.k)
            .map(|cluster| {
                let members = assignments
                    .iter()
                    .zip(data)
                    .filter(|(a, _)| **a == cluster)
                    .map(|(_, dp)| &dp.label);
                majority_label(members).unwrap_or(overall)
            })
            .collect::<Vec<_>>();
        debug!(?cluster_labels, "k-means clusters labelled");

        self.cluster_labels = cluster_labels;
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        let cluster = model.predict(features)?;
        self.cluster_labels
            .get(cluster)
            .copied()
            .ok_or_else(|| format!("cluster {cluster} has no label").into())
    }
}

// --- Gaussian naive Bayes ---

pub struct GaussianNbAdapter {
    model: Option<GaussianNb<Outcome, f64>>,
}

impl GaussianNbAdapter {
    pub fn new() -> Self {
        Self { model: None }
    }
}

impl Default for GaussianNbAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for GaussianNbAdapter {
    fn name(&self) -> String {
        "GaussianNB".to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.model = Some(GaussianNb::fit(data)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

// --- Linear models ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinearKind {
    Logistic,
    Perceptron { seed: u64 },
    Ridge,
}

pub struct LinearAdapter {
    kind: LinearKind,
    model: Option<LinearModel<Outcome, f64>>,
}

impl LinearAdapter {
    pub fn new(kind: LinearKind) -> Self {
        Self { kind, model: None }
    }
}

impl Classifier for LinearAdapter {
    fn name(&self) -> String {
        match self.kind {
            LinearKind::Logistic => "LogisticRegression",
            LinearKind::Perceptron { .. } => "Perceptron",
            LinearKind::Ridge => "RidgeClassifier",
        }
        .to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        let model = match self.kind {
            LinearKind::Logistic => LogisticRegression::default().fit(data)?,
            LinearKind::Perceptron { seed } => Perceptron::new(seed).fit(data)?,
            LinearKind::Ridge => RidgeClassifier::default().fit(data)?,
        };
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

// --- Trees and ensembles ---

pub struct TreeAdapter {
    name: &'static str,
    params: TreeParams,
    model: Option<DecisionTree<Outcome, f64>>,
}

impl TreeAdapter {
    pub fn decision_tree() -> Self {
        Self {
            name: "DecisionTreeClassifier",
            params: TreeParams::default(),
            model: None,
        }
    }

    /// A single extremely randomised tree.
    pub fn extra_tree(seed: u64) -> Self {
        Self {
            name: "ExtraTreeClassifier",
            params: TreeParams::default()
                .split(decision_tree::SplitStrategy::Random)
                .seed(seed),
            model: None,
        }
    }
}

impl Classifier for TreeAdapter {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.model = Some(DecisionTree::fit(data, &self.params)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

pub struct ForestAdapter {
    name: &'static str,
    params: ForestParams,
    model: Option<Forest<Outcome, f64>>,
}

impl ForestAdapter {
    pub fn random_forest(seed: u64) -> Self {
        Self {
            name: "RandomForestClassifier",
            params: ForestParams::random_forest(seed),
            model: None,
        }
    }

    pub fn extra_trees(seed: u64) -> Self {
        Self {
            name: "ExtraTreesClassifier",
            params: ForestParams::extra_trees(seed),
            model: None,
        }
    }
}

impl Classifier for ForestAdapter {
    fn name(&self) -> String {
        self.name.to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.model = Some(Forest::fit(data, &self.params)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

pub struct AdaBoostAdapter {
    params: AdaBoostParams<f64>,
    model: Option<AdaBoost<Outcome, f64>>,
}

impl AdaBoostAdapter {
    pub fn new() -> Self {
        Self {
            params: AdaBoostParams::default(),
            model: None,
        }
    }
}

impl Default for AdaBoostAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for AdaBoostAdapter {
    fn name(&self) -> String {
        "AdaBoostClassifier".to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.model = Some(AdaBoost::fit(data, &self.params)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

// --- Baseline ---

pub struct DummyAdapter {
    model: Option<DummyClassifier<Outcome>>,
}

impl DummyAdapter {
    pub fn most_frequent() -> Self {
        Self { model: None }
    }
}

impl Classifier for DummyAdapter {
    fn name(&self) -> String {
        "DummyClassifier".to_string()
    }

    fn fit(&mut self, data: &[DataPoint<Outcome, f64>]) -> Result<(), BoxError> {
        self.model = None;
        self.model = Some(DummyClassifier::fit(data)?);
        Ok(())
    }

    fn predict(&self, features: ArrayView1<f64>) -> Result<Outcome, BoxError> {
        let model = self.model.as_ref().ok_or_else(not_initialized)?;
        Ok(model.predict(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_groups() -> Vec<DataPoint<Outcome, f64>> {
        let mut data = Vec::new();
        for x in [-2.0, -1.5, -1.0, -1.2] {
            data.push(DataPoint::new(array![x, x], Outcome::Failed));
        }
        for x in [1.0, 1.5, 2.0, 1.2, 1.8] {
            data.push(DataPoint::new(array![x, x], Outcome::Passed));
        }
        data
    }

    fn passed_only() -> Vec<DataPoint<Outcome, f64>> {
        two_groups()
            .into_iter()
            .filter(|dp| dp.label == Outcome::Passed)
            .collect()
    }

    fn adapters() -> Vec<Box<dyn Classifier>> {
        vec![
            Box::new(KnnAdapter::new(3, DistanceMetric::L1)),
            Box::new(KnnAdapter::new(3, DistanceMetric::LInf)),
            Box::new(LvqAdapter::nearest_centroid()),
            Box::new(LvqAdapter::lvq1(3)),
            Box::new(LvqAdapter::lvq21(3)),
            Box::new(LvqAdapter::lvq3(3)),
            Box::new(KMeansAdapter::new(2, 3)),
            Box::new(GaussianNbAdapter::new()),
            Box::new(LinearAdapter::new(LinearKind::Logistic)),
            Box::new(LinearAdapter::new(LinearKind::Perceptron { seed: 3 })),
            Box::new(LinearAdapter::new(LinearKind::Ridge)),
            Box::new(TreeAdapter::decision_tree()),
            Box::new(TreeAdapter::extra_tree(3)),
            Box::new(ForestAdapter::random_forest(3)),
            Box::new(ForestAdapter::extra_trees(3)),
            Box::new(AdaBoostAdapter::new()),
        ]
    }

    #[test]
    fn test_separated_groups() {
        let data = two_groups();
        for mut model in adapters() {
            model.fit(&data).unwrap();
            let name = model.name();
            assert_eq!(model.predict(array![-1.6, -1.6].view()).unwrap(), Outcome::Failed, "{name}");
            assert_eq!(model.predict(array![1.6, 1.6].view()).unwrap(), Outcome::Passed, "{name}");
        }
    }

    #[test]
    fn test_single_class_training() {
        let data = passed_only();
        let needs_two = ["NearestCentroid", "LogisticRegression", "Perceptron", "RidgeClassifier"];
        for mut model in adapters() {
            let name = model.name();
            let fitted = model.fit(&data);
            if needs_two.contains(&name.as_str()) {
                assert!(fitted.is_err(), "{name}");
                assert!(model.predict(array![0.0, 0.0].view()).is_err(), "{name}");
            } else {
                fitted.unwrap_or_else(|e| panic!("{name}: {e}"));
                assert_eq!(model.predict(array![0.0, 0.0].view()).unwrap(), Outcome::Passed, "{name}");
            }
        }
    }

    #[test]
    fn test_empty_training_fails() {
        for mut model in adapters() {
            assert!(model.fit(&[]).is_err(), "{}", model.name());
        }
        assert!(DummyAdapter::most_frequent().fit(&[]).is_err());
    }

    #[test]
    fn test_dummy_predicts_majority() {
        let mut model = DummyAdapter::most_frequent();
        model.fit(&two_groups()).unwrap();
        assert_eq!(model.predict(array![-5.0, -5.0].view()).unwrap(), Outcome::Passed);
    }

    #[test]
    fn test_distance_names() {
        assert_eq!(DistanceMetric::LInf.to_string(), "L-Infinity");
        assert_eq!(KnnAdapter::new(5, DistanceMetric::L2).name(), "KNeighborsClassifier");
    }
}
