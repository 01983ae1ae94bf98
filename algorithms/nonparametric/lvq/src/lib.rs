use classweep_helpers::{DataPoint, Distance, Float, Label, group_by_class};
use k_means::KMeans;
use ndarray::{Array1, ArrayView1};
use rand::prelude::SliceRandom;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, trace};

/// Errors that can occur during LVQ training.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LvqError {
    /// The training data is empty.
    #[error("training data is empty")]
    EmptyDataSet,
    /// Not enough data points to initialize the requested number of prototypes for a class.
    #[error("not enough data points to initialize the requested prototypes for class {0}")]
    NotEnoughDataForPrototypes(String),
    /// The prototype configuration references a class not present in the data.
    #[error("prototype configuration references class {0}, which has no data")]
    UnknownClassInConfig(String),
    /// Invalid configuration (e.g., requesting more than one prototype with ClassMean)
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Prediction was requested from a model without prototypes.
    #[error("codebook is empty")]
    EmptyCodebook,
}

/// Prototype initialization strategies for LVQ algorithms.
#[derive(Debug, Clone, PartialEq)]
pub enum PrototypeInit<F: Float> {
    /// Randomly sample data points from each class.
    Random,
    /// Use the mean of each class as the prototype (one prototype per class only).
    ClassMean,
    /// Use K-means clustering within each class to initialize prototypes.
    KMeans { max_iter: u32, tol: F },
}

/// The update rule applied during training.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LvqVariant<F: Float> {
    /// Move the best matching prototype towards (same class) or away from the sample.
    Lvq1,
    /// LVQ2.1: update the two nearest prototypes when they belong to different
    /// classes, one of them the sample's, and the sample lies inside the window.
    Lvq21 { window: F },
    /// LVQ2.1 plus a damped pull (`epsilon`) when both nearest prototypes
    /// share the sample's class.
    Lvq3 { window: F, epsilon: F },
}

/// Training parameters shared by all variants.
#[derive(Debug, Clone, PartialEq)]
pub struct LvqParams<F: Float> {
    pub variant: LvqVariant<F>,
    pub init: PrototypeInit<F>,
    /// The initial learning rate (alpha).
    pub learning_rate: F,
    /// Multiplicative decay of the learning rate after every epoch.
    pub decay: F,
    /// Passes over the training data. Zero keeps the initial prototypes.
    pub epochs: u32,
    /// Prototypes per class when the counts are not given explicitly.
    pub prototypes_per_class: usize,
    /// Seed for initialization and shuffling; random when `None`.
    pub seed: Option<u64>,
}

impl<F: Float> LvqParams<F> {
    /// Defaults: random initialization, alpha 0.3 decaying by 2% per epoch,
    /// 30 epochs, one prototype per class.
    pub fn new(variant: LvqVariant<F>) -> Self {
        Self {
            variant,
            init: PrototypeInit::Random,
            learning_rate: F::from_f64(0.3).unwrap_or_else(F::one),
            decay: F::from_f64(0.98).unwrap_or_else(F::one),
            epochs: 30,
            prototypes_per_class: 1,
            seed: None,
        }
    }

    pub fn init(mut self, init: PrototypeInit<F>) -> Self {
        self.init = init;
        self
    }

    pub fn learning_rate(mut self, learning_rate: F) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn decay(mut self, decay: F) -> Self {
        self.decay = decay;
        self
    }

    pub fn epochs(mut self, epochs: u32) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn prototypes_per_class(mut self, n: usize) -> Self {
        self.prototypes_per_class = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The trained LVQ model, containing the finalized codebook.
#[derive(Debug, Clone)]
pub struct Lvq<L, F, D>
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    /// The learned prototypes (codebook vectors).
    pub codebook: Vec<DataPoint<L, F>>,
    distance: D,
}

impl<L, F, D> Lvq<L, F, D>
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    /// Predicts the class label for a new data point.
    ///
    /// Finds the single closest prototype in the codebook and returns its label.
    pub fn predict(&self, features: ArrayView1<F>) -> Result<L, LvqError> {
        nearest_two(&self.codebook, &self.distance, features)
            .map(|(best, _)| self.codebook[best.0].label.clone())
            .ok_or(LvqError::EmptyCodebook)
    }
}

/// Initializes prototypes according to the chosen strategy.
///
/// Prototypes are emitted class by class in label order.
pub fn initialize_prototypes<L, F, D, R>(
    data: &[DataPoint<L, F>],
    n_prototypes_per_class: &BTreeMap<L, usize>,
    distance: &D,
    init: &PrototypeInit<F>,
    rng: &mut R,
) -> Result<Vec<DataPoint<L, F>>, LvqError>
where
    L: Label,
    F: Float,
    D: Distance<F> + Clone,
    R: Rng,
{
    if data.is_empty() {
        return Err(LvqError::EmptyDataSet);
    }

    let data_by_class = group_by_class(data);
    let mut codebook = Vec::new();

    for (label, &n_proto) in n_prototypes_per_class {
        let indices = data_by_class
            .get(label)
            .ok_or_else(|| LvqError::UnknownClassInConfig(format!("{label:?}")))?;

        if n_proto > indices.len() {
            return Err(LvqError::NotEnoughDataForPrototypes(format!("{label:?}")));
        }

        match init {
            PrototypeInit::Random => {
                for i in index::sample(rng, indices.len(), n_proto) {
                    codebook.push(data[indices[i]].clone());
                }
            }
            PrototypeInit::ClassMean => {
                if n_proto != 1 {
                    return Err(LvqError::InvalidConfig(
                        "ClassMean supports exactly one prototype per class".into(),
                    ));
                }
                codebook.push(DataPoint::new(class_mean(data, indices), label.clone()));
            }
            PrototypeInit::KMeans { .. } if n_proto == 1 => {
                codebook.push(DataPoint::new(class_mean(data, indices), label.clone()));
            }
            PrototypeInit::KMeans { max_iter, tol } => {
                let class_data: Vec<DataPoint<L, F>> =
                    indices.iter().map(|&i| data[i].clone()).collect();
                let mut kmeans =
                    KMeans::new(n_proto, *max_iter, *tol, distance.clone()).with_seed(rng.random());
                match kmeans.fit(&class_data) {
                    Ok((_, centroids)) => {
                        for row in centroids.rows() {
                            codebook.push(DataPoint::new(row.to_owned(), label.clone()));
                        }
                    }
                    Err(e) => {
                        debug!(class = ?label, error = %e, "k-means init failed, sampling prototypes instead");
                        for i in index::sample(rng, indices.len(), n_proto) {
                            codebook.push(data[indices[i]].clone());
                        }
                    }
                }
            }
        }
    }
    Ok(codebook)
}

/// Trains an LVQ model with `params.prototypes_per_class` prototypes for
/// every class present in `data`.
pub fn fit<L, F, D>(
    data: &[DataPoint<L, F>],
    params: &LvqParams<F>,
    distance: D,
) -> Result<Lvq<L, F, D>, LvqError>
where
    L: Label,
    F: Float,
    D: Distance<F> + Clone,
{
    let counts: BTreeMap<L, usize> = group_by_class(data)
        .into_keys()
        .map(|label| (label, params.prototypes_per_class))
        .collect();
    fit_with_counts(data, &counts, params, distance)
}

/// Trains an LVQ model with an explicit prototype count per class.
pub fn fit_with_counts<L, F, D>(
    data: &[DataPoint<L, F>],
    n_prototypes_per_class: &BTreeMap<L, usize>,
    params: &LvqParams<F>,
    distance: D,
) -> Result<Lvq<L, F, D>, LvqError>
where
    L: Label,
    F: Float,
    D: Distance<F> + Clone,
{
    let seed = params.seed.unwrap_or_else(rand::random);
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    fit_with_rng(data, n_prototypes_per_class, params, distance, &mut rng)
}

/// Trains an LVQ model drawing all randomness from `rng`.
pub fn fit_with_rng<L, F, D, R>(
    data: &[DataPoint<L, F>],
    n_prototypes_per_class: &BTreeMap<L, usize>,
    params: &LvqParams<F>,
    distance: D,
    rng: &mut R,
) -> Result<Lvq<L, F, D>, LvqError>
where
    L: Label,
    F: Float,
    D: Distance<F> + Clone,
    R: Rng,
{
    if data.is_empty() {
        return Err(LvqError::EmptyDataSet);
    }

    // --- 1. Initialization using specified strategy ---
    let mut codebook =
        initialize_prototypes(data, n_prototypes_per_class, &distance, &params.init, rng)?;

    // --- 2. Training loop ---
    let mut alpha = params.learning_rate;
    let mut order: Vec<usize> = (0..data.len()).collect();

    for epoch in 0..params.epochs {
        order.shuffle(rng);
        let mut updates = 0usize;

        for &data_idx in &order {
            let sample = &data[data_idx];
            let updated = match params.variant {
                LvqVariant::Lvq1 => lvq1_step(&mut codebook, &distance, sample, alpha),
                LvqVariant::Lvq21 { window } => {
                    lvq21_step(&mut codebook, &distance, sample, alpha, window)
                }
                LvqVariant::Lvq3 { window, epsilon } => {
                    lvq21_step(&mut codebook, &distance, sample, alpha, window)
                        || lvq3_same_class_step(
                            &mut codebook,
                            &distance,
                            sample,
                            alpha * epsilon,
                            window,
                        )
                }
            };
            if updated {
                updates += 1;
            }
        }

        trace!(epoch, updates, alpha = ?alpha, "lvq epoch");
        alpha *= params.decay;
    }

    Ok(Lvq { codebook, distance })
}

fn class_mean<L: Label, F: Float>(data: &[DataPoint<L, F>], indices: &[usize]) -> Array1<F> {
    let mut sum = Array1::zeros(data[indices[0]].n_features());
    for &i in indices {
        sum += &data[i].features;
    }
    sum / F::from_count(indices.len())
}

/// Indices and reduced distances of the nearest and second nearest prototypes.
fn nearest_two<L, F, D>(
    codebook: &[DataPoint<L, F>],
    distance: &D,
    features: ArrayView1<F>,
) -> Option<((usize, F), Option<(usize, F)>)>
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    let mut dists: Vec<(usize, F)> = codebook
        .iter()
        .enumerate()
        .map(|(i, proto)| (i, distance.rdistance(features, proto.view())))
        .collect();
    dists.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let mut iter = dists.into_iter();
    let first = iter.next()?;
    Some((first, iter.next()))
}

/// True when the sample lies inside the window around the midplane of two
/// prototypes: `min(d1/d2, d2/d1) > (1 - w) / (1 + w)`. With reduced (squared)
/// distances both sides of the comparison are squared.
fn in_window<F: Float>(rd1: F, rd2: F, window: F) -> bool {
    if rd2 <= F::epsilon() {
        return false;
    }
    let ratio = rd1 / rd2;
    let threshold = (F::one() - window) / (F::one() + window);
    ratio > threshold * threshold
}

/// Mutable references to two distinct prototypes.
fn pair_mut<T>(items: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = items.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = items.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

fn lvq1_step<L, F, D>(
    codebook: &mut [DataPoint<L, F>],
    distance: &D,
    sample: &DataPoint<L, F>,
    alpha: F,
) -> bool
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    let Some(((bmu_idx, _), _)) = nearest_two(codebook, distance, sample.view()) else {
        return false;
    };
    let bmu = &mut codebook[bmu_idx];
    let delta = (&sample.features - &bmu.features) * alpha;
    if sample.label == bmu.label {
        bmu.features += &delta;
    } else {
        bmu.features -= &delta;
    }
    true
}

fn lvq21_step<L, F, D>(
    codebook: &mut [DataPoint<L, F>],
    distance: &D,
    sample: &DataPoint<L, F>,
    alpha: F,
    window: F,
) -> bool
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    let Some(((i1, d1), Some((i2, d2)))) = nearest_two(codebook, distance, sample.view()) else {
        return false;
    };
    let (l1, l2) = (&codebook[i1].label, &codebook[i2].label);
    if l1 == l2 || (&sample.label != l1 && &sample.label != l2) || !in_window(d1, d2, window) {
        return false;
    }

    let (winner_idx, loser_idx) = if &sample.label == l1 { (i1, i2) } else { (i2, i1) };
    let (winner, loser) = pair_mut(codebook, winner_idx, loser_idx);
    let pull = (&sample.features - &winner.features) * alpha;
    winner.features += &pull;
    let push = (&sample.features - &loser.features) * alpha;
    loser.features -= &push;
    true
}

fn lvq3_same_class_step<L, F, D>(
    codebook: &mut [DataPoint<L, F>],
    distance: &D,
    sample: &DataPoint<L, F>,
    rate: F,
    window: F,
) -> bool
where
    L: Label,
    F: Float,
    D: Distance<F>,
{
    let Some(((i1, d1), Some((i2, d2)))) = nearest_two(codebook, distance, sample.view()) else {
        return false;
    };
    if codebook[i1].label != sample.label
        || codebook[i2].label != sample.label
        || !in_window(d1, d2, window)
    {
        return false;
    }
    let (p1, p2) = pair_mut(codebook, i1, i2);
    let pull1 = (&sample.features - &p1.features) * rate;
    p1.features += &pull1;
    let pull2 = (&sample.features - &p2.features) * rate;
    p2.features += &pull2;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use classweep_helpers::L2Dist;
    use ndarray::array;

    fn make_simple_data() -> Vec<DataPoint<&'static str, f64>> {
        vec![
            DataPoint::new(array![0.0, 0.0], "A"),
            DataPoint::new(array![0.1, 0.2], "A"),
            DataPoint::new(array![0.2, 0.1], "A"),
            DataPoint::new(array![0.1, 0.1], "A"),
            DataPoint::new(array![1.0, 1.0], "B"),
            DataPoint::new(array![1.1, 1.2], "B"),
            DataPoint::new(array![1.2, 1.1], "B"),
            DataPoint::new(array![1.1, 1.1], "B"),
        ]
    }

    fn assert_separates(model: &Lvq<&'static str, f64, L2Dist>) {
        assert_eq!(model.predict(array![0.05, 0.05].view()).unwrap(), "A");
        assert_eq!(model.predict(array![1.1, 1.05].view()).unwrap(), "B");
    }

    #[test]
    fn test_lvq1_fit_and_predict() {
        let params = LvqParams::new(LvqVariant::Lvq1).seed(1);
        let model = fit(&make_simple_data(), &params, L2Dist).expect("LVQ1 fit should succeed");
        assert_separates(&model);
    }

    #[test]
    fn test_lvq21_fit_and_predict() {
        let params = LvqParams::new(LvqVariant::Lvq21 { window: 0.3 })
            .init(PrototypeInit::ClassMean)
            .seed(2);
        let model = fit(&make_simple_data(), &params, L2Dist).expect("LVQ2.1 fit should succeed");
        assert_separates(&model);
    }

    #[test]
    fn test_lvq3_fit_and_predict() {
        let params = LvqParams::new(LvqVariant::Lvq3 {
            window: 0.3,
            epsilon: 0.5,
        })
        .init(PrototypeInit::ClassMean)
        .seed(3);
        let model = fit(&make_simple_data(), &params, L2Dist).expect("LVQ3 fit should succeed");
        assert_separates(&model);
    }

    #[test]
    fn test_zero_epochs_keeps_class_means() {
        let params = LvqParams::new(LvqVariant::Lvq1)
            .init(PrototypeInit::ClassMean)
            .epochs(0);
        let model = fit(&make_simple_data(), &params, L2Dist).unwrap();

        assert_eq!(model.codebook.len(), 2);
        let proto_a = model.codebook.iter().find(|p| p.label == "A").unwrap();
        assert_abs_diff_eq!(proto_a.features[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(proto_a.features[1], 0.1, epsilon = 1e-12);
        assert_separates(&model);
    }

    #[test]
    fn test_prototype_init_kmeans() {
        let data = make_simple_data();
        let mut counts = BTreeMap::new();
        counts.insert("A", 2);
        counts.insert("B", 2);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let codebook = initialize_prototypes(
            &data,
            &counts,
            &L2Dist,
            &PrototypeInit::KMeans {
                max_iter: 50,
                tol: 1e-6,
            },
            &mut rng,
        )
        .expect("KMeans init should succeed");
        assert_eq!(codebook.len(), 4);
        assert_eq!(codebook.iter().filter(|p| p.label == "A").count(), 2);
    }

    #[test]
    fn test_error_on_class_mean_multiple_prototypes() {
        let params = LvqParams::new(LvqVariant::Lvq1)
            .init(PrototypeInit::ClassMean)
            .prototypes_per_class(2);
        let result = fit(&make_simple_data(), &params, L2Dist);
        assert!(matches!(result, Err(LvqError::InvalidConfig(_))));
    }

    #[test]
    fn test_error_on_too_many_prototypes_and_unknown_class() {
        let data = make_simple_data();
        let params = LvqParams::new(LvqVariant::Lvq1).seed(5);

        let mut counts = BTreeMap::new();
        counts.insert("A", 5);
        let result = fit_with_counts(&data, &counts, &params, L2Dist);
        assert!(matches!(result, Err(LvqError::NotEnoughDataForPrototypes(_))));

        let mut counts = BTreeMap::new();
        counts.insert("C", 1);
        let result = fit_with_counts(&data, &counts, &params, L2Dist);
        assert!(matches!(result, Err(LvqError::UnknownClassInConfig(_))));

        let empty: Vec<DataPoint<&str, f64>> = vec![];
        assert_eq!(
            fit(&empty, &params, L2Dist).unwrap_err(),
            LvqError::EmptyDataSet
        );
    }

    #[test]
    fn test_reproducibility_with_seed() {
        let data = make_simple_data();
        let params = LvqParams::new(LvqVariant::Lvq1).seed(123);
        let a = fit(&data, &params, L2Dist).unwrap();
        let b = fit(&data, &params, L2Dist).unwrap();
        assert_eq!(a.codebook, b.codebook);
    }

    #[test]
    fn test_single_class_still_predicts() {
        let data: Vec<_> = make_simple_data()
            .into_iter()
            .filter(|dp| dp.label == "B")
            .collect();
        let params = LvqParams::new(LvqVariant::Lvq21 { window: 0.3 }).seed(9);
        let model = fit(&data, &params, L2Dist).unwrap();
        assert_eq!(model.predict(array![0.0, 0.0].view()).unwrap(), "B");
    }

    #[test]
    fn test_window() {
        assert!(in_window(1.0, 1.0, 0.3));
        assert!(!in_window(0.01, 1.0, 0.3));
        assert!(!in_window(1.0, 0.0, 0.3));
    }
}
