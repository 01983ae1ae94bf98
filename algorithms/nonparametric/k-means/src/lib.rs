use classweep_helpers::{DataPoint, Distance, Float, Label};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use thiserror::Error;
use tracing::trace;

/// Errors that can occur during k-means clustering.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KMeansError {
    #[error("k must be at least 1")]
    InvalidK,
    #[error("cannot cluster an empty data set")]
    EmptyDataSet,
    #[error("k is larger than the number of data points")]
    KTooLarge,
    #[error("data points have different numbers of features")]
    MismatchedDimensions,
    #[error("invalid distance comparison (likely due to NaN values in data)")]
    InvalidDistance,
    #[error("model has not been fitted")]
    NotFitted,
}

/// A k-means clustering model.
///
/// Centroids are seeded with k-means++. Without an explicit seed every call
/// to [`KMeans::fit`] draws a fresh one.
#[derive(Debug, Clone)]
pub struct KMeans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    pub k: usize,
    max_iter: u32,
    tolerance: F,
    distance: D,
    seed: Option<u64>,
    centroids: Option<Array2<F>>,
}

impl<F, D> KMeans<F, D>
where
    F: Float,
    D: Distance<F>,
{
    pub fn new(k: usize, max_iter: u32, tolerance: F, distance: D) -> Self {
        Self {
            k,
            max_iter,
            tolerance,
            distance,
            seed: None,
            centroids: None,
        }
    }

    /// Fixes the seed used for centroid initialization.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Clusters `data`, returning the cluster index of every point and the
    /// final centroids. Labels are ignored.
    pub fn fit<L: Label>(
        &mut self,
        data: &[DataPoint<L, F>],
    ) -> Result<(Vec<usize>, Array2<F>), KMeansError> {
        if self.k == 0 {
            return Err(KMeansError::InvalidK);
        }
        if data.is_empty() {
            return Err(KMeansError::EmptyDataSet);
        }
        if self.k > data.len() {
            return Err(KMeansError::KTooLarge);
        }

        let n_features = data[0].n_features();
        if data.iter().any(|dp| dp.n_features() != n_features) {
            return Err(KMeansError::MismatchedDimensions);
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed.unwrap_or_else(rand::random));
        let mut centroids = Array2::zeros((self.k, n_features));
        self.kmeans_plus_plus_init(data, &mut centroids, &mut rng);

        // usize::MAX forces every point to count as changed on the first pass.
        let mut assignments = vec![usize::MAX; data.len()];

        for iter in 0..self.max_iter {
            // Assignment step
            let mut changes = 0;
            for (i, dp) in data.iter().enumerate() {
                let best_idx = self.nearest_centroid(dp.view(), centroids.view())?;
                if assignments[i] != best_idx {
                    assignments[i] = best_idx;
                    changes += 1;
                }
            }
            trace!(iteration = iter + 1, changes, "k-means assignment pass");
            if changes == 0 {
                break;
            }

            // Update step; an empty cluster keeps its previous centroid.
            let mut sums = Array2::<F>::zeros((self.k, n_features));
            let mut counts = vec![0usize; self.k];
            for (dp, &a) in data.iter().zip(&assignments) {
                let mut row = sums.row_mut(a);
                row += &dp.features;
                counts[a] += 1;
            }
            let mut new_centroids = centroids.clone();
            for (c, &count) in counts.iter().enumerate() {
                if count > 0 {
                    let mean: Array1<F> = &sums.row(c) / F::from_count(count);
                    new_centroids.row_mut(c).assign(&mean);
                }
            }

            // Converged once no centroid moves further than the tolerance.
            let mut max_shift = F::zero();
            for (old, new) in centroids.rows().into_iter().zip(new_centroids.rows()) {
                let shift = self.distance.distance(old, new);
                if shift.is_nan() {
                    return Err(KMeansError::InvalidDistance);
                }
                max_shift = max_shift.max(shift);
            }
            trace!(iteration = iter + 1, max_shift = ?max_shift, "k-means update pass");

            centroids = new_centroids;
            if max_shift < self.tolerance {
                break;
            }
        }

        // Assignments against the final centroids.
        for (i, dp) in data.iter().enumerate() {
            assignments[i] = self.nearest_centroid(dp.view(), centroids.view())?;
        }

        self.centroids = Some(centroids.clone());
        Ok((assignments, centroids))
    }

    pub fn predict(&self, point: ArrayView1<F>) -> Result<usize, KMeansError> {
        let centroids = self.centroids.as_ref().ok_or(KMeansError::NotFitted)?;
        self.nearest_centroid(point, centroids.view())
    }

    pub fn centroids(&self) -> Result<ArrayView2<'_, F>, KMeansError> {
        self.centroids
            .as_ref()
            .map(|c| c.view())
            .ok_or(KMeansError::NotFitted)
    }

    fn nearest_centroid(
        &self,
        point: ArrayView1<F>,
        centroids: ArrayView2<F>,
    ) -> Result<usize, KMeansError> {
        let mut best = F::infinity();
        let mut idx = 0;
        for (i, c) in centroids.rows().into_iter().enumerate() {
            let d = self.distance.rdistance(point, c);
            if d.is_nan() {
                return Err(KMeansError::InvalidDistance);
            }
            if d < best {
                best = d;
                idx = i;
            }
        }
        Ok(idx)
    }

    /// K-Means++ initialization: the first centroid is a uniformly chosen
    /// point, each next one is drawn with probability proportional to its
    /// squared distance from the nearest centroid picked so far.
    fn kmeans_plus_plus_init<L: Label, R: Rng>(
        &self,
        data: &[DataPoint<L, F>],
        centroids: &mut Array2<F>,
        rng: &mut R,
    ) {
        let first_idx = rng.random_range(0..data.len());
        centroids.row_mut(0).assign(&data[first_idx].features);

        for k in 1..self.k {
            let mut weights: Vec<F> = Vec::with_capacity(data.len());
            let mut total_weight = F::zero();

            for dp in data {
                let nearest = (0..k)
                    .map(|j| {
                        let dist = self.distance.distance(dp.view(), centroids.row(j));
                        dist * dist
                    })
                    .fold(F::infinity(), F::min);
                weights.push(nearest);
                total_weight += nearest;
            }

            let chosen = if total_weight > F::zero() {
                let target = F::from_f64(rng.random::<f64>()).unwrap_or_else(F::zero) * total_weight;
                let mut cumulative = F::zero();
                weights
                    .iter()
                    .position(|&w| {
                        cumulative += w;
                        cumulative >= target
                    })
                    .unwrap_or(data.len() - 1)
            } else {
                // Every point coincides with a centroid already.
                rng.random_range(0..data.len())
            };
            centroids.row_mut(k).assign(&data[chosen].features);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use classweep_helpers::L2Dist;
    use ndarray::array;

    fn make_simple_data() -> Vec<DataPoint<(), f64>> {
        let mut v = Vec::new();
        for &(x, y) in &[(0.1, -0.2), (0.2, 0.0), (-0.1, 0.1)] {
            v.push(DataPoint::new(array![x, y], ()));
        }
        for &(x, y) in &[(9.8, 10.2), (10.1, 9.9), (10.0, 10.0)] {
            v.push(DataPoint::new(array![x, y], ()));
        }
        v
    }

    #[test]
    fn test_kmeans_separates_two_blobs() {
        let data = make_simple_data();
        let mut model = KMeans::new(2, 100, 1e-6, L2Dist).with_seed(7);
        let (assignments, centroids) = model.fit(&data).unwrap();

        let mut counts = assignments.iter().fold(vec![0; 2], |mut acc, &a| {
            acc[a] += 1;
            acc
        });
        counts.sort();
        assert_eq!(counts, vec![3, 3]);
        assert_eq!(assignments[0], assignments[1]);
        assert_ne!(assignments[0], assignments[3]);

        let low = centroids.row(assignments[0]);
        assert_abs_diff_eq!(low[0], 0.2 / 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(low[1], -0.1 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_predict_matches_assignments() {
        let data = make_simple_data();
        let mut model = KMeans::new(2, 100, 1e-6, L2Dist).with_seed(11);
        let (assignments, _) = model.fit(&data).unwrap();
        let c1 = model.predict(array![0.0, 0.0].view()).unwrap();
        let c2 = model.predict(array![10.0, 10.0].view()).unwrap();
        assert_ne!(c1, c2);
        assert_eq!(c1, assignments[0]);
        assert_eq!(c2, assignments[3]);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let data = make_simple_data();
        let mut a = KMeans::new(2, 100, 1e-6, L2Dist).with_seed(42);
        let mut b = KMeans::new(2, 100, 1e-6, L2Dist).with_seed(42);
        assert_eq!(a.fit(&data).unwrap(), b.fit(&data).unwrap());
    }

    #[test]
    fn test_errors() {
        let data = make_simple_data();
        let mut m = KMeans::<f64, L2Dist>::new(0, 10, 1e-6, L2Dist);
        assert_eq!(m.fit(&data).unwrap_err(), KMeansError::InvalidK);
        let mut m = KMeans::new(2, 10, 1e-6, L2Dist);
        assert_eq!(m.fit::<&str>(&[]).unwrap_err(), KMeansError::EmptyDataSet);
        let mut m = KMeans::new(10, 10, 1e-6, L2Dist);
        assert_eq!(m.fit(&data).unwrap_err(), KMeansError::KTooLarge);
        let bad: Vec<DataPoint<(), f64>> = vec![
            DataPoint::new(array![1.0, 2.0], ()),
            DataPoint::new(array![3.0], ()),
        ];
        let mut m = KMeans::new(2, 10, 1e-6, L2Dist);
        assert_eq!(m.fit(&bad).unwrap_err(), KMeansError::MismatchedDimensions);
        let m: KMeans<f64, L2Dist> = KMeans::new(2, 10, 1e-6, L2Dist);
        assert_eq!(
            m.predict(array![0.0, 0.0].view()).unwrap_err(),
            KMeansError::NotFitted
        );
    }
}
