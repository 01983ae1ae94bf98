use crate::{BinaryProblem, LinearError, LinearModel};
use classweep_helpers::{DataPoint, Float, Label};
use ndarray::Array1;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing::debug;

/// Rosenblatt's perceptron.
///
/// Samples are visited in a freshly shuffled order each epoch; training stops
/// after an epoch without mistakes or after `max_epochs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Perceptron<F: Float> {
    pub eta: F,
    pub max_epochs: usize,
    pub seed: u64,
}

impl<F: Float> Perceptron<F> {
    pub fn new(seed: u64) -> Self {
        Self {
            eta: F::one(),
            max_epochs: 1000,
            seed,
        }
    }

    pub fn fit<L: Label>(&self, data: &[DataPoint<L, F>]) -> Result<LinearModel<L, F>, LinearError> {
        let problem = BinaryProblem::from_points(data)?;
        let (n_samples, n_features) = problem.records.dim();
        // {0, 1} targets become {-1, +1}.
        let signs = problem.targets.mapv(|t| t + t - F::one());

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n_samples).collect();
        let mut weights = Array1::<F>::zeros(n_features);
        let mut intercept = F::zero();

        for epoch in 0..self.max_epochs {
            order.shuffle(&mut rng);
            let mut mistakes = 0usize;
            for &i in &order {
                let x = problem.records.row(i);
                let y = signs[i];
                if y * (weights.dot(&x) + intercept) <= F::zero() {
                    weights.scaled_add(self.eta * y, &x);
                    intercept += self.eta * y;
                    mistakes += 1;
                }
            }
            if mistakes == 0 {
                debug!(epochs = epoch + 1, "perceptron converged");
                break;
            }
        }

        Ok(problem.into_model(weights, intercept))
    }
}
