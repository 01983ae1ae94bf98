use crate::{BinaryProblem, LinearError, LinearModel};
use classweep_helpers::{DataPoint, Float, Label};
use ndarray::Array1;
use tracing::debug;

/// L2-regularised logistic regression trained by full-batch gradient descent.
///
/// Minimises `(1/n) Σ log-loss + ||w||² / (2 C n)`, which has the same
/// minimiser as scikit-learn's `C`-weighted objective. The intercept is not
/// penalised.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticRegression<F: Float> {
    /// Inverse regularisation strength.
    pub c: F,
    pub learning_rate: F,
    pub max_iter: usize,
    /// Stop once the gradient's largest component falls below this.
    pub tolerance: F,
}

impl<F: Float> Default for LogisticRegression<F> {
    fn default() -> Self {
        Self {
            c: F::one(),
            learning_rate: F::from_f64(0.5).unwrap_or_else(F::one),
            max_iter: 1000,
            tolerance: F::from_f64(1e-6).unwrap_or_else(F::epsilon),
        }
    }
}

fn sigmoid<F: Float>(z: F) -> F {
    F::one() / (F::one() + (-z).exp())
}

impl<F: Float> LogisticRegression<F> {
    pub fn fit<L: Label>(&self, data: &[DataPoint<L, F>]) -> Result<LinearModel<L, F>, LinearError> {
        let problem = BinaryProblem::from_points(data)?;
        let (n_samples, n_features) = problem.records.dim();
        let n = F::from_count(n_samples);
        let penalty = F::one() / (self.c * n);

        let mut weights = Array1::<F>::zeros(n_features);
        let mut intercept = F::zero();

        for iter in 0..self.max_iter {
            let logits = problem.records.dot(&weights) + intercept;
            let residuals = logits.mapv(sigmoid) - &problem.targets;

            let grad_w = problem.records.t().dot(&residuals) / n + &weights * penalty;
            let grad_b = residuals.sum() / n;

            weights.scaled_add(-self.learning_rate, &grad_w);
            intercept -= self.learning_rate * grad_b;

            let largest = grad_w
                .iter()
                .fold(grad_b.abs(), |acc, &g| acc.max(g.abs()));
            if largest < self.tolerance {
                debug!(iterations = iter + 1, "logistic regression converged");
                break;
            }
        }

        Ok(problem.into_model(weights, intercept))
    }
}
