use crate::{BinaryProblem, LinearError, LinearModel};
use classweep_helpers::{DataPoint, Float, Label};
use ndarray::{Array1, Array2, Axis};

/// Least-squares classifier with an L2 penalty on `{-1, +1}` targets.
///
/// Solves `(XᵀX + αI) w = Xᵀy` on centred data; the intercept restores the
/// means and is not penalised.
#[derive(Debug, Clone, PartialEq)]
pub struct RidgeClassifier<F: Float> {
    pub alpha: F,
}

impl<F: Float> Default for RidgeClassifier<F> {
    fn default() -> Self {
        Self { alpha: F::one() }
    }
}

impl<F: Float> RidgeClassifier<F> {
    pub fn fit<L: Label>(&self, data: &[DataPoint<L, F>]) -> Result<LinearModel<L, F>, LinearError> {
        let problem = BinaryProblem::from_points(data)?;
        let signs = problem.targets.mapv(|t| t + t - F::one());

        let x_mean = problem
            .records
            .mean_axis(Axis(0))
            .ok_or(LinearError::EmptyDataSet)?;
        let y_mean = signs.mean().ok_or(LinearError::EmptyDataSet)?;
        let xc = &problem.records - &x_mean;
        let yc = &signs - y_mean;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += self.alpha;
        }
        let rhs = xc.t().dot(&yc);
        let weights = solve(gram, rhs).ok_or(LinearError::SingularSystem)?;
        let intercept = y_mean - x_mean.dot(&weights);

        Ok(problem.into_model(weights, intercept))
    }
}

/// Gaussian elimination with partial pivoting. `None` if `a` is singular.
fn solve<F: Float>(mut a: Array2<F>, mut b: Array1<F>) -> Option<Array1<F>> {
    let n = b.len();
    let tiny = F::epsilon();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[[i, col]]
                .abs()
                .partial_cmp(&a[[j, col]].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[[pivot, col]].abs() <= tiny {
            return None;
        }
        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }
        for row in col + 1..n {
            let factor = a[[row, col]] / a[[col, col]];
            for k in col..n {
                let delta = factor * a[[col, k]];
                a[[row, k]] -= delta;
            }
            let delta = factor * b[col];
            b[row] -= delta;
        }
    }

    let mut x = Array1::<F>::zeros(n);
    for row in (0..n).rev() {
        let mut acc = b[row];
        for k in row + 1..n {
            acc -= a[[row, k]] * x[k];
        }
        x[row] = acc / a[[row, row]];
    }
    Some(x)
}
