//! Gaussian naive Bayes.
//!
//! Every feature is modelled as an independent normal distribution per class.
//! Variances are smoothed by a fraction of the largest feature variance in the
//! training data, so a feature that is constant within one class does not
//! produce infinite likelihoods.

use classweep_helpers::{DataPoint, Float, Label, class_counts, stack_features};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NaiveBayesError {
    #[error("training data is empty")]
    EmptyDataSet,
    #[error("data points have different numbers of features")]
    MismatchedDimensions,
    #[error("every feature is constant, variances cannot be smoothed")]
    ZeroVariance,
}

/// A fitted Gaussian naive Bayes model.
#[derive(Debug, Clone)]
pub struct GaussianNb<L: Label, F: Float> {
    classes: Vec<L>,
    log_priors: Array1<F>,
    /// `(n_classes, n_features)`
    means: Array2<F>,
    /// `(n_classes, n_features)`, already smoothed.
    variances: Array2<F>,
}

impl<L: Label, F: Float> GaussianNb<L, F> {
    /// Fits the model with scikit-learn's default smoothing of `1e-9`.
    pub fn fit(data: &[DataPoint<L, F>]) -> Result<Self, NaiveBayesError> {
        let smoothing = F::from_f64(1e-9).unwrap_or_else(F::epsilon);
        Self::fit_with_smoothing(data, smoothing)
    }

    pub fn fit_with_smoothing(
        data: &[DataPoint<L, F>],
        var_smoothing: F,
    ) -> Result<Self, NaiveBayesError> {
        if data.is_empty() {
            return Err(NaiveBayesError::EmptyDataSet);
        }
        let records = stack_features(data).ok_or(NaiveBayesError::MismatchedDimensions)?;
        let n_features = records.ncols();

        let max_var = records
            .var_axis(Axis(0), F::zero())
            .fold(F::zero(), |acc, &v| acc.max(v));
        let epsilon = var_smoothing * max_var;

        let counts = class_counts(data.iter().map(|dp| &dp.label));
        let n_classes = counts.len();
        let total = F::from_count(data.len());

        let mut classes = Vec::with_capacity(n_classes);
        let mut log_priors = Array1::zeros(n_classes);
        let mut means = Array2::zeros((n_classes, n_features));
        let mut variances = Array2::zeros((n_classes, n_features));

        for (c, (label, count)) in counts.into_iter().enumerate() {
            let rows: Vec<usize> = data
                .iter()
                .enumerate()
                .filter(|(_, dp)| dp.label == label)
                .map(|(i, _)| i)
                .collect();
            let class_records = records.select(Axis(0), &rows);
            let mean = class_records
                .mean_axis(Axis(0))
                .ok_or(NaiveBayesError::EmptyDataSet)?;
            let var = class_records.var_axis(Axis(0), F::zero()) + epsilon;
            if var.iter().any(|&v| v <= F::zero()) {
                return Err(NaiveBayesError::ZeroVariance);
            }

            log_priors[c] = (F::from_count(count) / total).ln();
            means.row_mut(c).assign(&mean);
            variances.row_mut(c).assign(&var);
            classes.push(label);
        }

        Ok(Self {
            classes,
            log_priors,
            means,
            variances,
        })
    }

    pub fn classes(&self) -> &[L] {
        &self.classes
    }

    /// Unnormalised log posterior of every class, in `classes()` order.
    pub fn joint_log_likelihood(&self, features: ArrayView1<F>) -> Array1<F> {
        let two_pi = F::from_f64(std::f64::consts::TAU).unwrap_or_else(F::one);
        let half = F::from_f64(0.5).unwrap_or_else(F::one);
        let mut jll = self.log_priors.clone();
        for (c, value) in jll.iter_mut().enumerate() {
            let mut log_density = F::zero();
            for ((&x, &mean), &var) in features
                .iter()
                .zip(self.means.row(c))
                .zip(self.variances.row(c))
            {
                let diff = x - mean;
                log_density -= half * ((two_pi * var).ln() + diff * diff / var);
            }
            *value += log_density;
        }
        jll
    }

    /// The class with the highest posterior; the smallest label on ties.
    pub fn predict(&self, features: ArrayView1<F>) -> L {
        let jll = self.joint_log_likelihood(features);
        let mut best = 0;
        for (c, &v) in jll.iter().enumerate() {
            if v > jll[best] {
                best = c;
            }
        }
        self.classes[best].clone()
    }
}
