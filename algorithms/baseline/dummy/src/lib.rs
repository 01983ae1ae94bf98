//! A baseline classifier that ignores the features.

use classweep_helpers::{DataPoint, Float, Label, class_counts, majority_label};
use ndarray::ArrayView1;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DummyError {
    #[error("training data is empty")]
    EmptyDataSet,
}

/// Always predicts the most frequent training label; the smallest label on ties.
#[derive(Debug, Clone)]
pub struct DummyClassifier<L: Label> {
    priors: BTreeMap<L, usize>,
    majority: L,
}

impl<L: Label> DummyClassifier<L> {
    pub fn fit<F: Float>(data: &[DataPoint<L, F>]) -> Result<Self, DummyError> {
        let majority =
            majority_label(data.iter().map(|dp| &dp.label)).ok_or(DummyError::EmptyDataSet)?;
        let priors = class_counts(data.iter().map(|dp| &dp.label));
        Ok(Self { priors, majority })
    }

    /// Training label counts in label order.
    pub fn priors(&self) -> &BTreeMap<L, usize> {
        &self.priors
    }

    pub fn predict<F: Float>(&self, _features: ArrayView1<F>) -> L {
        self.majority.clone()
    }
}
