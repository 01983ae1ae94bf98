use crate::catalog::ModelKind;
use crate::error::{Result, SweepError};
use serde::{Deserialize, Serialize};

/// Settings of one sweep. Every field has a default, so an empty TOML
/// document is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SweepConfig {
    /// Share of the examples held out for evaluation.
    pub test_fraction: f64,
    /// Seeds the split and every randomised model.
    pub seed: u64,
    /// Silence diagnostics emitted while a model fits or predicts.
    pub ignore_warnings: bool,
    /// Log each model's scores at `info` instead of `debug`.
    pub verbose: bool,
    /// Keep every model's evaluation predictions in the report.
    pub keep_predictions: bool,
    /// Restricts the sweep to these models; `None` runs the whole catalog.
    pub classifiers: Option<Vec<ModelKind>>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 42,
            ignore_warnings: true,
            verbose: false,
            keep_predictions: false,
            classifiers: None,
        }
    }
}

impl SweepConfig {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(SweepError::InvalidTestFraction(self.test_fraction));
        }
        Ok(())
    }

    /// Models to run, in catalog order and without duplicates.
    pub fn catalog(&self) -> Vec<ModelKind> {
        match &self.classifiers {
            None => ModelKind::ALL.to_vec(),
            Some(chosen) => ModelKind::ALL
                .into_iter()
                .filter(|kind| chosen.contains(kind))
                .collect(),
        }
    }
}
