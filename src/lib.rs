//! Runs a catalog of classifiers over a small pass/fail dataset and ranks
//! them by how well they predict a held-out subset.
//!
//! The pipeline is [`Dataset::reference`], [`split`], [`SweepRunner::run`]
//! (or [`sweep`]) and finally [`report::write_report`].

pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod preprocess;
pub mod report;
pub mod split;
pub mod sweep;

pub use catalog::{BoxError, Classifier, ModelKind};
pub use classweep_helpers::{DataPoint, Distance, L1Dist, L2Dist, LInfDist};
pub use config::SweepConfig;
pub use dataset::{Dataset, Example, Outcome};
pub use error::{Result, SweepError};
pub use metrics::{CustomMetric, MetricFn, Scores};
pub use preprocess::StandardScaler;
pub use split::{Split, split};
pub use sweep::{ModelScoreRow, ScoreReport, SkippedModel, SweepRunner, sweep};
