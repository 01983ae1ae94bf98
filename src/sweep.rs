//! Fits and scores every catalog entry on one split.

use crate::catalog::{BoxError, Classifier, ModelKind};
use crate::config::SweepConfig;
use crate::dataset::{Dataset, Outcome};
use crate::error::{Result, SweepError};
use crate::metrics::{CustomMetric, MetricFn, Scores};
use crate::preprocess::StandardScaler;
use classweep_helpers::DataPoint;
use std::time::{Duration, Instant};
use tracing::subscriber::NoSubscriber;
use tracing::{debug, info, warn};

/// Scores of one model that fitted and predicted successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelScoreRow {
    pub kind: ModelKind,
    pub model: String,
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    /// `None` when the evaluation subset holds a single class.
    pub roc_auc: Option<f64>,
    pub f1_score: f64,
    pub custom_metric: Option<f64>,
    /// Wall time of fit plus predict.
    pub time_taken: Duration,
    /// Evaluation predictions, kept on request.
    pub predictions: Option<Vec<Outcome>>,
}

/// A catalog entry that failed to fit or predict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModel {
    pub kind: ModelKind,
    pub model: String,
    pub reason: String,
}

/// Outcome of a sweep.
///
/// Rows are ordered by accuracy, then balanced accuracy, both descending;
/// remaining ties keep catalog order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScoreReport {
    pub rows: Vec<ModelScoreRow>,
    pub skipped: Vec<SkippedModel>,
    /// Name of the custom metric column, if one was computed.
    pub custom_metric: Option<String>,
    /// True labels of the evaluation subset, in evaluation order.
    pub truth: Vec<Outcome>,
}

impl ScoreReport {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn best(&self) -> Option<&ModelScoreRow> {
        self.rows.first()
    }

    pub fn row(&self, kind: ModelKind) -> Option<&ModelScoreRow> {
        self.rows.iter().find(|r| r.kind == kind)
    }

    pub fn is_skipped(&self, kind: ModelKind) -> bool {
        self.skipped.iter().any(|s| s.kind == kind)
    }

    fn sort(&mut self) {
        // Stable: equal scores keep catalog order.
        self.rows.sort_by(|a, b| {
            b.accuracy
                .total_cmp(&a.accuracy)
                .then(b.balanced_accuracy.total_cmp(&a.balanced_accuracy))
        });
    }
}

/// Runs the catalog selected by a [`SweepConfig`].
#[derive(Debug, Clone, Default)]
pub struct SweepRunner {
    config: SweepConfig,
    custom_metric: Option<CustomMetric>,
}

struct Evaluated {
    predictions: Vec<Outcome>,
    elapsed: Duration,
}

impl SweepRunner {
    pub fn new(config: SweepConfig) -> Self {
        Self {
            config,
            custom_metric: None,
        }
    }

    /// Adds an extra metric column computed from truth and predictions.
    pub fn with_custom_metric(mut self, name: impl Into<String>, func: MetricFn) -> Self {
        self.custom_metric = Some(CustomMetric::new(name, func));
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Fits every selected model on `training` and scores it on `evaluation`.
    ///
    /// Features are standardised with statistics from `training`. A model
    /// that fails is recorded in [`ScoreReport::skipped`]; only malformed
    /// input aborts the sweep.
    pub fn run(&self, training: &Dataset, evaluation: &Dataset) -> Result<ScoreReport> {
        if training.is_empty() {
            return Err(SweepError::MalformedInput("training subset is empty".into()));
        }
        if evaluation.is_empty() {
            return Err(SweepError::MalformedInput("evaluation subset is empty".into()));
        }

        let scaler = StandardScaler::fit(&training.to_points())?;
        let train = scaler.transform(&training.to_points());
        let eval = scaler.transform(&evaluation.to_points());
        let truth = evaluation.labels();

        let mut report = ScoreReport {
            custom_metric: self.custom_metric.as_ref().map(|m| m.name.clone()),
            truth: truth.clone(),
            ..ScoreReport::default()
        };

        for kind in self.config.catalog() {
            let mut model = kind.build(self.config.seed);
            match self.evaluate(model.as_mut(), &train, &eval) {
                Ok(Evaluated {
                    predictions,
                    elapsed,
                }) => {
                    let scores = Scores::compute(&truth, &predictions, self.custom_metric.as_ref());
                    self.log_scores(kind, &scores, elapsed);
                    report.rows.push(ModelScoreRow {
                        kind,
                        model: model.name(),
                        accuracy: scores.accuracy,
                        balanced_accuracy: scores.balanced_accuracy,
                        roc_auc: scores.roc_auc,
                        f1_score: scores.f1_score,
                        custom_metric: scores.custom,
                        time_taken: elapsed,
                        predictions: self.config.keep_predictions.then_some(predictions),
                    });
                }
                Err(e) => {
                    warn!(model = %kind, error = %e, "model skipped");
                    report.skipped.push(SkippedModel {
                        kind,
                        model: model.name(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        report.sort();
        debug!(
            succeeded = report.rows.len(),
            skipped = report.skipped.len(),
            "sweep finished"
        );
        Ok(report)
    }

    fn evaluate(
        &self,
        model: &mut dyn Classifier,
        train: &[DataPoint<Outcome, f64>],
        eval: &[DataPoint<Outcome, f64>],
    ) -> std::result::Result<Evaluated, BoxError> {
        let start = Instant::now();
        self.scoped(|| model.fit(train))?;
        let predictions = self.scoped(|| {
            eval.iter()
                .map(|dp| model.predict(dp.view()))
                .collect::<std::result::Result<Vec<_>, _>>()
        })?;
        Ok(Evaluated {
            predictions,
            elapsed: start.elapsed(),
        })
    }

    /// Runs `f` with model diagnostics discarded when warnings are ignored.
    /// Only the current thread is affected, and only for the call.
    fn scoped<T>(&self, f: impl FnOnce() -> T) -> T {
        if self.config.ignore_warnings {
            tracing::subscriber::with_default(NoSubscriber::default(), f)
        } else {
            f()
        }
    }

    fn log_scores(&self, kind: ModelKind, scores: &Scores, elapsed: Duration) {
        if self.config.verbose {
            info!(
                model = %kind,
                accuracy = scores.accuracy,
                balanced_accuracy = scores.balanced_accuracy,
                roc_auc = ?scores.roc_auc,
                f1 = scores.f1_score,
                seconds = elapsed.as_secs_f64(),
                "model scored"
            );
        } else {
            debug!(
                model = %kind,
                accuracy = scores.accuracy,
                seconds = elapsed.as_secs_f64(),
                "model scored"
            );
        }
    }
}

/// Sweeps the full catalog with the default configuration.
pub fn sweep(training: &Dataset, evaluation: &Dataset) -> Result<ScoreReport> {
    SweepRunner::new(SweepConfig::default()).run(training, evaluation)
}
