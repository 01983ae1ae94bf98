//! Classification metrics over true and predicted labels.
//!
//! Every function pairs `truth[i]` with `predicted[i]`; callers pass slices of
//! equal length.

use crate::dataset::Outcome;
use classweep_helpers::{Label, sorted_classes};
use std::fmt;

/// Signature of a user supplied metric.
pub type MetricFn = fn(&[Outcome], &[Outcome]) -> f64;

/// A named extra metric reported next to the built-in ones.
#[derive(Clone)]
pub struct CustomMetric {
    pub name: String,
    pub func: MetricFn,
}

impl CustomMetric {
    pub fn new(name: impl Into<String>, func: MetricFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    pub fn evaluate(&self, truth: &[Outcome], predicted: &[Outcome]) -> f64 {
        (self.func)(truth, predicted)
    }
}

impl fmt::Debug for CustomMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomMetric").field("name", &self.name).finish()
    }
}

/// Scores of one model on the evaluation subset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub accuracy: f64,
    pub balanced_accuracy: f64,
    /// `None` when the truth holds a single class.
    pub roc_auc: Option<f64>,
    pub f1_score: f64,
    pub custom: Option<f64>,
}

impl Scores {
    pub fn compute(truth: &[Outcome], predicted: &[Outcome], custom: Option<&CustomMetric>) -> Self {
        Self {
            accuracy: accuracy(truth, predicted),
            balanced_accuracy: balanced_accuracy(truth, predicted),
            roc_auc: roc_auc(truth, predicted, &Outcome::Passed),
            f1_score: f1_weighted(truth, predicted),
            custom: custom.map(|m| m.evaluate(truth, predicted)),
        }
    }
}

/// Per-class confusion counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

fn counts_for<L: Label>(truth: &[L], predicted: &[L], class: &L) -> Counts {
    let mut c = Counts::default();
    for (t, p) in truth.iter().zip(predicted) {
        match (t == class, p == class) {
            (true, true) => c.tp += 1,
            (false, true) => c.fp += 1,
            (true, false) => c.fn_ += 1,
            (false, false) => {}
        }
    }
    c
}

/// Fraction of exact matches. Zero for empty input.
pub fn accuracy<L: Label>(truth: &[L], predicted: &[L]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(predicted).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

/// Mean recall over the classes present in `truth`.
pub fn balanced_accuracy<L: Label>(truth: &[L], predicted: &[L]) -> f64 {
    let classes = sorted_classes(truth);
    if classes.is_empty() {
        return 0.0;
    }
    let total: f64 = classes
        .iter()
        .map(|class| {
            let c = counts_for(truth, predicted, class);
            c.tp as f64 / (c.tp + c.fn_) as f64
        })
        .sum();
    total / classes.len() as f64
}

/// F1 averaged over classes, weighted by each class's support in `truth`.
/// A class with no true positives scores 0.
pub fn f1_weighted<L: Label>(truth: &[L], predicted: &[L]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let classes = sorted_classes(truth);
    let weighted: f64 = classes
        .iter()
        .map(|class| {
            let c = counts_for(truth, predicted, class);
            let support = (c.tp + c.fn_) as f64;
            let denom = (2 * c.tp + c.fp + c.fn_) as f64;
            let f1 = if c.tp == 0 { 0.0 } else { 2.0 * c.tp as f64 / denom };
            f1 * support
        })
        .sum();
    weighted / truth.len() as f64
}

/// Area under the ROC curve for hard predictions of `positive`.
///
/// Each prediction is a score of 1 (positive) or 0, so the curve has a single
/// interior point and the area is `(TPR + TNR) / 2`. `None` unless `truth`
/// holds both positives and negatives.
pub fn roc_auc<L: Label>(truth: &[L], predicted: &[L], positive: &L) -> Option<f64> {
    let mut tp = 0usize;
    let mut pos = 0usize;
    let mut tn = 0usize;
    let mut neg = 0usize;
    for (t, p) in truth.iter().zip(predicted) {
        if t == positive {
            pos += 1;
            if p == positive {
                tp += 1;
            }
        } else {
            neg += 1;
            if p != positive {
                tn += 1;
            }
        }
    }
    if pos == 0 || neg == 0 {
        return None;
    }
    let tpr = tp as f64 / pos as f64;
    let tnr = tn as f64 / neg as f64;
    Some((tpr + tnr) / 2.0)
}
