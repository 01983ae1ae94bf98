//! Text rendering of a [`ScoreReport`].

use crate::sweep::ScoreReport;
use std::io::{self, Write};
use tabled::builder::Builder;
use tabled::{Table, Tabled};

pub const HEADING: &str = "Classifier comparison:";
pub const EMPTY_NOTICE: &str = "no models succeeded";
pub const NOT_AVAILABLE: &str = "n/a";

#[derive(Tabled)]
struct SkippedRow<'a> {
    #[tabled(rename = "Model")]
    model: &'a str,
    #[tabled(rename = "Reason")]
    reason: &'a str,
}

fn metric(value: f64) -> String {
    format!("{value:.4}")
}

fn optional(value: Option<f64>) -> String {
    value.map(metric).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// The score table, one row per model in report order. An empty report
/// yields the header alone.
pub fn render(report: &ScoreReport) -> String {
    let mut header = vec![
        "Model".to_string(),
        "Accuracy".to_string(),
        "Balanced Accuracy".to_string(),
        "ROC AUC".to_string(),
        "F1 Score".to_string(),
    ];
    if let Some(name) = &report.custom_metric {
        header.push(name.clone());
    }
    header.push("Time Taken".to_string());

    let mut builder = Builder::default();
    builder.push_record(header);
    for row in &report.rows {
        let mut record = vec![
            row.model.clone(),
            metric(row.accuracy),
            metric(row.balanced_accuracy),
            optional(row.roc_auc),
            metric(row.f1_score),
        ];
        if report.custom_metric.is_some() {
            record.push(optional(row.custom_metric));
        }
        record.push(metric(row.time_taken.as_secs_f64()));
        builder.push_record(record);
    }
    builder.build().to_string()
}

/// Models that failed, with the reason. `None` when every model succeeded.
pub fn render_skipped(report: &ScoreReport) -> Option<String> {
    if report.skipped.is_empty() {
        return None;
    }
    let rows = report.skipped.iter().map(|s| SkippedRow {
        model: &s.model,
        reason: &s.reason,
    });
    Some(Table::new(rows).to_string())
}

/// Kept predictions: one row per evaluation example, one column per model
/// that kept them, in report order.
pub fn render_predictions(report: &ScoreReport) -> String {
    let kept: Vec<_> = report
        .rows
        .iter()
        .filter_map(|row| row.predictions.as_ref().map(|p| (row.model.as_str(), p)))
        .collect();

    let mut header = vec!["#".to_string(), "Truth".to_string()];
    header.extend(kept.iter().map(|(name, _)| name.to_string()));

    let mut builder = Builder::default();
    builder.push_record(header);
    for (i, truth) in report.truth.iter().enumerate() {
        let mut record = vec![i.to_string(), truth.to_string()];
        for (_, predictions) in &kept {
            record.push(
                predictions
                    .get(i)
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            );
        }
        builder.push_record(record);
    }
    builder.build().to_string()
}

/// Writes the heading and score table, followed by any skipped models and
/// kept predictions.
pub fn write_report<W: Write>(writer: &mut W, report: &ScoreReport) -> io::Result<()> {
    writeln!(writer, "{HEADING}")?;
    writeln!(writer, "{}", render(report))?;
    if report.is_empty() {
        writeln!(writer, "{EMPTY_NOTICE}")?;
    }
    if let Some(skipped) = render_skipped(report) {
        writeln!(writer)?;
        writeln!(writer, "Skipped models:")?;
        writeln!(writer, "{skipped}")?;
    }
    if report.rows.iter().any(|r| r.predictions.is_some()) {
        writeln!(writer)?;
        writeln!(writer, "Predictions:")?;
        writeln!(writer, "{}", render_predictions(report))?;
    }
    Ok(())
}
