//! The student dataset: hours studied, classes attended and whether the
//! student passed.

use crate::error::{Result, SweepError};
use classweep_helpers::{DataPoint, class_counts};
use ndarray::{Array1, array};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Binary pass/fail label. `Passed` is the positive class.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Failed,
    Passed,
}

impl Outcome {
    pub fn from_flag(flag: u8) -> Option<Self> {
        match flag {
            0 => Some(Outcome::Failed),
            1 => Some(Outcome::Passed),
            _ => None,
        }
    }

    pub fn as_flag(self) -> u8 {
        match self {
            Outcome::Failed => 0,
            Outcome::Passed => 1,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_flag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Example {
    pub hours_studied: f64,
    pub classes_attended: f64,
    pub passed: Outcome,
}

impl Example {
    pub fn features(&self) -> Array1<f64> {
        array![self.hours_studied, self.classes_attended]
    }

    pub fn to_point(&self) -> DataPoint<Outcome, f64> {
        DataPoint::new(self.features(), self.passed)
    }
}

const REFERENCE_ROWS: [(f64, f64, u8); 13] = [
    (1.0, 5.0, 0),
    (2.0, 10.0, 0),
    (3.0, 8.0, 0),
    (4.0, 12.0, 0),
    (5.0, 14.0, 1),
    (6.0, 15.0, 1),
    (8.0, 18.0, 1),
    (9.0, 20.0, 1),
    (10.0, 22.0, 1),
    (11.0, 24.0, 1),
    (13.0, 27.0, 1),
    (14.0, 28.0, 1),
    (15.0, 30.0, 1),
];

/// An ordered, immutable sequence of examples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    examples: Vec<Example>,
}

impl Dataset {
    pub const FEATURE_NAMES: [&'static str; 2] = ["hours_studied", "classes_attended"];

    /// The embedded 13-row dataset: 4 failed and 9 passed students.
    pub fn reference() -> Self {
        let examples = REFERENCE_ROWS
            .iter()
            .map(|&(hours, attended, flag)| Example {
                hours_studied: hours,
                classes_attended: attended,
                passed: if flag == 0 { Outcome::Failed } else { Outcome::Passed },
            })
            .collect();
        Self { examples }
    }

    /// Builds a dataset from parallel columns.
    ///
    /// Columns must have equal lengths, features must be finite and
    /// non-negative, and every label must be 0 or 1.
    pub fn from_columns(hours: &[f64], attended: &[f64], passed: &[u8]) -> Result<Self> {
        if hours.len() != attended.len() || hours.len() != passed.len() {
            return Err(SweepError::MalformedInput(format!(
                "column lengths differ: {} hours, {} attendances, {} labels",
                hours.len(),
                attended.len(),
                passed.len()
            )));
        }

        let mut examples = Vec::with_capacity(hours.len());
        for (row, ((&h, &a), &flag)) in hours.iter().zip(attended).zip(passed).enumerate() {
            let passed = Outcome::from_flag(flag).ok_or_else(|| {
                SweepError::MalformedInput(format!("row {row}: label {flag} is not 0 or 1"))
            })?;
            examples.push(Example {
                hours_studied: h,
                classes_attended: a,
                passed,
            });
        }
        Self::from_examples(examples)
    }

    pub fn from_examples(examples: Vec<Example>) -> Result<Self> {
        for (row, ex) in examples.iter().enumerate() {
            for (name, value) in Self::FEATURE_NAMES
                .iter()
                .zip([ex.hours_studied, ex.classes_attended])
            {
                if !value.is_finite() || value < 0.0 {
                    return Err(SweepError::MalformedInput(format!(
                        "row {row}: {name} must be finite and non-negative, got {value}"
                    )));
                }
            }
        }
        Ok(Self { examples })
    }

    /// Keeps the examples at `indices`, in that order. Indices must be in range.
    pub(crate) fn select(&self, indices: &[usize]) -> Self {
        Self {
            examples: indices.iter().map(|&i| self.examples[i]).collect(),
        }
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Example> {
        self.examples.iter()
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn labels(&self) -> Vec<Outcome> {
        self.examples.iter().map(|ex| ex.passed).collect()
    }

    pub fn to_points(&self) -> Vec<DataPoint<Outcome, f64>> {
        self.examples.iter().map(Example::to_point).collect()
    }

    pub fn class_counts(&self) -> BTreeMap<Outcome, usize> {
        class_counts(self.examples.iter().map(|ex| &ex.passed))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a Example;
    type IntoIter = std::slice::Iter<'a, Example>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_shape() {
        let data = Dataset::reference();
        assert_eq!(data.len(), 13);
        let counts = data.class_counts();
        assert_eq!(counts[&Outcome::Failed], 4);
        assert_eq!(counts[&Outcome::Passed], 9);
    }

    #[test]
    fn test_reference_matches_columns() {
        let hours: Vec<f64> = REFERENCE_ROWS.iter().map(|r| r.0).collect();
        let attended: Vec<f64> = REFERENCE_ROWS.iter().map(|r| r.1).collect();
        let passed: Vec<u8> = REFERENCE_ROWS.iter().map(|r| r.2).collect();
        let built = Dataset::from_columns(&hours, &attended, &passed).unwrap();
        assert_eq!(built, Dataset::reference());
    }

    #[test]
    fn test_points_carry_both_features() {
        let points = Dataset::reference().to_points();
        assert_eq!(points[2].features, array![3.0, 8.0]);
        assert_eq!(points[2].label, Outcome::Failed);
        assert_eq!(points[12].label, Outcome::Passed);
    }

    #[test]
    fn test_mismatched_columns() {
        let err = Dataset::from_columns(&[1.0, 2.0], &[3.0], &[0, 1]).unwrap_err();
        assert!(matches!(err, SweepError::MalformedInput(_)));
    }

    #[test]
    fn test_bad_label() {
        let err = Dataset::from_columns(&[1.0], &[3.0], &[2]).unwrap_err();
        assert!(err.to_string().contains("label 2"));
    }

    #[test]
    fn test_negative_and_nan_features() {
        assert!(Dataset::from_columns(&[-1.0], &[3.0], &[0]).is_err());
        assert!(Dataset::from_columns(&[1.0], &[f64::NAN], &[0]).is_err());
    }

    #[test]
    fn test_outcome_flags() {
        assert_eq!(Outcome::from_flag(1), Some(Outcome::Passed));
        assert_eq!(Outcome::Failed.as_flag(), 0);
        assert!(Outcome::Failed < Outcome::Passed);
        assert_eq!(Outcome::Passed.to_string(), "1");
    }
}
