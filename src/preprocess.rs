use crate::dataset::Outcome;
use crate::error::{Result, SweepError};
use classweep_helpers::{DataPoint, stack_features};
use ndarray::{Array1, ArrayView1, Axis};

/// Standardises features to zero mean and unit variance.
///
/// Statistics come from the training points only. Columns without variance
/// are centred but left unscaled.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(points: &[DataPoint<Outcome, f64>]) -> Result<Self> {
        let records = stack_features(points).ok_or_else(|| {
            SweepError::MalformedInput("cannot fit a scaler on empty or ragged features".into())
        })?;
        let mean = records
            .mean_axis(Axis(0))
            .ok_or_else(|| SweepError::MalformedInput("no rows to scale".into()))?;
        let scale = records
            .var_axis(Axis(0), 0.0)
            .mapv(|v| if v > 0.0 { v.sqrt() } else { 1.0 });
        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> ArrayView1<'_, f64> {
        self.mean.view()
    }

    pub fn scale(&self) -> ArrayView1<'_, f64> {
        self.scale.view()
    }

    pub fn transform_features(&self, features: ArrayView1<f64>) -> Array1<f64> {
        (&features - &self.mean) / &self.scale
    }

    pub fn transform(&self, points: &[DataPoint<Outcome, f64>]) -> Vec<DataPoint<Outcome, f64>> {
        points
            .iter()
            .map(|dp| DataPoint::new(self.transform_features(dp.view()), dp.label))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn points(rows: &[[f64; 2]]) -> Vec<DataPoint<Outcome, f64>> {
        rows.iter()
            .map(|r| DataPoint::new(array![r[0], r[1]], Outcome::Passed))
            .collect()
    }

    #[test]
    fn test_training_statistics() {
        let train = points(&[[1.0, 10.0], [3.0, 10.0]]);
        let scaler = StandardScaler::fit(&train).unwrap();
        assert_abs_diff_eq!(scaler.mean(), array![2.0, 10.0].view());
        // Second column has no variance and keeps unit scale.
        assert_abs_diff_eq!(scaler.scale(), array![1.0, 1.0].view());

        let scaled = scaler.transform(&train);
        assert_abs_diff_eq!(scaled[0].features, array![-1.0, 0.0]);
        assert_abs_diff_eq!(scaled[1].features, array![1.0, 0.0]);
    }

    #[test]
    fn test_evaluation_uses_training_statistics() {
        let scaler = StandardScaler::fit(&points(&[[0.0, 0.0], [4.0, 2.0]])).unwrap();
        let out = scaler.transform_features(array![6.0, 1.0].view());
        assert_abs_diff_eq!(out, array![2.0, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_empty_is_rejected() {
        assert!(matches!(
            StandardScaler::fit(&[]),
            Err(SweepError::MalformedInput(_))
        ));
    }
}
