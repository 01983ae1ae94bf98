use crate::{Float, Label};
use ndarray::{Array1, Array2, ArrayView1};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// Represents a single data point with features and a label.
///
/// L: The type of the label (e.g., String, i32, enum).
/// F: The float type for the features (e.g., f32, f64).
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint<L, F>
where
    L: Label,
    F: Float,
{
    pub features: Array1<F>,
    pub label: L,
}

impl<L, F> DataPoint<L, F>
where
    L: Label,
    F: Float,
{
    pub fn new(features: Array1<F>, label: L) -> Self {
        DataPoint { features, label }
    }

    pub fn view(&self) -> ArrayView1<'_, F> {
        self.features.view()
    }

    pub fn n_features(&self) -> usize {
        self.features.len()
    }
}

/// Stacks the feature vectors of `data` into a `(n_samples, n_features)` matrix.
///
/// Returns `None` if `data` is empty or the points disagree on dimensionality.
pub fn stack_features<L, F>(data: &[DataPoint<L, F>]) -> Option<Array2<F>>
where
    L: Label,
    F: Float,
{
    let n_features = data.first()?.n_features();
    if data.iter().any(|dp| dp.n_features() != n_features) {
        return None;
    }
    let mut records = Array2::zeros((data.len(), n_features));
    for (mut row, dp) in records.rows_mut().into_iter().zip(data) {
        row.assign(&dp.features);
    }
    Some(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn stacks_rows_in_order() {
        let data = vec![
            DataPoint::new(array![1.0, 2.0], 0u8),
            DataPoint::new(array![3.0, 4.0], 1u8),
        ];
        let records = stack_features(&data).unwrap();
        assert_eq!(records, array![[1.0, 2.0], [3.0, 4.0]]);
    }

    #[test]
    fn rejects_ragged_rows() {
        let data = vec![
            DataPoint::new(array![1.0, 2.0], 0u8),
            DataPoint::new(array![3.0], 1u8),
        ];
        assert!(stack_features(&data).is_none());
        assert!(stack_features::<u8, f64>(&[]).is_none());
    }
}
