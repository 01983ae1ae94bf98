use ndarray::{NdFloat, ScalarOperand};

use num_traits::{AsPrimitive, FromPrimitive, NumCast, Signed};
use rand::distr::uniform::SampleUniform;

use std::iter::Sum;
use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

mod common;
mod distance;
mod labels;

pub use common::{stack_features, DataPoint};
pub use distance::{Distance, L1Dist, L2Dist, LInfDist, LpDist};
pub use labels::{class_counts, group_by_class, majority_label, sorted_classes, Label};

/// Floating point scalar accepted by every algorithm in the workspace.
pub trait Float:
    NdFloat
    + FromPrimitive
    + Default
    + Signed
    + Sum
    + AsPrimitive<usize>
    + for<'a> AddAssign<&'a Self>
    + for<'a> MulAssign<&'a Self>
    + for<'a> SubAssign<&'a Self>
    + for<'a> DivAssign<&'a Self>
    + num_traits::MulAdd<Output = Self>
    + SampleUniform
    + ScalarOperand
    + std::marker::Unpin
{
    fn cast<T: NumCast>(x: T) -> Option<Self> {
        NumCast::from(x)
    }

    /// Converts a count into the float type. Every `usize` a dataset can hold
    /// is representable (possibly rounded) in `f32` and `f64`.
    fn from_count(n: usize) -> Self {
        Self::from_usize(n).unwrap_or_else(Self::max_value)
    }
}

impl Float for f32 {}

impl Float for f64 {}
