use crate::{DataPoint, Float};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;

/// Bounds shared by every class label in the workspace.
///
/// `Ord` gives classes a canonical order, which is how ties between equally
/// frequent classes are settled everywhere.
pub trait Label: Clone + Eq + Hash + Debug + Ord {}

impl<T: Clone + Eq + Hash + Debug + Ord> Label for T {}

/// Groups data indices by their class label.
pub fn group_by_class<L: Label, F: Float>(data: &[DataPoint<L, F>]) -> HashMap<L, Vec<usize>> {
    let mut map: HashMap<L, Vec<usize>> = HashMap::new();
    for (i, dp) in data.iter().enumerate() {
        map.entry(dp.label.clone()).or_default().push(i);
    }
    map
}

/// Counts occurrences of each label, in label order.
pub fn class_counts<'a, L, I>(labels: I) -> BTreeMap<L, usize>
where
    L: Label + 'a,
    I: IntoIterator<Item = &'a L>,
{
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label.clone()).or_insert(0) += 1;
    }
    counts
}

/// Distinct labels in ascending order.
pub fn sorted_classes<'a, L, I>(labels: I) -> Vec<L>
where
    L: Label + 'a,
    I: IntoIterator<Item = &'a L>,
{
    class_counts(labels).into_keys().collect()
}

/// The most frequent label, the smallest one on ties. `None` for no labels.
pub fn majority_label<'a, L, I>(labels: I) -> Option<L>
where
    L: Label + 'a,
    I: IntoIterator<Item = &'a L>,
{
    // BTreeMap iterates ascending; `max_by_key` keeps the last maximum, so
    // walk it in reverse to let the smallest label win.
    class_counts(labels)
        .into_iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(label, _)| label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn majority_prefers_smallest_on_tie() {
        let labels = ["b", "a", "b", "a", "c"];
        assert_eq!(majority_label(labels.iter()), Some("a"));
        assert_eq!(majority_label(["c", "c", "a"].iter()), Some("c"));
        assert_eq!(majority_label::<&str, _>([].iter()), None);
    }

    #[test]
    fn groups_indices_by_label() {
        let data = vec![
            DataPoint::new(array![0.0], 'x'),
            DataPoint::new(array![1.0], 'y'),
            DataPoint::new(array![2.0], 'x'),
        ];
        let groups = group_by_class(&data);
        assert_eq!(groups[&'x'], vec![0, 2]);
        assert_eq!(groups[&'y'], vec![1]);
        assert_eq!(sorted_classes(data.iter().map(|dp| &dp.label)), vec!['x', 'y']);
    }
}
