use classweep::split::{evaluation_size, split_indices};
use classweep::{Dataset, Example, Outcome, split};
use proptest::prelude::*;

fn dataset_strategy() -> impl Strategy<Value = Dataset> {
    prop::collection::vec((0.0..100.0f64, 0.0..50.0f64, any::<bool>()), 2..40).prop_map(|rows| {
        let examples = rows
            .into_iter()
            .map(|(hours, attended, passed)| Example {
                hours_studied: hours,
                classes_attended: attended,
                passed: if passed { Outcome::Passed } else { Outcome::Failed },
            })
            .collect();
        Dataset::from_examples(examples).unwrap()
    })
}

fn sort_key(ex: &Example) -> (u64, u64, Outcome) {
    (ex.hours_studied.to_bits(), ex.classes_attended.to_bits(), ex.passed)
}

proptest! {
    #[test]
    fn split_partitions_the_indices(n in 2usize..200, fraction in 0.01f64..0.99, seed in any::<u64>()) {
        let (training, evaluation) = split_indices(n, fraction, seed).unwrap();
        prop_assert_eq!(evaluation.len(), evaluation_size(n, fraction));
        prop_assert!(!training.is_empty());
        prop_assert!(!evaluation.is_empty());

        let mut all: Vec<usize> = training.iter().chain(&evaluation).copied().collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn split_keeps_every_example(data in dataset_strategy(), fraction in 0.05f64..0.95, seed in any::<u64>()) {
        let s = split(&data, fraction, seed).unwrap();
        let mut original: Vec<_> = data.iter().map(sort_key).collect();
        let mut rejoined: Vec<_> = s.training.iter().chain(s.evaluation.iter()).map(sort_key).collect();
        original.sort_unstable();
        rejoined.sort_unstable();
        prop_assert_eq!(original, rejoined);
    }

    #[test]
    fn split_is_deterministic(data in dataset_strategy(), seed in any::<u64>()) {
        prop_assert_eq!(split(&data, 0.3, seed).unwrap(), split(&data, 0.3, seed).unwrap());
    }

    #[test]
    fn evaluation_size_rounds_half_up(n in 2usize..1000, fraction in 0.001f64..0.999) {
        let size = evaluation_size(n, fraction);
        let exact = fraction * n as f64;
        prop_assert!(size >= 1 && size < n);
        if exact >= 0.5 && exact < n as f64 - 1.5 {
            prop_assert!((size as f64 - exact).abs() <= 0.5 + 1e-9);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn report_rows_never_increase_in_accuracy(seed in any::<u64>(), fraction in 0.2f64..0.5) {
        let s = split(&Dataset::reference(), fraction, seed).unwrap();
        let report = classweep::SweepRunner::new(classweep::SweepConfig {
            classifiers: Some(vec![
                classweep::ModelKind::KNeighbors,
                classweep::ModelKind::GaussianNb,
                classweep::ModelKind::DecisionTree,
                classweep::ModelKind::Dummy,
            ]),
            seed,
            ..Default::default()
        })
        .run(&s.training, &s.evaluation)
        .unwrap();
        for pair in report.rows.windows(2) {
            prop_assert!(pair[0].accuracy >= pair[1].accuracy);
            if pair[0].accuracy == pair[1].accuracy {
                prop_assert!(pair[0].balanced_accuracy >= pair[1].balanced_accuracy);
            }
        }
    }
}
