use proptest::prelude::*;
use std::collections::HashSet;
use turnout_core::{Dataset, Value};
use turnout_trainer::splitter::test_size;
use turnout_trainer::{drop_duplicates, train_test_split, LabelEncoder};

// Property-based tests for the cleaning, encoding and splitting stages

fn arbitrary_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (0i64..5).prop_map(Value::Int),
        prop::sample::select(vec!["Sunny", "Rainy", "Cloudy"]).prop_map(Value::from),
    ]
}

fn arbitrary_dataset() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(prop::collection::vec(arbitrary_value(), 3), 0..60).prop_map(|rows| {
        Dataset::from_rows(vec!["a".into(), "b".into(), "c".into()], rows)
            .expect("rows have three cells")
    })
}

proptest! {
    #[test]
    fn dedupe_leaves_no_duplicates_and_is_idempotent(dataset in arbitrary_dataset()) {
        let once = drop_duplicates(&dataset);
        let distinct: HashSet<&[Value]> = once.rows().iter().map(Vec::as_slice).collect();
        prop_assert_eq!(distinct.len(), once.len());
        prop_assert!(once.len() <= dataset.len());

        let twice = drop_duplicates(&once);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn encoder_codes_are_dense_and_consistent(dataset in arbitrary_dataset()) {
        prop_assume!(!dataset.is_empty());

        let (encoded, table) = LabelEncoder::fit_transform(&dataset, "b").unwrap();
        let distinct: HashSet<&Value> = dataset.column("b").unwrap().into_iter().collect();
        prop_assert_eq!(table.len(), distinct.len());

        for (original, code) in dataset
            .column("b")
            .unwrap()
            .into_iter()
            .zip(encoded.column("b").unwrap())
        {
            let code = match code {
                Value::Int(c) => *c,
                other => return Err(TestCaseError::fail(format!("non-integer code {:?}", other))),
            };
            prop_assert!(code >= 0 && (code as usize) < table.len());
            prop_assert_eq!(table.decode(code), Some(original));
        }
    }

    #[test]
    fn split_partitions_every_row(
        n in 0usize..200,
        fraction in 0.05f64..0.95,
        seed in any::<u64>(),
    ) {
        let rows = (0..n).map(|i| vec![Value::Int(i as i64)]).collect();
        let x = Dataset::from_rows(vec!["id".into()], rows).unwrap();
        let y: Vec<f64> = (0..n).map(|i| i as f64).collect();

        let split = train_test_split(&x, &y, fraction, Some(seed)).unwrap();
        prop_assert_eq!(split.x_train.len() + split.x_test.len(), n);
        prop_assert_eq!(split.x_test.len(), test_size(n, fraction));
        prop_assert_eq!(split.y_test.len(), split.x_test.len());

        let mut ids: Vec<f64> = split.y_train.iter().chain(&split.y_test).copied().collect();
        ids.sort_by(f64::total_cmp);
        prop_assert_eq!(ids, y);
    }
}
