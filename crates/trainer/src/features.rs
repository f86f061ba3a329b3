//! Feature/target selection

use turnout_core::{Dataset, PipelineError, Result};

/// Split a cleaned, encoded dataset into a feature table and target vector.
///
/// The target column and every `drop` column are removed from the features.
/// Row order is preserved, so `X` and `y` stay aligned.
pub fn select_features<S: AsRef<str>>(
    dataset: &Dataset,
    target: &str,
    drop: &[S],
) -> Result<(Dataset, Vec<f64>)> {
    let targets = dataset
        .column(target)?
        .into_iter()
        .enumerate()
        .map(|(row, value)| {
            value
                .as_f64()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    PipelineError::Training(format!(
                        "Target column '{}' row {}: non-numeric value {:?}",
                        target, row, value
                    ))
                })
        })
        .collect::<Result<Vec<f64>>>()?;

    let mut removed: Vec<&str> = Vec::with_capacity(drop.len() + 1);
    removed.push(target);
    for name in drop {
        let name = name.as_ref();
        if !removed.contains(&name) {
            removed.push(name);
        }
    }

    let features = dataset.drop_columns(&removed)?;
    Ok((features, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnout_core::Value;

    fn sessions() -> Dataset {
        Dataset::from_rows(
            vec![
                "Participants".into(),
                "Date".into(),
                "Instructor".into(),
                "Time".into(),
                "Session_Type".into(),
            ],
            vec![
                vec![
                    Value::Int(12),
                    "2024-03-01".into(),
                    "Perera".into(),
                    Value::Int(510),
                    Value::Int(1),
                ],
                vec![
                    Value::Int(8),
                    "2024-03-02".into(),
                    "Silva".into(),
                    Value::Int(780),
                    Value::Int(0),
                ],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_select_features() {
        let (x, y) = select_features(&sessions(), "Participants", &["Date", "Instructor"]).unwrap();
        assert_eq!(x.columns(), &["Time".to_string(), "Session_Type".to_string()]);
        assert_eq!(x.len(), y.len());
        assert_eq!(y, vec![12.0, 8.0]);
    }

    #[test]
    fn test_missing_drop_column() {
        let err = select_features(&sessions(), "Participants", &["Weather"]).unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(c) if c == "Weather"));
    }

    #[test]
    fn test_non_numeric_target() {
        let err = select_features(&sessions(), "Instructor", &["Date"]).unwrap_err();
        assert!(matches!(err, PipelineError::Training(_)));
    }

    #[test]
    fn test_target_listed_in_drop() {
        let (x, _) =
            select_features(&sessions(), "Participants", &["Participants", "Date", "Instructor"])
                .unwrap();
        assert_eq!(x.width(), 2);
    }
}
