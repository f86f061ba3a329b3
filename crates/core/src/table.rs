//! In-memory tabular dataset
//!
//! A [`Dataset`] is an ordered list of column names plus row-major cells.
//! Every transformation returns a fresh dataset; nothing is mutated behind
//! the caller's back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{PipelineError, Result};

/// A single scalar cell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Numeric view of the cell, if it holds a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(_) | Value::Missing => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Bit pattern used for equality and hashing; folds -0.0 into 0.0 and
    /// every NaN into one canonical NaN.
    fn float_key(v: f64) -> u64 {
        if v == 0.0 {
            0
        } else if v.is_nan() {
            f64::NAN.to_bits()
        } else {
            v.to_bits()
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => Self::float_key(*a) == Self::float_key(*b),
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::Missing, Value::Missing) => true,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Int(v) => v.hash(state),
            Value::Float(v) => Self::float_key(*v).hash(state),
            Value::Text(s) => s.hash(state),
            Value::Missing => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// Ordered rows keyed by column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    /// Create an empty dataset with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a dataset, checking that every row matches the column count
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut dataset = Self::new(columns);
        dataset.rows.reserve(rows.len());
        for row in rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(PipelineError::Parse(format!(
                "Row {}: expected {} values, got {}",
                self.rows.len() + 1,
                self.columns.len(),
                row.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row(&self, idx: usize) -> Option<&[Value]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Column index, or `ColumnNotFound`
    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| PipelineError::ColumnNotFound(name.to_string()))
    }

    /// All cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&Value>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// New dataset holding the given rows in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Dataset {
        let rows = indices
            .iter()
            .filter_map(|&i| self.rows.get(i).cloned())
            .collect();
        Dataset {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// New dataset without the named columns
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut dropped = Vec::with_capacity(names.len());
        for name in names {
            dropped.push(self.require_column(name.as_ref())?);
        }

        let keep: Vec<usize> = (0..self.width()).filter(|i| !dropped.contains(i)).collect();
        let columns = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(Dataset { columns, rows })
    }

    /// New dataset with one column rewritten cell by cell.
    ///
    /// The closure receives the row index and the current cell.
    pub fn map_column<F>(&self, name: &str, mut f: F) -> Result<Dataset>
    where
        F: FnMut(usize, &Value) -> Result<Value>,
    {
        let idx = self.require_column(name)?;
        let mut rows = Vec::with_capacity(self.rows.len());
        for (row_idx, row) in self.rows.iter().enumerate() {
            let mut new_row = row.clone();
            new_row[idx] = f(row_idx, &row[idx])?;
            rows.push(new_row);
        }
        Ok(Dataset {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Dense numeric matrix for model consumption.
    ///
    /// Fails with `Training` on text, missing or non-finite cells, which is
    /// what an unencoded categorical column produces.
    pub fn to_matrix(&self) -> Result<Vec<Vec<f64>>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row_idx, row)| {
                row.iter()
                    .enumerate()
                    .map(|(col_idx, value)| match value.as_f64() {
                        Some(v) if v.is_finite() => Ok(v),
                        _ => Err(PipelineError::Training(format!(
                            "Column '{}' row {}: non-numeric value {:?}",
                            self.columns[col_idx], row_idx, value
                        ))),
                    })
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn sample() -> Dataset {
        Dataset::from_rows(
            vec!["Participants".into(), "Time".into(), "Weather".into()],
            vec![
                vec![Value::Int(12), "08:30".into(), "Sunny".into()],
                vec![Value::Int(7), "10:00".into(), "Rainy".into()],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_rows_rejects_ragged_row() {
        let err = Dataset::from_rows(vec!["a".into(), "b".into()], vec![vec![Value::Int(1)]]);
        assert!(matches!(err, Err(PipelineError::Parse(_))));
    }

    #[test]
    fn test_drop_columns() {
        let ds = sample().drop_columns(&["Time"]).unwrap();
        assert_eq!(ds.columns(), &["Participants".to_string(), "Weather".to_string()]);
        assert_eq!(ds.row(1).unwrap(), &[Value::Int(7), Value::from("Rainy")]);

        let missing = sample().drop_columns(&["Date"]);
        assert!(matches!(missing, Err(PipelineError::ColumnNotFound(c)) if c == "Date"));
    }

    #[test]
    fn test_map_column_returns_new_dataset() {
        let original = sample();
        let mapped = original
            .map_column("Participants", |_, v| Ok(Value::Float(v.as_f64().unwrap() * 2.0)))
            .unwrap();
        assert_eq!(mapped.rows()[0][0], Value::Float(24.0));
        assert_eq!(original.rows()[0][0], Value::Int(12));
    }

    #[test]
    fn test_to_matrix_rejects_text() {
        let err = sample().to_matrix().unwrap_err();
        assert!(matches!(err, PipelineError::Training(msg) if msg.contains("Time")));

        let numeric = sample().drop_columns(&["Time", "Weather"]).unwrap();
        assert_eq!(numeric.to_matrix().unwrap(), vec![vec![12.0], vec![7.0]]);
    }

    #[test]
    fn test_value_equality_and_hash() {
        assert_eq!(Value::Float(0.0), Value::Float(-0.0));
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Int(1), Value::Float(1.0));

        let set: HashSet<Value> = [Value::Float(0.0), Value::Float(-0.0), Value::Missing]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_select_rows() {
        let ds = sample().select_rows(&[1, 0, 1]);
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.rows()[0][0], Value::Int(7));
        assert_eq!(ds.rows()[2][0], Value::Int(7));
    }
}
