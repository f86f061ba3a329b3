//! Label encoding of a categorical column
//!
//! Distinct values are sorted (numbers numerically, text lexicographically)
//! and assigned codes `0..k`. The resulting [`EncodingTable`] is fitted
//! once on the full column and reused for every later transform, so a
//! value always maps to the same code within a run.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use turnout_core::{Dataset, PipelineError, Result, Value};

/// Mapping from a column's categories to dense integer codes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingTable {
    column: String,
    /// Sorted distinct values; a category's code is its index
    categories: Vec<Value>,
}

impl EncodingTable {
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn categories(&self) -> &[Value] {
        &self.categories
    }

    /// Number of distinct categories
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Code for a single value
    pub fn encode(&self, value: &Value) -> Result<i64> {
        if value.is_missing() {
            return Err(self.missing_error(None));
        }
        self.categories
            .binary_search_by(|known| category_cmp(known, value))
            .map(|idx| idx as i64)
            .map_err(|_| PipelineError::UnknownCategory {
                column: self.column.clone(),
                value: value.to_string(),
            })
    }

    /// Category for a code
    pub fn decode(&self, code: i64) -> Option<&Value> {
        usize::try_from(code).ok().and_then(|idx| self.categories.get(idx))
    }

    /// New dataset with the encoded column replaced by its codes
    pub fn transform(&self, dataset: &Dataset) -> Result<Dataset> {
        dataset.map_column(&self.column, |row, value| {
            if value.is_missing() {
                return Err(self.missing_error(Some(row)));
            }
            self.encode(value).map(Value::Int)
        })
    }

    fn missing_error(&self, row: Option<usize>) -> PipelineError {
        let at = row.map(|r| format!(" at row {}", r)).unwrap_or_default();
        PipelineError::Parse(format!(
            "Missing value in categorical column '{}'{}",
            self.column, at
        ))
    }
}

/// Fits [`EncodingTable`]s
pub struct LabelEncoder;

impl LabelEncoder {
    /// Collect and order the distinct values of `column`
    pub fn fit(dataset: &Dataset, column: &str) -> Result<EncodingTable> {
        let mut categories = Vec::new();
        for (row, value) in dataset.column(column)?.into_iter().enumerate() {
            if value.is_missing() {
                return Err(PipelineError::Parse(format!(
                    "Missing value in categorical column '{}' at row {}",
                    column, row
                )));
            }
            categories.push(value.clone());
        }

        categories.sort_by(category_cmp);
        categories.dedup_by(|a, b| category_cmp(a, b) == Ordering::Equal);

        tracing::debug!(
            "Encoded '{}' with {} categories: {:?}",
            column,
            categories.len(),
            categories
        );

        Ok(EncodingTable {
            column: column.to_string(),
            categories,
        })
    }

    /// Fit on `column` and encode it in one step
    pub fn fit_transform(dataset: &Dataset, column: &str) -> Result<(Dataset, EncodingTable)> {
        let table = Self::fit(dataset, column)?;
        let encoded = table.transform(dataset)?;
        Ok((encoded, table))
    }
}

/// Total order over categories: numbers first (numerically), then text
fn category_cmp(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.to_string().cmp(&b.to_string()),
    }
}
