//! Duplicate removal and time-of-day conversion

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use turnout_core::{Dataset, PipelineError, Result, Value};

/// Strict wall-clock format accepted in time columns
pub const TIME_FORMAT: &str = "%H:%M";

/// Numeric representation a time-of-day column is converted into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// `hour * 60 + minute`
    MinutesSinceMidnight,
    /// `hour`, minutes discarded
    HourOfDay,
}

/// A time-of-day column and how to convert it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeColumn {
    pub name: String,
    pub unit: TimeUnit,
    /// When false an absent column is skipped instead of reported
    pub required: bool,
}

impl TimeColumn {
    pub fn new(name: impl Into<String>, unit: TimeUnit, required: bool) -> Self {
        Self {
            name: name.into(),
            unit,
            required,
        }
    }
}

/// Remove exact-duplicate rows, keeping the first occurrence of each
pub fn drop_duplicates(dataset: &Dataset) -> Dataset {
    let mut seen: HashSet<&[Value]> = HashSet::with_capacity(dataset.len());
    let keep: Vec<usize> = dataset
        .rows()
        .iter()
        .enumerate()
        .filter(|&(_, row)| seen.insert(row.as_slice()))
        .map(|(idx, _)| idx)
        .collect();

    let removed = dataset.len() - keep.len();
    if removed > 0 {
        tracing::debug!("Dropped {} duplicate rows", removed);
    }

    dataset.select_rows(&keep)
}

/// Parse an `HH:MM` string into the requested unit
pub fn parse_time_of_day(raw: &str, unit: TimeUnit) -> Option<i64> {
    let time = NaiveTime::parse_from_str(raw, TIME_FORMAT).ok()?;
    Some(match unit {
        TimeUnit::MinutesSinceMidnight => i64::from(time.hour() * 60 + time.minute()),
        TimeUnit::HourOfDay => i64::from(time.hour()),
    })
}

/// Replace a time-of-day column with its integer offset.
///
/// An absent column is a no-op unless `time.required` is set.
pub fn convert_time(dataset: &Dataset, time: &TimeColumn) -> Result<Dataset> {
    if !dataset.has_column(&time.name) {
        if time.required {
            return Err(PipelineError::ColumnNotFound(time.name.clone()));
        }
        tracing::debug!("No '{}' column, skipping time conversion", time.name);
        return Ok(dataset.clone());
    }

    dataset.map_column(&time.name, |row, value| {
        value
            .as_str()
            .and_then(|raw| parse_time_of_day(raw, time.unit))
            .map(Value::Int)
            .ok_or_else(|| PipelineError::TimeParse {
                column: time.name.clone(),
                row,
                value: value.to_string(),
            })
    })
}

/// De-duplicate, then convert the time column if one is configured
pub fn clean(dataset: &Dataset, time: Option<&TimeColumn>) -> Result<Dataset> {
    let deduped = drop_duplicates(dataset);
    match time {
        Some(time) => convert_time(&deduped, time),
        None => Ok(deduped),
    }
}
