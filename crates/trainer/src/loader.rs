//! CSV dataset loading
//!
//! Reads a headed CSV file into a [`Dataset`]. Column types are inferred
//! over all non-empty cells of a column: integers stay `Int`, any other
//! numeric column becomes `Float`, everything else is `Text`. Empty cells
//! load as `Missing`.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use turnout_core::{Dataset, PipelineError, Result, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int,
    Float,
    Text,
}

/// Load a dataset from a CSV file on disk
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => PipelineError::DatasetNotFound(path.to_path_buf()),
        _ => PipelineError::Io(err),
    })?;

    let dataset = read_csv(file)?;
    tracing::info!(
        "Loaded {} rows and {} columns from {}",
        dataset.len(),
        dataset.width(),
        path.display()
    );
    Ok(dataset)
}

/// Parse CSV content from any reader
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| PipelineError::Parse(format!("Cannot read header row: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    validate_headers(&headers)?;

    let mut raw_rows: Vec<Vec<String>> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record =
            record.map_err(|e| PipelineError::Parse(format!("Line {}: {}", idx + 2, e)))?;
        raw_rows.push(record.iter().map(str::to_string).collect());
    }

    let kinds: Vec<ColumnKind> = (0..headers.len())
        .map(|col| infer_kind(raw_rows.iter().map(|row| row[col].as_str())))
        .collect();

    for (name, kind) in headers.iter().zip(&kinds) {
        tracing::debug!("Column '{}' inferred as {:?}", name, kind);
    }

    let rows = raw_rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .zip(&kinds)
                .map(|(cell, kind)| convert_cell(cell, *kind))
                .collect()
        })
        .collect();

    Dataset::from_rows(headers, rows)
}

fn validate_headers(headers: &[String]) -> Result<()> {
    if headers.is_empty() {
        return Err(PipelineError::Parse("Missing header row".to_string()));
    }

    let mut seen = HashSet::with_capacity(headers.len());
    for (idx, name) in headers.iter().enumerate() {
        if name.is_empty() {
            return Err(PipelineError::Parse(format!(
                "Header column {} has no name",
                idx + 1
            )));
        }
        if !seen.insert(name.as_str()) {
            return Err(PipelineError::Parse(format!("Duplicate column name '{}'", name)));
        }
    }

    Ok(())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut kind = ColumnKind::Int;
    let mut seen_value = false;

    for cell in cells.filter(|c| !c.is_empty()) {
        seen_value = true;
        if kind == ColumnKind::Int && cell.parse::<i64>().is_err() {
            kind = ColumnKind::Float;
        }
        if kind == ColumnKind::Float && !is_finite_number(cell) {
            return ColumnKind::Text;
        }
    }

    if seen_value {
        kind
    } else {
        ColumnKind::Text
    }
}

/// `NaN`/`inf` spellings parse as floats but are labels, not measurements
fn is_finite_number(cell: &str) -> bool {
    cell.parse::<f64>().is_ok_and(f64::is_finite)
}

fn convert_cell(cell: String, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Missing;
    }

    // Kinds were inferred from these same cells, so the parses succeed
    match kind {
        ColumnKind::Int => cell.parse().map(Value::Int).unwrap_or(Value::Text(cell)),
        ColumnKind::Float => cell.parse().map(Value::Float).unwrap_or(Value::Text(cell)),
        ColumnKind::Text => Value::Text(cell),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> anyhow::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "Participants,Time,Weather,Temperature")?;
        writeln!(file, "12,08:30,Sunny,21.5")?;
        writeln!(file, "7,10:00,Rainy,17")?;
        writeln!(file, "9,,Cloudy,")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_csv() -> anyhow::Result<()> {
        let file = create_test_csv()?;
        let dataset = load_csv(file.path())?;

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.width(), 4);
        assert_eq!(dataset.columns()[1], "Time");
        assert_eq!(
            dataset.rows()[0],
            vec![
                Value::Int(12),
                Value::from("08:30"),
                Value::from("Sunny"),
                Value::Float(21.5)
            ]
        );
        // Mixed integer/decimal column is promoted to float
        assert_eq!(dataset.rows()[1][3], Value::Float(17.0));
        assert_eq!(dataset.rows()[2][1], Value::Missing);
        assert_eq!(dataset.rows()[2][3], Value::Missing);

        Ok(())
    }

    #[test]
    fn test_non_finite_spellings_stay_text() {
        let content = "Participants,Weather,Rate\n1,NaN,0.5\n2,nan,1\n3,inf,1e400\n";
        let dataset = read_csv(content.as_bytes()).unwrap();

        let weather: Vec<&Value> = dataset.column("Weather").unwrap();
        assert_eq!(
            weather,
            vec![&Value::from("NaN"), &Value::from("nan"), &Value::from("inf")]
        );
        // overflowing literal is not a usable number either
        assert_eq!(dataset.rows()[2][2], Value::from("1e400"));
        assert_eq!(dataset.rows()[0][2], Value::from("0.5"));
    }

    #[test]
    fn test_missing_file() {
        let err = load_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, PipelineError::DatasetNotFound(_)));
    }

    #[test]
    fn test_ragged_row_is_parse_error() {
        let content = "a,b\n1,2\n3\n";
        let err = read_csv(content.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(msg) if msg.contains("Line 3")));
    }

    #[test]
    fn test_header_problems() {
        assert!(matches!(read_csv("".as_bytes()), Err(PipelineError::Parse(_))));
        assert!(matches!(
            read_csv("a,a\n1,2\n".as_bytes()),
            Err(PipelineError::Parse(msg)) if msg.contains("Duplicate")
        ));
        assert!(matches!(
            read_csv("a,,c\n1,2,3\n".as_bytes()),
            Err(PipelineError::Parse(_))
        ));
    }

    #[test]
    fn test_header_only_file_is_empty_dataset() -> anyhow::Result<()> {
        let dataset = read_csv("Participants,Time\n".as_bytes())?;
        assert!(dataset.is_empty());
        assert_eq!(dataset.width(), 2);
        Ok(())
    }

    #[test]
    fn test_infer_kind() {
        assert_eq!(infer_kind(["1", "2", ""].into_iter()), ColumnKind::Int);
        assert_eq!(infer_kind(["1", "2.5"].into_iter()), ColumnKind::Float);
        assert_eq!(infer_kind(["1", "x"].into_iter()), ColumnKind::Text);
        assert_eq!(infer_kind(["", ""].into_iter()), ColumnKind::Text);
    }
}
