//! Offline CSV / JSON conversion.

use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde_json::{Map, Number, Value};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("CSV file is empty")]
    EmptyCsv,
    #[error("Failed to parse CSV row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to parse JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("JSON input must be an array of objects")]
    NotAnArrayOfObjects,
    #[error("Failed to write CSV: {0}")]
    Write(String),
}

/// Guesses the JSON type of a CSV cell: integers, floats and booleans are
/// typed, everything else stays a string.
fn infer_value(cell: &str) -> Value {
    if let Ok(i) = cell.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = cell.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    match cell {
        "true" | "TRUE" | "True" => Value::Bool(true),
        "false" | "FALSE" | "False" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

pub fn csv_to_json(input: &str) -> Result<Vec<Map<String, Value>>, ConvertError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input.as_bytes());
    let headers = reader
        .headers()
        .map_err(|source| ConvertError::Csv { row: 0, source })?
        .clone();
    if headers.is_empty() {
        return Err(ConvertError::EmptyCsv);
    }
    reader
        .records()
        .enumerate()
        .map(|(index, record)| {
            let record = record.map_err(|source| ConvertError::Csv {
                row: index + 1,
                source,
            })?;
            // zip stops at the shorter side, so short rows give fewer keys
            Ok(headers
                .iter()
                .zip(record.iter())
                .map(|(key, cell)| (key.to_string(), infer_value(cell)))
                .collect())
        })
        .collect()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

pub fn json_to_csv(input: &str) -> Result<String, ConvertError> {
    let value: Value = serde_json::from_str(input).map_err(ConvertError::Json)?;
    let rows = match value {
        Value::Array(rows) => rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                _ => Err(ConvertError::NotAnArrayOfObjects),
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(ConvertError::NotAnArrayOfObjects),
    };
    let headers: BTreeSet<&String> = rows.iter().flat_map(|row| row.keys()).collect();

    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    let write_err = |e: csv::Error| ConvertError::Write(e.to_string());
    writer.write_record(headers.iter()).map_err(write_err)?;
    for row in &rows {
        let record = headers
            .iter()
            .map(|key| row.get(*key).map(cell_text).unwrap_or_default());
        writer.write_record(record).map_err(write_err)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ConvertError::Write(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ConvertError::Write(e.to_string()))
}
