use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DecodedRow, FieldValue, is_numeric_column};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Decode a metrics file into loosely-typed rows.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one observation per line (recommended)
/// * `.json`    – `[{ "experiment_id": ..., "metric_name": ..., "step": ..., "value": ... }, ...]`
/// * `.parquet` – flat columns with the same names
///
/// Every format applies the same column rule: `step` and `value` become
/// numbers when they parse, every other column is trimmed text.
pub fn load_file(path: &Path) -> Result<Vec<DecodedRow>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" | "txt" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Apply the column-to-type rule to one raw cell.
pub fn typed_cell(column: &str, raw: FieldValue) -> FieldValue {
    if is_numeric_column(column) {
        match raw {
            FieldValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if !s.trim().is_empty() => FieldValue::Number(v),
                _ => FieldValue::Text(s),
            },
            other => other,
        }
    } else {
        match raw {
            FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
            FieldValue::Number(v) => FieldValue::Text(v.to_string()),
            FieldValue::Null => FieldValue::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<DecodedRow>> {
    let file = std::fs::File::open(path).context("opening CSV")?;
    decode_csv_reader(file)
}

/// Decode CSV text (header row required). Blank lines are skipped; a row
/// with the wrong number of fields is a decode error.
pub fn decode_csv(text: &str) -> Result<Vec<DecodedRow>> {
    decode_csv_reader(text.as_bytes())
}

fn decode_csv_reader<R: Read>(source: R) -> Result<Vec<DecodedRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", row_no + 1))?;

        let mut row = DecodedRow::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                continue;
            };
            row.insert(
                col_name.clone(),
                typed_cell(col_name, FieldValue::Text(value.to_string())),
            );
        }
        rows.push(row);
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "experiment_id": "run_1", "metric_name": "loss", "step": 0, "value": 0.93 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Vec<DecodedRow>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    decode_json(&text)
}

pub fn decode_json(text: &str) -> Result<Vec<DecodedRow>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {} is not a JSON object", i + 1))?;

        let row = obj
            .iter()
            .map(|(key, val)| (key.clone(), typed_cell(key, json_to_field(val))))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_f64() {
            Some(v) => FieldValue::Number(v),
            None => FieldValue::Text(n.to_string()),
        },
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one observation per row.
///
/// Expected schema: `experiment_id` / `metric_name` as Utf8, `step` as an
/// integer column and `value` as a float column. Other columns are carried
/// through untouched and ignored downstream.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Vec<DecodedRow>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row_idx in 0..batch.num_rows() {
            let mut row = DecodedRow::new();
            for (col_idx, col_name) in &columns {
                let raw = extract_field_value(batch.column(*col_idx), row_idx)
                    .with_context(|| format!("Row {}: column '{col_name}'", rows.len() + 1))?;
                row.insert(col_name.clone(), typed_cell(col_name, raw));
            }
            rows.push(row);
        }
    }

    Ok(rows)
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> Result<FieldValue> {
    if col.is_null(row) {
        return Ok(FieldValue::Null);
    }
    let value = match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            FieldValue::Text(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => FieldValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            FieldValue::Number(f64::from(arr.value(row)))
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            FieldValue::Number(arr.value(row) as f64)
        }
        DataType::UInt32 => {
            let arr = col
                .as_any()
                .downcast_ref::<UInt32Array>()
                .context("expected UInt32Array")?;
            FieldValue::Number(f64::from(arr.value(row)))
        }
        DataType::UInt64 => {
            let arr = col
                .as_any()
                .downcast_ref::<UInt64Array>()
                .context("expected UInt64Array")?;
            FieldValue::Number(arr.value(row) as f64)
        }
        DataType::Float32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            FieldValue::Number(f64::from(arr.value(row)))
        }
        DataType::Float64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            FieldValue::Number(arr.value(row))
        }
        DataType::Boolean => {
            let arr = col
                .as_any()
                .downcast_ref::<BooleanArray>()
                .context("expected BooleanArray")?;
            FieldValue::Text(arr.value(row).to_string())
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(value)
}
