use super::model::{DecodedRow, EXPERIMENT_ID, FieldValue, METRIC_NAME, RawRow, STEP, VALUE};

/// Largest step accepted; beyond this an `f64` no longer holds every integer.
const MAX_STEP: f64 = 9_007_199_254_740_992.0;

/// Coerce a cell to a step: a whole, non-negative number.
pub fn coerce_step(cell: &FieldValue) -> Option<u64> {
    let v = cell.as_f64()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= MAX_STEP {
        Some(v as u64)
    } else {
        None
    }
}

/// Coerce a cell to a finite value.
pub fn coerce_value(cell: &FieldValue) -> Option<f64> {
    cell.as_f64().filter(|v| v.is_finite())
}

fn coerce_label(row: &DecodedRow, column: &str) -> Option<String> {
    let text = match row.get(column)? {
        FieldValue::Text(s) => s.trim().to_string(),
        FieldValue::Number(v) => v.to_string(),
        FieldValue::Null => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Coerce one decoded row, or `None` when any field fails.
pub fn parse_row(row: &DecodedRow) -> Option<RawRow> {
    Some(RawRow {
        experiment_id: coerce_label(row, EXPERIMENT_ID)?,
        metric_name: coerce_label(row, METRIC_NAME)?,
        step: coerce_step(row.get(STEP)?)?,
        value: coerce_value(row.get(VALUE)?)?,
    })
}

/// Coerce decoded rows into [`RawRow`]s, silently dropping rows that fail.
/// Input order is preserved. An empty result is the caller's
/// "no valid data" case.
pub fn parse_rows(rows: &[DecodedRow]) -> Vec<RawRow> {
    let parsed: Vec<RawRow> = rows.iter().filter_map(parse_row).collect();
    let dropped = rows.len() - parsed.len();
    if dropped > 0 {
        log::debug!("parser dropped {dropped} of {} rows", rows.len());
    }
    parsed
}
