use std::fmt;

use thiserror::Error;

use super::model::{DecodedRow, EXPERIMENT_ID, METRIC_NAME, REQUIRED_COLUMNS, STEP, VALUE};
use super::parse::{coerce_step, coerce_value};

/// Hard limit on row defects carried by a failed validation, however many
/// rows are broken.
pub const MAX_REPORTED_DEFECTS: usize = 10;

// ---------------------------------------------------------------------------
// Defects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefectKind {
    EmptyExperimentId,
    EmptyMetricName,
    InvalidStep,
    InvalidValue,
}

impl fmt::Display for DefectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefectKind::EmptyExperimentId => write!(f, "experiment_id must be a non-empty string"),
            DefectKind::EmptyMetricName => write!(f, "metric_name must be a non-empty string"),
            DefectKind::InvalidStep => write!(f, "step must be a non-negative integer"),
            DefectKind::InvalidValue => write!(f, "value must be a finite number"),
        }
    }
}

/// One problem found in one row. `row` is 1-indexed (header excluded).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowDefect {
    pub row: usize,
    pub kind: DefectKind,
}

impl fmt::Display for RowDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationFailure {
    #[error("CSV file is empty")]
    EmptyInput,

    /// Required columns absent from the first row, in canonical order.
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// `defects` holds at most [`MAX_REPORTED_DEFECTS`] entries; `total`
    /// counts every defect found.
    #[error("{total} invalid field(s), first: {}", .defects.first().map(ToString::to_string).unwrap_or_default())]
    InvalidRows { defects: Vec<RowDefect>, total: usize },
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Verdict over a decoded row set.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    failure: Option<ValidationFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&ValidationFailure> {
        self.failure.as_ref()
    }

    /// Human-readable defects, at most [`MAX_REPORTED_DEFECTS`] row entries.
    pub fn errors(&self) -> Vec<String> {
        match &self.failure {
            None => Vec::new(),
            Some(ValidationFailure::InvalidRows { defects, .. }) => {
                defects.iter().map(ToString::to_string).collect()
            }
            Some(other) => vec![other.to_string()],
        }
    }

    pub fn into_result(self) -> Result<(), ValidationFailure> {
        match self.failure {
            None => Ok(()),
            Some(failure) => Err(failure),
        }
    }
}

/// Check decoded rows against the required-column contract and per-field
/// constraints. Pure; never drops or edits rows.
///
/// Checks run in order and stop at the first failing stage: empty input,
/// then missing columns (judged on the first row), then per-row fields.
pub fn validate_rows(rows: &[DecodedRow]) -> ValidationReport {
    let Some(first) = rows.first() else {
        return ValidationReport {
            failure: Some(ValidationFailure::EmptyInput),
        };
    };

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !first.contains_key(**col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return ValidationReport {
            failure: Some(ValidationFailure::MissingColumns(missing)),
        };
    }

    let mut defects = Vec::new();
    let mut total = 0usize;
    let mut record = |row: usize, kind: DefectKind| {
        total += 1;
        if defects.len() < MAX_REPORTED_DEFECTS {
            defects.push(RowDefect { row, kind });
        }
    };

    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 1;
        if !is_non_empty_text(row, EXPERIMENT_ID) {
            record(row_no, DefectKind::EmptyExperimentId);
        }
        if !is_non_empty_text(row, METRIC_NAME) {
            record(row_no, DefectKind::EmptyMetricName);
        }
        if row.get(STEP).and_then(coerce_step).is_none() {
            record(row_no, DefectKind::InvalidStep);
        }
        if row.get(VALUE).and_then(coerce_value).is_none() {
            record(row_no, DefectKind::InvalidValue);
        }
    }

    let failure = (total > 0).then_some(ValidationFailure::InvalidRows { defects, total });
    ValidationReport { failure }
}

fn is_non_empty_text(row: &DecodedRow, column: &str) -> bool {
    row.get(column)
        .and_then(|v| v.as_text())
        .is_some_and(|s| !s.trim().is_empty())
}
