use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FieldValue – a single decoded cell
// ---------------------------------------------------------------------------

/// A loosely-typed cell as produced by the file decoders.
///
/// Numeric columns (`step`, `value`) arrive as `Number` when the raw text
/// parses, otherwise they keep the original text so the validator can
/// report it.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Null,
}

impl FieldValue {
    /// Coerce to a number. Text is trimmed and parsed; blank text is not a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(v) => Some(*v),
            FieldValue::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    None
                } else {
                    s.parse::<f64>().ok()
                }
            }
            FieldValue::Null => None,
        }
    }

    /// Borrow the text if this cell is a string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Number(v) => write!(f, "{v}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

/// One decoded row: column name → cell.
pub type DecodedRow = BTreeMap<String, FieldValue>;

pub const EXPERIMENT_ID: &str = "experiment_id";
pub const METRIC_NAME: &str = "metric_name";
pub const STEP: &str = "step";
pub const VALUE: &str = "value";

/// Columns every input must carry, in the order they are reported.
pub const REQUIRED_COLUMNS: [&str; 4] = [EXPERIMENT_ID, METRIC_NAME, STEP, VALUE];

/// Whether a column is decoded as a number.
pub fn is_numeric_column(name: &str) -> bool {
    name == STEP || name == VALUE
}

// ---------------------------------------------------------------------------
// RawRow – one strictly typed observation
// ---------------------------------------------------------------------------

/// A single well-typed observation. Rows surviving the parser never need
/// further coercion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub experiment_id: String,
    pub metric_name: String,
    pub step: u64,
    pub value: f64,
}

impl RawRow {
    pub fn new(experiment_id: &str, metric_name: &str, step: u64, value: f64) -> Self {
        Self {
            experiment_id: experiment_id.to_string(),
            metric_name: metric_name.to_string(),
            step,
            value,
        }
    }
}

// ---------------------------------------------------------------------------
// Experiment – aggregated model
// ---------------------------------------------------------------------------

/// Precomputed statistics for one metric of one experiment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Value observed at the greatest step.
    pub latest: f64,
}

/// One run with all its metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Experiment {
    pub id: String,
    /// Distinct metric names, alphabetical.
    pub metrics: Vec<String>,
    /// Largest step observed across all metrics.
    pub total_steps: u64,
    /// Every observation of this experiment, sorted by step (stable).
    pub data_points: Vec<RawRow>,
    pub summary: BTreeMap<String, MetricSummary>,
}

impl Experiment {
    pub fn has_metric(&self, metric: &str) -> bool {
        self.metrics
            .binary_search_by(|m| m.as_str().cmp(metric))
            .is_ok()
    }

    /// Observations of one metric, in step order.
    pub fn metric_points<'a>(&'a self, metric: &'a str) -> impl Iterator<Item = &'a RawRow> + 'a {
        self.data_points
            .iter()
            .filter(move |p| p.metric_name == metric)
    }

    pub fn point_count(&self) -> usize {
        self.data_points.len()
    }
}

// ---------------------------------------------------------------------------
// ChartDataPoint – one aligned step
// ---------------------------------------------------------------------------

/// Values of several experiments at one step. An absent key is a gap, not zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDataPoint {
    pub step: u64,
    pub values: BTreeMap<String, f64>,
}

impl ChartDataPoint {
    pub fn value(&self, experiment_id: &str) -> Option<f64> {
        self.values.get(experiment_id).copied()
    }
}
