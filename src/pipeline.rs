use std::path::Path;

use crate::config::Settings;
use crate::data::aggregate::aggregate;
use crate::data::loader;
use crate::data::model::{DecodedRow, Experiment, RawRow};
use crate::data::parse::parse_rows;
use crate::data::validate::validate_rows;
use crate::error::PipelineError;

// ---------------------------------------------------------------------------
// Stage hook
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Decoded,
    Validated,
    Parsed,
    Aggregating,
    Done,
}

impl Stage {
    /// Rough completion fraction for progress display.
    pub fn progress(self) -> f32 {
        match self {
            Stage::Decoded => 0.3,
            Stage::Validated => 0.6,
            Stage::Parsed => 0.7,
            Stage::Aggregating => 0.85,
            Stage::Done => 1.0,
        }
    }
}

/// Observer called between pipeline stages. Both methods default to no-ops,
/// so synchronous callers can pass [`NoHook`].
pub trait IngestHook {
    /// Called after each stage with the number of rows it handled.
    fn on_stage(&mut self, _stage: Stage, _rows: usize) {}

    /// Called once before aggregation when the parsed row count exceeds
    /// `Settings::yield_threshold_rows`. Has no effect on results.
    fn on_yield(&mut self, _rows: usize) {}
}

pub struct NoHook;

impl IngestHook for NoHook {}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Result of a successful ingestion.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub experiments: Vec<Experiment>,
    pub rows_decoded: usize,
    pub rows_parsed: usize,
}

/// Validate, parse and aggregate decoded rows.
///
/// Validation and parse failures return before aggregation starts, so the
/// caller's current experiments stay untouched.
pub fn ingest_rows(
    rows: &[DecodedRow],
    settings: &Settings,
    hook: &mut dyn IngestHook,
) -> Result<IngestOutcome, PipelineError> {
    validate_rows(rows).into_result()?;
    log::debug!("validated {} rows", rows.len());
    hook.on_stage(Stage::Validated, rows.len());

    let parsed = parse_checked(rows)?;
    let rows_parsed = parsed.len();
    hook.on_stage(Stage::Parsed, rows_parsed);

    if rows_parsed > settings.yield_threshold_rows {
        log::debug!("yielding before aggregating {rows_parsed} rows");
        hook.on_yield(rows_parsed);
    }

    hook.on_stage(Stage::Aggregating, rows_parsed);
    let experiments = aggregate(parsed);
    log::debug!("aggregated {rows_parsed} rows into {} experiments", experiments.len());
    hook.on_stage(Stage::Done, experiments.len());

    Ok(IngestOutcome {
        experiments,
        rows_decoded: rows.len(),
        rows_parsed,
    })
}

/// Parse rows, failing with `NoValidData` when none survive.
///
/// Rows that passed validation always parse, so after `validate_rows` this
/// only fails if the two ever disagree.
fn parse_checked(rows: &[DecodedRow]) -> Result<Vec<RawRow>, PipelineError> {
    let parsed = parse_rows(rows);
    if parsed.is_empty() {
        return Err(PipelineError::NoValidData);
    }
    Ok(parsed)
}

/// Decode CSV text and ingest it.
pub fn ingest_csv(
    text: &str,
    settings: &Settings,
    hook: &mut dyn IngestHook,
) -> Result<IngestOutcome, PipelineError> {
    let rows = loader::decode_csv(text).map_err(|e| PipelineError::Decode(format!("{e:#}")))?;
    hook.on_stage(Stage::Decoded, rows.len());
    ingest_rows(&rows, settings, hook)
}

/// Load a file (any supported format) and ingest it.
pub fn ingest_path(
    path: &Path,
    settings: &Settings,
    hook: &mut dyn IngestHook,
) -> Result<IngestOutcome, PipelineError> {
    let rows = loader::load_file(path).map_err(|e| PipelineError::Decode(format!("{e:#}")))?;
    log::info!("Decoded {} rows from {}", rows.len(), path.display());
    hook.on_stage(Stage::Decoded, rows.len());
    ingest_rows(&rows, settings, hook)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        stages: Vec<Stage>,
        yields: usize,
    }

    impl IngestHook for Recorder {
        fn on_stage(&mut self, stage: Stage, _rows: usize) {
            self.stages.push(stage);
        }

        fn on_yield(&mut self, _rows: usize) {
            self.yields += 1;
        }
    }

    const CSV: &str = "experiment_id,metric_name,step,value\nexp_a,loss,0,1.0\nexp_a,loss,1,0.5\nexp_b,loss,0,2.0\n";

    #[test]
    fn stages_run_in_order() {
        let mut hook = Recorder::default();
        let outcome = ingest_csv(CSV, &Settings::default(), &mut hook).unwrap();
        assert_eq!(outcome.experiments.len(), 2);
        assert_eq!(outcome.rows_parsed, 3);
        assert_eq!(
            hook.stages,
            vec![Stage::Decoded, Stage::Validated, Stage::Parsed, Stage::Aggregating, Stage::Done]
        );
        assert_eq!(hook.yields, 0);
    }

    #[test]
    fn yield_hook_fires_above_threshold() {
        let settings = Settings {
            yield_threshold_rows: 2,
            ..Settings::default()
        };
        let mut hook = Recorder::default();
        ingest_csv(CSV, &settings, &mut hook).unwrap();
        assert_eq!(hook.yields, 1);
    }

    #[test]
    fn validation_failure_stops_before_aggregation() {
        let mut hook = Recorder::default();
        let err = ingest_csv("experiment_id,metric_name,step\na,loss,0\n", &Settings::default(), &mut hook)
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumns(ref cols) if cols == &["value"]));
        assert_eq!(hook.stages, vec![Stage::Decoded]);
    }

    #[test]
    fn header_only_file_is_empty_input() {
        let err = ingest_csv("experiment_id,metric_name,step,value\n", &Settings::default(), &mut NoHook)
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyInput));
    }

    #[test]
    fn unparseable_rows_are_no_valid_data() {
        let rows = loader::decode_csv("experiment_id,metric_name,step,value\n,loss,0,1\na,,1,2\n").unwrap();
        let err = parse_checked(&rows).unwrap_err();
        assert!(matches!(err, PipelineError::NoValidData));
        assert_eq!(err.to_string(), "No valid data found in CSV file");

        let rows = loader::decode_csv("experiment_id,metric_name,step,value\n,loss,0,1\na,loss,1,2\n").unwrap();
        assert_eq!(parse_checked(&rows).unwrap().len(), 1);
    }

    #[test]
    fn decode_errors_are_reported() {
        let err = ingest_csv("experiment_id,metric_name,step,value\na,b\n", &Settings::default(), &mut NoHook)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Decode(_)));
    }
}
