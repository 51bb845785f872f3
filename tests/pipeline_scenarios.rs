//! End-to-end ingestion scenarios: text in, experiments and chart exports out.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use rusty_tracker::config::Settings;
use rusty_tracker::data::align::{align_metric, prepare_chart_data};
use rusty_tracker::data::export::chart_csv;
use rusty_tracker::data::model::MetricSummary;
use rusty_tracker::error::PipelineError;
use rusty_tracker::pipeline::{NoHook, ingest_csv, ingest_path};
use rusty_tracker::state::{AppState, Command};

const RUNS: &str = "experiment_id,metric_name,step,value\n\
                    exp_a,loss,0,1.0\n\
                    exp_a,loss,1,0.5\n\
                    exp_b,loss,0,2.0\n";

fn both() -> BTreeSet<String> {
    ["exp_a", "exp_b"].iter().map(|s| s.to_string()).collect()
}

#[test]
fn round_trip_summaries() {
    let outcome = ingest_csv(RUNS, &Settings::default(), &mut NoHook).unwrap();
    let exps = outcome.experiments;

    assert_eq!(exps.len(), 2);
    assert_eq!(exps[0].id, "exp_a");
    assert_eq!(
        exps[0].summary["loss"],
        MetricSummary { min: 0.5, max: 1.0, avg: 0.75, latest: 0.5 }
    );
    assert_eq!(exps[0].total_steps, 1);
    assert_eq!(
        exps[1].summary["loss"],
        MetricSummary { min: 2.0, max: 2.0, avg: 2.0, latest: 2.0 }
    );
}

#[test]
fn alignment_leaves_gaps() {
    let exps = ingest_csv(RUNS, &Settings::default(), &mut NoHook).unwrap().experiments;
    let points = align_metric(&exps, &both(), "loss");

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].step, 0);
    assert_eq!(points[0].values.len(), 2);
    assert_eq!(points[0].value("exp_a"), Some(1.0));
    assert_eq!(points[0].value("exp_b"), Some(2.0));
    assert_eq!(points[1].step, 1);
    assert_eq!(points[1].values.len(), 1);
    assert_eq!(points[1].value("exp_a"), Some(0.5));
}

#[test]
fn export_text_is_exact() {
    let exps = ingest_csv(RUNS, &Settings::default(), &mut NoHook).unwrap().experiments;
    let chart = prepare_chart_data(&exps, &both(), "loss", 25);
    assert_eq!(chart_csv(&chart).unwrap(), "Step,exp_a,exp_b\n0,1,2\n1,0.5,\n");
}

#[test]
fn missing_value_column() {
    let err = ingest_csv(
        "experiment_id,metric_name,step\nexp_a,loss,0\n",
        &Settings::default(),
        &mut NoHook,
    )
    .unwrap_err();
    match err {
        PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["value".to_string()]),
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn row_defects_are_capped_in_message() {
    let mut text = String::from("experiment_id,metric_name,step,value\n");
    for i in 0..40 {
        text.push_str(&format!("exp,loss,{i},oops\n"));
    }
    match ingest_csv(&text, &Settings::default(), &mut NoHook).unwrap_err() {
        PipelineError::RowValidation(defects) => {
            assert_eq!(defects.len(), 10);
            assert_eq!(defects[0], "Row 1: value must be a finite number");
        }
        other => panic!("expected RowValidation, got {other:?}"),
    }
}

#[test]
fn rejected_upload_keeps_previous_experiments() {
    let mut state = AppState::default();
    let outcome = ingest_csv(RUNS, &Settings::default(), &mut NoHook).unwrap();
    state.apply(Command::Loaded {
        experiments: outcome.experiments,
        source: None,
    });

    let err = ingest_csv("experiment_id,metric_name,step,value\n", &Settings::default(), &mut NoHook)
        .unwrap_err();
    state.apply(Command::Failed(err.to_string()));

    assert_eq!(state.experiments.len(), 2);
    assert_eq!(state.status_message.as_deref(), Some("CSV file is empty"));
}

#[test]
fn large_series_chart_is_bounded() {
    let mut text = String::from("experiment_id,metric_name,step,value\n");
    for step in 0..1000 {
        text.push_str(&format!("run,loss,{step},{}\n", 1.0 / (step as f64 + 1.0)));
    }
    let exps = ingest_csv(&text, &Settings::default(), &mut NoHook).unwrap().experiments;
    let selected: BTreeSet<String> = std::iter::once("run".to_string()).collect();
    let chart = prepare_chart_data(&exps, &selected, "loss", 25);

    assert!(chart.points.len() <= 25);
    assert_eq!(chart.step_range(), Some((0, 999)));
    assert!(chart.is_downsampled());
}

#[test]
fn ingest_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.json");
    std::fs::write(
        &path,
        r#"[
            {"experiment_id": "exp_a", "metric_name": "loss", "step": 0, "value": 1.0},
            {"experiment_id": "exp_a", "metric_name": "loss", "step": 1, "value": 0.5}
        ]"#,
    )
    .unwrap();
    let outcome = ingest_path(&path, &Settings::default(), &mut NoHook).unwrap();
    assert_eq!(outcome.experiments[0].summary["loss"].latest, 0.5);
}

#[test]
fn ingest_parquet_file() {
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    let schema = Arc::new(Schema::new(vec![
        Field::new("experiment_id", DataType::Utf8, false),
        Field::new("metric_name", DataType::Utf8, false),
        Field::new("step", DataType::Int64, false),
        Field::new("value", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec!["exp_b", "exp_a", "exp_a"])),
            Arc::new(StringArray::from(vec!["loss", "loss", "loss"])),
            Arc::new(Int64Array::from(vec![0, 1, 0])),
            Arc::new(Float64Array::from(vec![2.0, 0.5, 1.0])),
        ],
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.parquet");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let exps = ingest_path(&path, &Settings::default(), &mut NoHook).unwrap().experiments;
    assert_eq!(exps.len(), 2);
    assert_eq!(
        exps[0].summary["loss"],
        MetricSummary { min: 0.5, max: 1.0, avg: 0.75, latest: 0.5 }
    );
}
