use std::path::Path;

use anyhow::{Context, Result};

use super::align::ChartData;

/// Serialize displayed chart data as CSV: `Step,<exp1>,<exp2>,...` with one
/// column per selected experiment, then one line per displayed step with an
/// empty field wherever an experiment has no value at that step. Selected
/// experiments without the metric get an all-blank column.
pub fn chart_csv(chart: &ChartData) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    let header = std::iter::once("Step").chain(chart.columns.iter().map(String::as_str));
    writer.write_record(header).context("writing CSV header")?;

    for point in &chart.points {
        let mut record = Vec::with_capacity(chart.columns.len() + 1);
        record.push(point.step.to_string());
        for id in &chart.columns {
            record.push(point.value(id).map(|v| v.to_string()).unwrap_or_default());
        }
        writer
            .write_record(&record)
            .with_context(|| format!("writing step {}", point.step))?;
    }

    let bytes = writer.into_inner().context("flushing CSV")?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Suggested file name for an exported chart.
pub fn export_file_name(metric: &str) -> String {
    format!("{metric}_chart_data.csv")
}

pub fn write_chart_csv(chart: &ChartData, path: &Path) -> Result<()> {
    let text = chart_csv(chart)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported {} rows of '{}' to {}", chart.points.len(), chart.metric, path.display());
    Ok(())
}
