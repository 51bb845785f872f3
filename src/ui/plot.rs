use eframe::egui::{self, RichText, ScrollArea, Ui};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};

use crate::color::ExperimentColors;
use crate::data::align::ChartData;
use crate::data::export::{export_file_name, write_chart_csv};
use crate::data::model::Experiment;
use crate::format::{compact_value, metric_label};
use crate::state::{AppState, Command};

// ---------------------------------------------------------------------------
// Metric charts (central panel)
// ---------------------------------------------------------------------------

/// Render one chart per metric of the selected experiments.
pub fn metric_charts(ui: &mut Ui, state: &mut AppState, colors: &ExperimentColors) {
    if state.experiments.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to view experiments  (File → Open…)");
        });
        return;
    }
    if state.selected.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label("Select one or more experiments to view their metrics.");
        });
        return;
    }

    let metrics = state.available_metrics();
    if metrics.is_empty() {
        ui.label("Selected experiments have no metrics to display.");
        return;
    }

    ui.heading("Experiment Metrics");
    ui.label(format!(
        "Showing {} metric(s) for {} selected experiment(s)",
        metrics.len(),
        state.selected.len()
    ));
    ui.separator();

    let charts: Vec<_> = metrics.iter().map(|metric| state.chart_data(metric)).collect();
    let experiments = state.snapshot();

    let mut error = None;
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for chart in &charts {
                if let Some(e) = metric_chart(ui, chart, &experiments, colors) {
                    error = Some(e);
                }
                ui.add_space(12.0);
            }
        });

    if let Some(message) = error {
        state.apply(Command::ShowError(message));
    }
}

/// Render a single metric chart. Returns an error message if an export failed.
fn metric_chart(
    ui: &mut Ui,
    chart: &ChartData,
    experiments: &[Experiment],
    colors: &ExperimentColors,
) -> Option<String> {
    let mut error = None;

    ui.horizontal(|ui: &mut Ui| {
        ui.strong(metric_label(&chart.metric));
        if let Some((first, last)) = chart.step_range() {
            ui.small(format!("Steps {first} – {last}"));
        }
        if chart.is_downsampled() {
            ui.small(format!("Optimized view ({} points)", chart.points.len()));
        }
        if ui
            .add_enabled(!chart.is_empty(), egui::Button::new("Export CSV"))
            .clicked()
        {
            error = export_dialog(chart).err().map(|e| format!("Export failed: {e:#}"));
        }
    });

    if chart.is_empty() {
        ui.label("No data available for selected experiments");
        return error;
    }

    Plot::new(format!("chart_{}", chart.metric))
        .height(260.0)
        .legend(Legend::default())
        .x_axis_label("Step")
        .y_axis_label(metric_label(&chart.metric))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(false)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for id in &chart.series {
                let color = colors.color_for(id);

                // Missing steps break the line instead of being bridged.
                for segment in segments(chart, id) {
                    let line = Line::new(PlotPoints::from(segment))
                        .name(id)
                        .color(color)
                        .width(2.0);
                    plot_ui.line(line);
                }

                let markers: PlotPoints = chart
                    .points
                    .iter()
                    .filter_map(|p| Some([p.step as f64, p.value(id)?]))
                    .collect();
                plot_ui.points(Points::new(markers).name(id).color(color).radius(3.0));
            }
        });

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for id in &chart.series {
            let latest = experiments
                .iter()
                .find(|e| &e.id == id)
                .and_then(|e| e.summary.get(&chart.metric))
                .map(|s| format!(" (Latest: {})", compact_value(s.latest)))
                .unwrap_or_default();
            ui.label(RichText::new(format!("■ {id}{latest}")).color(colors.color_for(id)));
        }
    });

    if chart.is_downsampled() {
        ui.small(format!(
            "Showing {} of {} steps from {} observations (smart sampling applied)",
            chart.points.len(),
            chart.distinct_steps,
            chart.observations
        ));
    }

    error
}

/// Split one series into runs of consecutive displayed steps that all have
/// a value.
fn segments(chart: &ChartData, id: &str) -> Vec<Vec<[f64; 2]>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for point in &chart.points {
        match point.value(id) {
            Some(v) => current.push([point.step as f64, v]),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn export_dialog(chart: &ChartData) -> anyhow::Result<()> {
    let file = rfd::FileDialog::new()
        .set_title("Export chart data")
        .set_file_name(export_file_name(&chart.metric))
        .add_filter("CSV", &["csv"])
        .save_file();

    match file {
        Some(path) => write_chart_csv(chart, &path),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::data::aggregate::aggregate;
    use crate::data::align::prepare_chart_data;
    use crate::data::model::RawRow;

    #[test]
    fn gaps_split_lines() {
        let exps = aggregate(vec![
            RawRow::new("a", "loss", 0, 1.0),
            RawRow::new("a", "loss", 2, 0.8),
            RawRow::new("a", "loss", 3, 0.7),
            RawRow::new("b", "loss", 1, 2.0),
        ]);
        let selected: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let chart = prepare_chart_data(&exps, &selected, "loss", 25);
        let runs = segments(&chart, "a");
        assert_eq!(runs, vec![vec![[0.0, 1.0]], vec![[2.0, 0.8], [3.0, 0.7]]]);
        assert_eq!(segments(&chart, "b"), vec![vec![[1.0, 2.0]]]);
    }
}
