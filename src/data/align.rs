use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{ChartDataPoint, Experiment};
use super::sample::sample_steps;

/// Aligned, display-ready data for one metric chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub metric: String,
    /// Ids of the charted experiments, in experiment-list order.
    pub series: Vec<String>,
    /// Every selected id, in experiment-list order. Export writes one column
    /// per entry, blank where the experiment has no value.
    pub columns: Vec<String>,
    /// One record per displayed step, ascending.
    pub points: Vec<ChartDataPoint>,
    /// Size of the full step union before sampling.
    pub distinct_steps: usize,
    /// Raw observations of the metric across the charted experiments.
    pub observations: usize,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn is_downsampled(&self) -> bool {
        self.points.len() < self.distinct_steps
    }

    /// First and last displayed step.
    pub fn step_range(&self) -> Option<(u64, u64)> {
        Some((self.points.first()?.step, self.points.last()?.step))
    }
}

/// Per-experiment step index for one metric. The first observation at a
/// step wins.
struct Series<'a> {
    id: &'a str,
    by_step: BTreeMap<u64, f64>,
    observations: usize,
}

fn index_series<'a>(
    experiments: &'a [Experiment],
    selected: &BTreeSet<String>,
    metric: &str,
) -> Vec<Series<'a>> {
    experiments
        .iter()
        .filter(|exp| selected.contains(&exp.id) && exp.has_metric(metric))
        .map(|exp| {
            let mut by_step = BTreeMap::new();
            let mut observations = 0;
            for p in exp.metric_points(metric) {
                by_step.entry(p.step).or_insert(p.value);
                observations += 1;
            }
            Series {
                id: exp.id.as_str(),
                by_step,
                observations,
            }
        })
        .collect()
}

fn build_points(series: &[Series<'_>], steps: &[u64]) -> Vec<ChartDataPoint> {
    steps
        .iter()
        .map(|&step| ChartDataPoint {
            step,
            values: series
                .iter()
                .filter_map(|s| Some((s.id.to_string(), *s.by_step.get(&step)?)))
                .collect(),
        })
        .collect()
}

fn step_union(series: &[Series<'_>]) -> Vec<u64> {
    series
        .iter()
        .flat_map(|s| s.by_step.keys().copied())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Align `metric` across the selected experiments: one record per distinct
/// step, holding each experiment's value at exactly that step.
///
/// Experiments that are not selected or lack the metric are ignored; when
/// none remain the result is empty.
pub fn align_metric(
    experiments: &[Experiment],
    selected: &BTreeSet<String>,
    metric: &str,
) -> Vec<ChartDataPoint> {
    let series = index_series(experiments, selected, metric);
    build_points(&series, &step_union(&series))
}

/// Align `metric` and downsample the shared step axis to `max_points`.
pub fn prepare_chart_data(
    experiments: &[Experiment],
    selected: &BTreeSet<String>,
    metric: &str,
    max_points: usize,
) -> ChartData {
    let series = index_series(experiments, selected, metric);
    let steps = step_union(&series);
    let sampled = sample_steps(&steps, max_points);

    ChartData {
        metric: metric.to_string(),
        series: series.iter().map(|s| s.id.to_string()).collect(),
        columns: experiments
            .iter()
            .filter(|exp| selected.contains(&exp.id))
            .map(|exp| exp.id.clone())
            .collect(),
        points: build_points(&series, &sampled),
        distinct_steps: steps.len(),
        observations: series.iter().map(|s| s.observations).sum(),
    }
}
