use std::collections::{BTreeMap, BTreeSet};

use super::model::{Experiment, MetricSummary, RawRow};

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Summarize one metric's `(step, value)` observations.
///
/// `points` must already be in step order; `latest` is the value of the last
/// point, so among equal maximal steps the last one wins. Returns `None` for
/// an empty slice.
pub fn summarize(points: &[(u64, f64)]) -> Option<MetricSummary> {
    let &(_, latest) = points.last()?;
    let (mut min, mut max, mut sum) = (f64::INFINITY, f64::NEG_INFINITY, 0.0);
    for &(_, v) in points {
        min = min.min(v);
        max = max.max(v);
        sum += v;
    }
    Some(MetricSummary {
        min,
        max,
        avg: sum / points.len() as f64,
        latest,
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator {
    metrics: BTreeSet<String>,
    max_step: u64,
    points: Vec<RawRow>,
}

/// Fold rows (any order) into per-experiment aggregates.
///
/// The result is sorted by id. Each experiment's points are stably sorted by
/// step, then metric name, and its metric names are alphabetical. Every
/// summary is recomputed from the sorted points, so shuffling the input does
/// not change the output.
pub fn aggregate(rows: Vec<RawRow>) -> Vec<Experiment> {
    let mut by_id: BTreeMap<String, Accumulator> = BTreeMap::new();

    for row in rows {
        let acc = by_id.entry(row.experiment_id.clone()).or_default();
        // Clone only for unseen names; `insert` needs an owned key.
        if !acc.metrics.contains(&row.metric_name) {
            acc.metrics.insert(row.metric_name.clone());
        }
        acc.max_step = acc.max_step.max(row.step);
        acc.points.push(row);
    }

    by_id
        .into_iter()
        .map(|(id, acc)| finish(id, acc))
        .collect()
}

fn finish(id: String, acc: Accumulator) -> Experiment {
    let Accumulator {
        metrics,
        max_step,
        mut points,
    } = acc;

    // Stable: repeated (step, metric) observations keep their input order.
    points.sort_by(|a, b| {
        a.step
            .cmp(&b.step)
            .then_with(|| a.metric_name.cmp(&b.metric_name))
    });

    let mut per_metric: BTreeMap<&str, Vec<(u64, f64)>> = BTreeMap::new();
    for p in &points {
        per_metric
            .entry(p.metric_name.as_str())
            .or_default()
            .push((p.step, p.value));
    }

    let summary = per_metric
        .iter()
        .filter_map(|(name, series)| Some((name.to_string(), summarize(series)?)))
        .collect();

    Experiment {
        id,
        metrics: metrics.into_iter().collect(),
        total_steps: max_step,
        data_points: points,
        summary,
    }
}

/// Distinct metric names across `experiments`, sorted.
pub fn unique_metrics<'a, I>(experiments: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Experiment>,
{
    experiments
        .into_iter()
        .flat_map(|exp| exp.metrics.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_rows() -> Vec<RawRow> {
        vec![
            RawRow::new("exp_a", "loss", 0, 1.0),
            RawRow::new("exp_a", "loss", 1, 0.5),
            RawRow::new("exp_b", "loss", 0, 2.0),
        ]
    }

    #[test]
    fn summarize_empty_is_none() {
        assert_eq!(summarize(&[]), None);
    }

    #[test]
    fn summary_matches_hand_computation() {
        let exps = aggregate(sample_rows());
        assert_eq!(exps.len(), 2);
        assert_eq!(
            exps[0].summary["loss"],
            MetricSummary { min: 0.5, max: 1.0, avg: 0.75, latest: 0.5 }
        );
        assert_eq!(
            exps[1].summary["loss"],
            MetricSummary { min: 2.0, max: 2.0, avg: 2.0, latest: 2.0 }
        );
    }

    #[test]
    fn latest_follows_step_not_insertion_order() {
        let exps = aggregate(vec![
            RawRow::new("a", "loss", 10, 0.1),
            RawRow::new("a", "loss", 0, 0.9),
            RawRow::new("a", "loss", 5, 0.4),
        ]);
        assert_eq!(exps[0].summary["loss"].latest, 0.1);
        let steps: Vec<u64> = exps[0].data_points.iter().map(|p| p.step).collect();
        assert_eq!(steps, vec![0, 5, 10]);
    }

    #[test]
    fn metrics_and_ids_are_sorted() {
        let exps = aggregate(vec![
            RawRow::new("zeta", "loss", 0, 1.0),
            RawRow::new("alpha", "lr", 3, 0.1),
            RawRow::new("alpha", "acc", 7, 0.2),
            RawRow::new("alpha", "lr", 1, 0.3),
        ]);
        assert_eq!(exps[0].id, "alpha");
        assert_eq!(exps[0].metrics, vec!["acc".to_string(), "lr".to_string()]);
        assert_eq!(exps[0].total_steps, 7);
        assert_eq!(exps[1].id, "zeta");
        assert_eq!(exps[1].total_steps, 0);
    }

    #[test]
    fn experiments_do_not_share_points() {
        let exps = aggregate(sample_rows());
        assert!(exps[0].data_points.iter().all(|p| p.experiment_id == "exp_a"));
        assert!(exps[1].data_points.iter().all(|p| p.experiment_id == "exp_b"));
    }

    #[test]
    fn unique_metrics_is_sorted_union() {
        let exps = aggregate(vec![
            RawRow::new("a", "loss", 0, 1.0),
            RawRow::new("b", "acc", 0, 1.0),
            RawRow::new("b", "loss", 0, 1.0),
        ]);
        assert_eq!(unique_metrics(&exps), vec!["acc".to_string(), "loss".to_string()]);
    }
}
