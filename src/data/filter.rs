use std::collections::BTreeSet;

use super::model::Experiment;

// ---------------------------------------------------------------------------
// Table search: which experiments match the query
// ---------------------------------------------------------------------------

/// Return indices of experiments matching a free-text query.
///
/// An experiment matches when, case-insensitively:
/// * its id contains the query
/// * any metric name contains the query
/// * its step count or point count (as text) contains the query
///
/// A blank query matches everything.
pub fn filter_experiments(experiments: &[Experiment], query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    experiments
        .iter()
        .enumerate()
        .filter(|(_, exp)| {
            if needle.is_empty() {
                return true;
            }
            exp.id.to_lowercase().contains(&needle)
                || exp.metrics.iter().any(|m| m.to_lowercase().contains(&needle))
                || exp.total_steps.to_string().contains(&needle)
                || exp.point_count().to_string().contains(&needle)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Flip selection for the visible rows of a filtered table.
///
/// If every visible experiment is already selected they are all
/// deselected, leaving hidden selections alone; otherwise they are all
/// added.
pub fn toggle_visible(selected: &BTreeSet<String>, visible: &[&str]) -> BTreeSet<String> {
    let all_selected = !visible.is_empty() && visible.iter().all(|id| selected.contains(*id));
    let mut next = selected.clone();
    if all_selected {
        for id in visible {
            next.remove(*id);
        }
    } else {
        next.extend(visible.iter().map(|id| id.to_string()));
    }
    next
}
