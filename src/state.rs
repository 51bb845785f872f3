use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::data::aggregate::unique_metrics;
use crate::data::align::{ChartData, prepare_chart_data};
use crate::data::filter::{filter_experiments, toggle_visible};
use crate::data::model::Experiment;
use crate::data::sample::DEFAULT_MAX_POINTS;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// Every mutation of [`AppState`] goes through one of these.
#[derive(Debug, Clone)]
pub enum Command {
    /// A new upload finished; replaces the experiment list wholesale.
    Loaded {
        experiments: Vec<Experiment>,
        source: Option<PathBuf>,
    },
    ToggleSelection(String),
    /// Replace the selection.
    SelectExperiments(Vec<String>),
    SelectAll,
    /// Select-all / deselect-all over the rows matching the current search.
    ToggleVisible,
    ClearSelection,
    StartLoading,
    Progress(f32),
    /// An upload failed; the current experiments are kept.
    Failed(String),
    /// Show an error that is unrelated to loading.
    ShowError(String),
    ClearData,
    SetSearch(String),
}

// ---------------------------------------------------------------------------
// Chart cache
// ---------------------------------------------------------------------------

/// Aligned charts for one (experiment snapshot, selection, budget) triple.
/// Any change to the key drops every entry.
#[derive(Debug, Clone, Default)]
struct ChartCache {
    experiments: Option<Arc<Vec<Experiment>>>,
    selected: BTreeSet<String>,
    max_points: usize,
    charts: BTreeMap<String, Arc<ChartData>>,
}

impl ChartCache {
    fn is_current(
        &self,
        experiments: &Arc<Vec<Experiment>>,
        selected: &BTreeSet<String>,
        max_points: usize,
    ) -> bool {
        self.experiments
            .as_ref()
            .is_some_and(|cached| Arc::ptr_eq(cached, experiments))
            && self.selected == *selected
            && self.max_points == max_points
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Current aggregate. Replaced, never edited, so readers holding a clone
    /// of the `Arc` keep a consistent snapshot.
    pub experiments: Arc<Vec<Experiment>>,

    /// Ids of experiments shown in charts.
    pub selected: BTreeSet<String>,

    /// Experiment table search text.
    pub search: String,

    /// File the current experiments came from.
    pub source: Option<PathBuf>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
    pub progress: f32,

    /// Point budget per chart.
    pub max_chart_points: usize,

    charts: ChartCache,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            experiments: Arc::new(Vec::new()),
            selected: BTreeSet::new(),
            search: String::new(),
            source: None,
            status_message: None,
            loading: false,
            progress: 0.0,
            max_chart_points: DEFAULT_MAX_POINTS,
            charts: ChartCache::default(),
        }
    }
}

impl AppState {
    pub fn new(max_chart_points: usize, restored_selection: Vec<String>) -> Self {
        Self {
            max_chart_points,
            selected: restored_selection.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Apply one command. Returns `true` when the selection changed.
    pub fn apply(&mut self, command: Command) -> bool {
        let before = self.selected.clone();
        match command {
            Command::Loaded {
                experiments,
                source,
            } => self.set_experiments(experiments, source),
            Command::ToggleSelection(id) => {
                if !self.selected.remove(&id) && self.contains(&id) {
                    self.selected.insert(id);
                }
            }
            Command::SelectExperiments(ids) => {
                self.selected = ids.into_iter().filter(|id| self.contains(id)).collect();
            }
            Command::SelectAll => {
                self.selected = self.experiments.iter().map(|e| e.id.clone()).collect();
            }
            Command::ToggleVisible => {
                let visible: Vec<&str> = self
                    .visible_indices()
                    .into_iter()
                    .map(|i| self.experiments[i].id.as_str())
                    .collect();
                self.selected = toggle_visible(&self.selected, &visible);
            }
            Command::ClearSelection => self.selected.clear(),
            Command::StartLoading => {
                self.loading = true;
                self.progress = 0.0;
                self.status_message = None;
            }
            Command::Progress(p) => self.progress = p,
            Command::Failed(message) => {
                self.loading = false;
                self.progress = 0.0;
                self.status_message = Some(message);
            }
            Command::ShowError(message) => self.status_message = Some(message),
            Command::ClearData => {
                *self = Self {
                    max_chart_points: self.max_chart_points,
                    ..Self::default()
                };
            }
            Command::SetSearch(text) => self.search = text,
        }
        let changed = self.selected != before;
        if changed {
            self.charts.clear();
        }
        changed
    }

    /// Install a new aggregate. The selection keeps the ids that still
    /// exist; if none survive, the first experiment is selected.
    fn set_experiments(&mut self, experiments: Vec<Experiment>, source: Option<PathBuf>) {
        let mut survivors: BTreeSet<String> = experiments
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .map(|e| e.id.clone())
            .collect();
        if survivors.is_empty() {
            if let Some(first) = experiments.first() {
                survivors.insert(first.id.clone());
            }
        }

        log::info!(
            "Loaded {} experiments, {} selected",
            experiments.len(),
            survivors.len()
        );

        self.experiments = Arc::new(experiments);
        self.selected = survivors;
        self.charts.clear();
        self.source = source;
        self.status_message = None;
        self.loading = false;
        self.progress = 0.0;
    }

    fn contains(&self, id: &str) -> bool {
        self.experiments.iter().any(|e| e.id == id)
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Cheap handle on the current experiment list.
    pub fn snapshot(&self) -> Arc<Vec<Experiment>> {
        Arc::clone(&self.experiments)
    }

    pub fn selected_experiments(&self) -> Vec<&Experiment> {
        self.experiments
            .iter()
            .filter(|e| self.selected.contains(&e.id))
            .collect()
    }

    /// Metrics carried by at least one selected experiment, sorted.
    pub fn available_metrics(&self) -> Vec<String> {
        unique_metrics(self.selected_experiments())
    }

    /// Indices of experiments matching the search box.
    pub fn visible_indices(&self) -> Vec<usize> {
        filter_experiments(&self.experiments, &self.search)
    }

    /// Aligned, sampled chart for `metric`. Built once per experiment
    /// snapshot, selection and point budget; later frames reuse it.
    pub fn chart_data(&mut self, metric: &str) -> Arc<ChartData> {
        if !self
            .charts
            .is_current(&self.experiments, &self.selected, self.max_chart_points)
        {
            self.charts = ChartCache {
                experiments: Some(self.snapshot()),
                selected: self.selected.clone(),
                max_points: self.max_chart_points,
                charts: BTreeMap::new(),
            };
        }
        if let Some(chart) = self.charts.charts.get(metric) {
            return Arc::clone(chart);
        }

        log::debug!("building chart data for '{metric}'");
        let chart = Arc::new(prepare_chart_data(
            &self.experiments,
            &self.selected,
            metric,
            self.max_chart_points,
        ));
        self.charts.charts.insert(metric.to_string(), Arc::clone(&chart));
        chart
    }

    pub fn total_points(&self) -> usize {
        self.experiments.iter().map(Experiment::point_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::aggregate::aggregate;
    use crate::data::model::RawRow;

    fn load(state: &mut AppState, ids: &[&str]) -> bool {
        let rows = ids.iter().map(|id| RawRow::new(id, "loss", 0, 1.0)).collect();
        state.apply(Command::Loaded {
            experiments: aggregate(rows),
            source: None,
        })
    }

    fn selected(state: &AppState) -> Vec<&str> {
        state.selected.iter().map(String::as_str).collect()
    }

    #[test]
    fn first_upload_selects_first_experiment() {
        let mut state = AppState::default();
        assert!(load(&mut state, &["b", "a"]));
        assert_eq!(selected(&state), vec!["a"]);
    }

    #[test]
    fn new_upload_keeps_surviving_selection() {
        let mut state = AppState::default();
        load(&mut state, &["a", "b", "c"]);
        state.apply(Command::SelectExperiments(vec!["b".into(), "c".into()]));
        load(&mut state, &["a", "c"]);
        assert_eq!(selected(&state), vec!["c"]);
    }

    #[test]
    fn no_survivors_falls_back_to_first() {
        let mut state = AppState::default();
        load(&mut state, &["a", "b"]);
        state.apply(Command::SelectExperiments(vec!["b".into()]));
        load(&mut state, &["x", "y"]);
        assert_eq!(selected(&state), vec!["x"]);
    }

    #[test]
    fn restored_selection_is_filtered_on_load() {
        let mut state = AppState::new(25, vec!["gone".into(), "b".into()]);
        load(&mut state, &["a", "b"]);
        assert_eq!(selected(&state), vec!["b"]);
    }

    #[test]
    fn failure_keeps_previous_experiments() {
        let mut state = AppState::default();
        load(&mut state, &["a"]);
        state.apply(Command::StartLoading);
        state.apply(Command::Failed("CSV file is empty".into()));
        assert_eq!(state.experiments.len(), 1);
        assert!(!state.loading);
        assert_eq!(state.status_message.as_deref(), Some("CSV file is empty"));
    }

    #[test]
    fn toggle_ignores_unknown_ids() {
        let mut state = AppState::default();
        load(&mut state, &["a", "b"]);
        assert!(state.apply(Command::ToggleSelection("b".into())));
        assert!(!state.apply(Command::ToggleSelection("zzz".into())));
        assert!(state.apply(Command::ToggleSelection("a".into())));
        assert_eq!(selected(&state), vec!["b"]);
    }

    #[test]
    fn toggle_visible_respects_search() {
        let mut state = AppState::default();
        load(&mut state, &["run_1", "run_2", "other"]);
        state.apply(Command::ClearSelection);
        state.apply(Command::SetSearch("run".into()));
        state.apply(Command::ToggleVisible);
        assert_eq!(selected(&state), vec!["run_1", "run_2"]);
        state.apply(Command::ToggleVisible);
        assert!(state.selected.is_empty());
    }

    #[test]
    fn clear_data_resets_everything_but_budget() {
        let mut state = AppState::new(40, Vec::new());
        load(&mut state, &["a"]);
        state.apply(Command::ClearData);
        assert!(state.experiments.is_empty());
        assert!(state.selected.is_empty());
        assert_eq!(state.max_chart_points, 40);
    }

    #[test]
    fn chart_data_is_reused_until_selection_changes() {
        let mut state = AppState::default();
        load(&mut state, &["a", "b"]);

        let first = state.chart_data("loss");
        let again = state.chart_data("loss");
        assert!(Arc::ptr_eq(&first, &again));

        state.apply(Command::ToggleSelection("b".into()));
        let rebuilt = state.chart_data("loss");
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(rebuilt.series, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn chart_data_follows_new_upload_and_budget() {
        let mut state = AppState::default();
        load(&mut state, &["a"]);
        let before = state.chart_data("loss");

        state.max_chart_points = 10;
        let resized = state.chart_data("loss");
        assert!(!Arc::ptr_eq(&before, &resized));

        load(&mut state, &["a"]);
        let reloaded = state.chart_data("loss");
        assert!(!Arc::ptr_eq(&resized, &reloaded));
        assert_eq!(*reloaded, *resized);
    }

    #[test]
    fn available_metrics_follow_selection() {
        let mut state = AppState::default();
        state.apply(Command::Loaded {
            experiments: aggregate(vec![
                RawRow::new("a", "loss", 0, 1.0),
                RawRow::new("b", "acc", 0, 1.0),
            ]),
            source: None,
        });
        assert_eq!(state.available_metrics(), vec!["loss".to_string()]);
        state.apply(Command::SelectAll);
        assert_eq!(state.available_metrics(), vec!["acc".to_string(), "loss".to_string()]);
    }
}
