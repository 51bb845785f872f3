use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::Duration;

use eframe::egui;

use crate::color::ExperimentColors;
use crate::config::Settings;
use crate::data::model::Experiment;
use crate::error::PipelineError;
use crate::pipeline::{IngestHook, IngestOutcome, Stage, ingest_path};
use crate::session::Session;
use crate::state::{AppState, Command};
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// Background loading
// ---------------------------------------------------------------------------

enum LoadEvent {
    Progress(f32),
    Finished(Result<IngestOutcome, PipelineError>),
}

struct LoadJob {
    path: PathBuf,
    rx: Receiver<LoadEvent>,
}

/// Forwards pipeline progress to the UI thread and pauses before large
/// aggregations so the progress bar gets a chance to repaint.
struct ProgressHook {
    tx: Sender<LoadEvent>,
    ctx: egui::Context,
    pause: Duration,
}

impl IngestHook for ProgressHook {
    fn on_stage(&mut self, stage: Stage, _rows: usize) {
        let _ = self.tx.send(LoadEvent::Progress(stage.progress()));
        self.ctx.request_repaint();
    }

    fn on_yield(&mut self, _rows: usize) {
        std::thread::sleep(self.pause);
    }
}

fn spawn_load(path: PathBuf, settings: Settings, ctx: egui::Context) -> LoadJob {
    let (tx, rx) = mpsc::channel();
    let worker_path = path.clone();
    std::thread::spawn(move || {
        let mut hook = ProgressHook {
            tx: tx.clone(),
            ctx: ctx.clone(),
            pause: settings.yield_pause(),
        };
        let result = ingest_path(&worker_path, &settings, &mut hook);
        let _ = tx.send(LoadEvent::Finished(result));
        ctx.request_repaint();
    });
    LoadJob { path, rx }
}

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyTrackerApp {
    pub state: AppState,
    settings: Settings,
    colors: ExperimentColors,
    /// Experiment list `colors` was built for.
    colored: Arc<Vec<Experiment>>,
    job: Option<LoadJob>,
    session_path: Option<PathBuf>,
    last_file: Option<PathBuf>,
    saved_selection: BTreeSet<String>,
}

impl RustyTrackerApp {
    pub fn new(settings: Settings, initial_file: Option<PathBuf>, ctx: &egui::Context) -> Self {
        let session_path = if settings.persist_selection {
            Session::default_path()
        } else {
            None
        };
        let session = Session::restore(session_path.as_deref());

        let state = AppState::new(settings.max_chart_points, session.selected);
        let mut app = Self {
            saved_selection: state.selected.clone(),
            colored: state.snapshot(),
            state,
            settings,
            colors: ExperimentColors::default(),
            job: None,
            session_path,
            last_file: session.last_file,
        };

        if let Some(path) = initial_file {
            app.start_load(path, ctx);
        }
        app
    }

    fn start_load(&mut self, path: PathBuf, ctx: &egui::Context) {
        if self.job.is_some() {
            log::warn!("Ignoring {}: a file is already loading", path.display());
            return;
        }
        log::info!("Loading {}", path.display());
        self.state.apply(Command::StartLoading);
        self.job = Some(spawn_load(path, self.settings.clone(), ctx.clone()));
    }

    /// Drain worker events. The experiment list is only replaced once the
    /// whole pipeline has succeeded.
    fn poll_job(&mut self) {
        let Some(job) = &self.job else {
            return;
        };
        loop {
            match job.rx.try_recv() {
                Ok(LoadEvent::Progress(p)) => {
                    self.state.apply(Command::Progress(p));
                }
                Ok(LoadEvent::Finished(Ok(outcome))) => {
                    log::info!(
                        "Ingested {} of {} rows from {}",
                        outcome.rows_parsed,
                        outcome.rows_decoded,
                        job.path.display()
                    );
                    self.last_file = Some(job.path.clone());
                    self.state.apply(Command::Loaded {
                        experiments: outcome.experiments,
                        source: Some(job.path.clone()),
                    });
                    self.job = None;
                    return;
                }
                Ok(LoadEvent::Finished(Err(e))) => {
                    if e.is_user_error() {
                        log::warn!("Rejected {}: {e}", job.path.display());
                    } else {
                        log::error!("Failed to load {}: {e}", job.path.display());
                    }
                    self.state.apply(Command::Failed(e.to_string()));
                    self.job = None;
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    let e = PipelineError::Processing("loader stopped unexpectedly".into());
                    log::error!("{e} while loading {}", job.path.display());
                    self.state.apply(Command::Failed(e.to_string()));
                    self.job = None;
                    return;
                }
            }
        }
    }

    fn refresh_colors(&mut self) {
        if !Arc::ptr_eq(&self.colored, &self.state.experiments) {
            self.colored = self.state.snapshot();
            self.colors = ExperimentColors::new(&self.colored);
        }
    }

    fn persist_selection(&mut self) {
        if self.state.selected == self.saved_selection {
            return;
        }
        self.saved_selection = self.state.selected.clone();
        let session = Session {
            selected: self.saved_selection.iter().cloned().collect(),
            last_file: self.last_file.clone(),
        };
        session.store(self.session_path.as_deref());
    }
}

impl eframe::App for RustyTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_job();
        self.refresh_colors();

        // ---- Top panel: menu bar ----
        let last_dir = self.last_file.as_deref().and_then(|p| p.parent()).map(|p| p.to_path_buf());
        let mut open = None;
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            open = panels::top_bar(ui, &mut self.state, last_dir.as_deref());
        });
        if let Some(path) = open {
            self.start_load(path, ctx);
        }

        // ---- Left side panel: experiments ----
        egui::SidePanel::left("experiment_panel")
            .default_width(360.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &self.colors);
            });

        // ---- Central panel: charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::metric_charts(ui, &mut self.state, &self.colors);
        });

        self.persist_selection();
    }
}
