use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use rusty_tracker::app::RustyTrackerApp;
use rusty_tracker::config::Settings;

/// Compare training metrics across experiments.
#[derive(Parser, Debug)]
#[command(name = "rusty-tracker", version, about)]
struct Cli {
    /// Metrics file to open on start (.csv, .json or .parquet).
    file: Option<PathBuf>,

    /// Maximum points drawn per chart.
    #[arg(long)]
    max_points: Option<usize>,

    /// Settings file to use instead of the per-user one.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> eframe::Result {
    env_logger::init();

    let cli = Cli::parse();
    let mut settings = Settings::load_or_default(cli.config.as_deref());
    if let Some(n) = cli.max_points {
        settings.max_chart_points = n;
    }
    log::debug!("Settings: {settings:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Tracker – Experiment Metrics",
        options,
        Box::new(move |cc| {
            Ok(Box::new(RustyTrackerApp::new(settings, cli.file, &cc.egui_ctx)))
        }),
    )
}
