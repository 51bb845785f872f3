use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::data::sample::DEFAULT_MAX_POINTS;

const SETTINGS_FILE: &str = "settings.json";

/// User-tunable settings, read from `settings.json` in the config directory.
/// Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Point budget for each chart's step axis.
    pub max_chart_points: usize,
    /// Row count above which ingestion pauses before aggregating.
    pub yield_threshold_rows: usize,
    pub yield_pause_ms: u64,
    /// Remember the experiment selection between sessions.
    pub persist_selection: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_chart_points: DEFAULT_MAX_POINTS,
            yield_threshold_rows: 10_000,
            yield_pause_ms: 100,
            persist_selection: true,
        }
    }
}

impl Settings {
    pub fn yield_pause(&self) -> Duration {
        Duration::from_millis(self.yield_pause_ms)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing default file yields defaults; any other failure is logged
    /// and also yields defaults.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => match default_settings_path() {
                Some(p) if p.exists() => p,
                _ => return Self::default(),
            },
        };
        match Self::load_from(&path) {
            Ok(settings) => {
                log::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                log::warn!("Ignoring settings: {e:#}");
                Self::default()
            }
        }
    }
}

/// Per-user configuration directory for this application.
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "rusty-tracker").map(|dirs| dirs.config_dir().to_path_buf())
}

fn default_settings_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(SETTINGS_FILE))
}
