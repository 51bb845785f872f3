use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::config_dir;

const SESSION_FILE: &str = "session.json";

/// Small piece of UI state remembered between runs. Best effort only: a
/// missing or unreadable file is the same as an empty session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub selected: Vec<String>,
    pub last_file: Option<PathBuf>,
}

impl Session {
    pub fn default_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join(SESSION_FILE))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("serializing session")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    /// Read the session, logging and discarding any failure.
    pub fn restore(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::read(path).unwrap_or_else(|e| {
            log::warn!("Discarding saved session: {e:#}");
            Self::default()
        })
    }

    /// Write the session, logging any failure.
    pub fn store(&self, path: Option<&Path>) {
        if let Some(path) = path {
            if let Err(e) = self.write(path) {
                log::warn!("Could not save session: {e:#}");
            }
        }
    }
}
