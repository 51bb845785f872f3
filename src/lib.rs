//! Experiment metric viewer: CSV ingestion, per-experiment aggregation and
//! downsampled multi-run charts.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod session;
pub mod state;
pub mod ui;
