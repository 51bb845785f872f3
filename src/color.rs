use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Experiment;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// `n` distinct colours, one per experiment-list position. Hues are evenly
/// spaced, so entry `i` depends only on `i` and `n`, and a run keeps its
/// colour for as long as the list is unchanged.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.70, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Experiment id → Color32
// ---------------------------------------------------------------------------

/// One colour per experiment, fixed by its position in the experiment list
/// so a run keeps its colour while the selection changes.
#[derive(Debug, Clone, Default)]
pub struct ExperimentColors {
    mapping: BTreeMap<String, Color32>,
}

impl ExperimentColors {
    pub fn new(experiments: &[Experiment]) -> Self {
        let palette = generate_palette(experiments.len());
        let mapping = experiments
            .iter()
            .zip(palette)
            .map(|(exp, c)| (exp.id.clone(), c))
            .collect();
        Self { mapping }
    }

    pub fn color_for(&self, experiment_id: &str) -> Color32 {
        self.mapping
            .get(experiment_id)
            .copied()
            .unwrap_or(Color32::GRAY)
    }
}
