use std::path::{Path, PathBuf};

use eframe::egui::{self, Color32, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use crate::color::ExperimentColors;
use crate::data::model::Experiment;
use crate::format::compact_value;
use crate::state::{AppState, Command};

// ---------------------------------------------------------------------------
// Left side panel – experiment table
// ---------------------------------------------------------------------------

/// Render the experiment list with search and selection controls.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, colors: &ExperimentColors) {
    ui.heading("Experiments");
    ui.separator();

    if state.experiments.is_empty() {
        ui.label("No experiments loaded.");
        return;
    }

    let mut search = state.search.clone();
    if ui
        .add(egui::TextEdit::singleline(&mut search).hint_text("Search experiments…"))
        .changed()
    {
        state.apply(Command::SetSearch(search));
    }

    let visible = state.visible_indices();
    let all_visible_selected =
        !visible.is_empty() && visible.iter().all(|&i| state.is_selected(&state.experiments[i].id));

    ui.horizontal(|ui: &mut Ui| {
        let label = if all_visible_selected { "Deselect visible" } else { "Select visible" };
        if ui.small_button(label).clicked() {
            state.apply(Command::ToggleVisible);
        }
        if ui.small_button("Select all").clicked() {
            state.apply(Command::SelectAll);
        }
        if ui.small_button("Clear").clicked() {
            state.apply(Command::ClearSelection);
        }
        ui.label(format!(
            "{}/{} selected",
            state.selected.len(),
            state.experiments.len()
        ));
    });
    ui.separator();

    // Work on a snapshot so selection edits can be applied after the table.
    let experiments = state.snapshot();
    let mut toggled: Option<String> = None;
    let mut only: Option<String> = None;

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(20.0))
        .column(Column::auto().at_least(90.0))
        .column(Column::auto().at_least(60.0))
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|_ui| {});
            header.col(|ui| {
                ui.strong("Experiment");
            });
            header.col(|ui| {
                ui.strong("Metrics");
            });
            header.col(|ui| {
                ui.strong("Steps");
            });
            header.col(|ui| {
                ui.strong("Points");
            });
        })
        .body(|body| {
            body.rows(20.0, visible.len(), |mut row| {
                let exp = &experiments[visible[row.index()]];
                let mut checked = state.is_selected(&exp.id);

                row.col(|ui| {
                    if ui.checkbox(&mut checked, "").changed() {
                        toggled = Some(exp.id.clone());
                    }
                });
                row.col(|ui| {
                    let id_text = RichText::new(&exp.id).color(colors.color_for(&exp.id));
                    ui.add(egui::Label::new(id_text).sense(egui::Sense::click()))
                        .on_hover_text(summary_text(exp))
                        .context_menu(|ui: &mut Ui| {
                            if ui.button("Show only this").clicked() {
                                only = Some(exp.id.clone());
                                ui.close_menu();
                            }
                        });
                });
                row.col(|ui| {
                    ui.label(exp.metrics.join(", "));
                });
                row.col(|ui| {
                    ui.label(exp.total_steps.to_string());
                });
                row.col(|ui| {
                    ui.label(exp.point_count().to_string());
                });
            });
        });

    if let Some(id) = toggled {
        state.apply(Command::ToggleSelection(id));
    }
    if let Some(id) = only {
        state.apply(Command::SelectExperiments(vec![id]));
    }
}

/// Tooltip listing each metric's summary.
fn summary_text(exp: &Experiment) -> String {
    exp.summary
        .iter()
        .map(|(metric, s)| {
            format!(
                "{metric}: min {}, max {}, avg {}, latest {}",
                compact_value(s.min),
                compact_value(s.max),
                compact_value(s.avg),
                compact_value(s.latest)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar. Returns a file the user chose to open.
pub fn top_bar(ui: &mut Ui, state: &mut AppState, last_dir: Option<&Path>) -> Option<PathBuf> {
    let mut open = None;

    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui
                .add_enabled(!state.loading, egui::Button::new("Open…"))
                .clicked()
            {
                open = open_file_dialog(last_dir);
                ui.close_menu();
            }
            if ui
                .add_enabled(!state.experiments.is_empty(), egui::Button::new("Clear data"))
                .clicked()
            {
                state.apply(Command::ClearData);
                ui.close_menu();
            }
        });

        ui.separator();

        if state.loading {
            ui.spinner();
            ui.add(egui::ProgressBar::new(state.progress).desired_width(140.0).show_percentage());
        } else if !state.experiments.is_empty() {
            let name = state
                .source
                .as_deref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}  {} experiments, {} data points",
                state.experiments.len(),
                state.total_points()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });

    open
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(last_dir: Option<&Path>) -> Option<PathBuf> {
    let mut dialog = rfd::FileDialog::new()
        .set_title("Open experiment metrics")
        .add_filter("Supported files", &["csv", "txt", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv", "txt"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"]);
    if let Some(dir) = last_dir {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_file()
}
