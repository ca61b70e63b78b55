use std::path::Path;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use rusty_extraktor::data::export;

use crate::state::{AppState, View};

// ---------------------------------------------------------------------------
// Left side panel – batch and target
// ---------------------------------------------------------------------------

fn file_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

/// Render the left batch panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Batch");
    ui.separator();

    if state.files.is_empty() {
        ui.label("No files loaded.");
        return;
    }

    // ---- Target selector ----
    ui.strong("Extract");
    let targets = state.choices.targets.clone();
    let current = state
        .target
        .as_ref()
        .map(|t| t.to_string())
        .unwrap_or_default();
    let mut picked = None;
    egui::ComboBox::from_id_salt("target")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for target in &targets {
                if ui
                    .selectable_label(state.target.as_ref() == Some(target), target.to_string())
                    .clicked()
                {
                    picked = Some(target.clone());
                }
            }
        });
    if let Some(target) = picked {
        state.set_target(target);
    }
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Files, coloured like their curves ----
            let header_text = format!("Files  ({})", state.files.len());
            egui::CollapsingHeader::new(RichText::new(header_text).strong())
                .id_salt("files")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    for path in &state.files {
                        let key = path.to_string_lossy();
                        let name = file_label(&key);
                        ui.label(RichText::new(name).color(state.color_map.color_for(&key)))
                            .on_hover_text(&*key);
                    }
                });

            // ---- Exclusions ----
            if let Some(outcome) = &state.outcome {
                if !outcome.excluded.is_empty() {
                    let header_text = format!("Excluded  ({})", outcome.excluded.len());
                    egui::CollapsingHeader::new(
                        RichText::new(header_text).strong().color(Color32::YELLOW),
                    )
                    .id_salt("excluded")
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        for ex in &outcome.excluded {
                            ui.label(format!("{}: {}", file_label(&ex.path), ex.reason))
                                .on_hover_text(&ex.path);
                        }
                    });
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_files_dialog(state);
                ui.close_menu();
            }
            let can_export = state.outcome.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export matrix…"))
                .clicked()
            {
                export_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(outcome) = &state.outcome {
            ui.label(format!(
                "{} row(s), {} column(s)",
                outcome.matrix.len(),
                outcome.matrix.width()
            ));
        }

        ui.separator();

        ui.selectable_value(&mut state.view, View::Plot, "Plot");
        ui.selectable_value(&mut state.view, View::Table, "Table");

        ui.separator();

        if ui
            .selectable_label(state.minmax_scaling, "Min-Max Scaling")
            .clicked()
        {
            state.minmax_scaling = !state.minmax_scaling;
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        } else if let Some(warning) = state.warning() {
            ui.label(RichText::new(warning).color(Color32::YELLOW));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_files_dialog(state: &mut AppState) {
    let files = rfd::FileDialog::new()
        .set_title("Open reports or tables")
        .add_filter("Supported files", &["pdf", "csv", "tsv", "xlsx", "xlsm", "xls", "ods"])
        .add_filter("PDF reports", &["pdf"])
        .add_filter("CSV", &["csv", "tsv"])
        .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods"])
        .pick_files();

    if let Some(paths) = files {
        log::info!("Opening {} file(s)", paths.len());
        state.set_files(paths);
    }
}

pub fn export_dialog(state: &mut AppState) {
    let Some(outcome) = &state.outcome else {
        return;
    };
    let file = rfd::FileDialog::new()
        .set_title("Export feature matrix")
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet"])
        .set_file_name("matrix.csv")
        .save_file();

    if let Some(path) = file {
        match export::write_matrix(&outcome.matrix, &path) {
            Ok(()) => log::info!("Exported matrix to {}", path.display()),
            Err(e) => {
                log::error!("Failed to export: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
