use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

/// Render the feature matrix as a scrollable grid, `file` column first.
pub fn matrix_table(ui: &mut Ui, state: &AppState) {
    let Some(outcome) = &state.outcome else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No matrix yet");
        });
        return;
    };
    let matrix = &outcome.matrix;

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::initial(180.0).at_least(80.0))
            .columns(Column::initial(110.0).at_least(60.0), matrix.width())
            .header(20.0, |mut header| {
                for name in matrix.header() {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(18.0, matrix.len(), |mut row| {
                    let i = row.index();
                    let file = &matrix.files[i];
                    row.col(|ui| {
                        ui.colored_label(state.color_map.color_for(file), file.as_str());
                    });
                    for v in &matrix.values[i] {
                        row.col(|ui| {
                            ui.label(format!("{v}"));
                        });
                    }
                });
            });
    });
}
