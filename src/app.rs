use std::path::PathBuf;

use eframe::egui;
use rusty_extraktor::config::Settings;

use crate::state::{AppState, View};
use crate::ui::{panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ExtraktorApp {
    pub state: AppState,
}

impl ExtraktorApp {
    pub fn new(settings: Settings, files: Vec<PathBuf>) -> Self {
        let mut state = AppState::new(settings);
        if !files.is_empty() {
            state.set_files(files);
        }
        Self { state }
    }
}

impl eframe::App for ExtraktorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: files and target ----
        egui::SidePanel::left("batch_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: matrix as curves or as a table ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.view {
            View::Plot => plot::matrix_plot(ui, &self.state),
            View::Table => table::matrix_table(ui, &self.state),
        });
    }
}
