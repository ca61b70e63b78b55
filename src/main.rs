mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use app::ExtraktorApp;
use eframe::egui;
use rusty_extraktor::config::Settings;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::discover(None).unwrap_or_else(|e| {
        log::error!("Failed to load settings, using defaults: {e:#}");
        Settings::default()
    });
    // Reports passed on the command line are opened straight away.
    let files: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Extraktor – Peak Table Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(ExtraktorApp::new(settings, files)))),
    )
}
