use std::path::PathBuf;

use rusty_extraktor::config::Settings;
use rusty_extraktor::data::model::BatchOutcome;
use rusty_extraktor::data::source::{resolve_targets, ExtractionTarget, Extraktor, SourceKind, TargetChoices};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// What the central panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Plot,
    Table,
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Owns the extraction cache for the lifetime of the window.
    pub extraktor: Extraktor,

    /// Files of the current batch, as picked.
    pub files: Vec<PathBuf>,

    /// Targets the current batch offers.
    pub choices: TargetChoices,

    /// Target the matrix was built from.
    pub target: Option<ExtractionTarget>,

    /// Result of the last extraction (None until a batch succeeds).
    pub outcome: Option<BatchOutcome>,

    /// Colour per matrix row source.
    pub color_map: ColorMap,

    pub minmax_scaling: bool,

    pub view: View,

    /// Error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            extraktor: Extraktor::new(settings),
            files: Vec::new(),
            choices: TargetChoices::default(),
            target: None,
            outcome: None,
            color_map: ColorMap::default(),
            minmax_scaling: false,
            view: View::default(),
            status_message: None,
        }
    }

    /// Replace the batch, pick its default target and extract.
    pub fn set_files(&mut self, files: Vec<PathBuf>) {
        self.choices = resolve_targets(&files);
        self.target = self.choices.default_target().cloned();
        self.files = files;
        self.outcome = None;
        self.color_map = ColorMap::default();

        if self.choices.kind.is_none() {
            self.status_message =
                Some("Select files of one supported type (.pdf, .csv or .xlsx)".to_string());
            return;
        }
        self.extract();
    }

    /// Switch target and re-extract. Cached PDFs are not parsed again.
    pub fn set_target(&mut self, target: ExtractionTarget) {
        if self.target.as_ref() == Some(&target) {
            return;
        }
        self.target = Some(target);
        self.extract();
    }

    pub fn extract(&mut self) {
        match self.extraktor.run(&self.files, self.target.as_ref()) {
            Ok(outcome) => {
                log::info!(
                    "Matrix: {} row(s) × {} column(s)",
                    outcome.matrix.len(),
                    outcome.matrix.width()
                );
                self.color_map = ColorMap::new(outcome.matrix.files.iter().map(String::as_str));
                self.outcome = Some(outcome);
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Extraction failed: {e}");
                self.outcome = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    pub fn is_chromatogram(&self) -> bool {
        self.choices.kind == Some(SourceKind::Chromatogram)
    }

    /// Warning about files left out of the current matrix.
    pub fn warning(&self) -> Option<String> {
        self.outcome.as_ref().and_then(BatchOutcome::warning)
    }
}
