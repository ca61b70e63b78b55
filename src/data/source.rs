use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{ExtractError, Result};

use super::aggregate::Aggregator;
use super::cache::ExtractionCache;
use super::model::{BatchOutcome, Measurement};
use super::pdf::{PdfPeakExtractor, PeakExtractor};
use super::tabular;

// ---------------------------------------------------------------------------
// SourceKind – the closed set of supported inputs
// ---------------------------------------------------------------------------

/// Input family of a batch, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// `.xlsx`, `.xlsm`, `.xls`, `.ods` workbooks; one sheet per target.
    Spreadsheet,
    /// `.csv` / `.tsv` files with a header row.
    DelimitedText,
    /// Chromatography report PDFs with a peak table on page 1.
    Chromatogram,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Spreadsheet => "spreadsheet",
            SourceKind::DelimitedText => "delimited text",
            SourceKind::Chromatogram => "chromatogram",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceKind::Spreadsheet),
            "csv" | "tsv" => Ok(SourceKind::DelimitedText),
            "pdf" => Ok(SourceKind::Chromatogram),
            _ => Err(ExtractError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    /// The kind shared by every path of a batch.
    pub fn of_batch(paths: &[PathBuf]) -> Result<Self> {
        let (first, rest) = paths.split_first().ok_or(ExtractError::EmptyBatch)?;
        let kind = Self::from_path(first)?;
        for path in rest {
            let other = Self::from_path(path)?;
            if other != kind {
                return Err(ExtractError::MixedFormats {
                    first: kind.name(),
                    other: other.name(),
                    path: path.clone(),
                });
            }
        }
        Ok(kind)
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Extraction targets
// ---------------------------------------------------------------------------

/// What to pull numbers from: a peak-table column, a sheet, or the whole
/// file for plain tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionTarget {
    Measurement(Measurement),
    Sheet(String),
    WholeFile,
}

impl ExtractionTarget {
    /// Interpret a user-supplied target string for a batch of `kind`.
    pub fn parse_for(kind: SourceKind, raw: &str) -> Result<Self> {
        match kind {
            SourceKind::Chromatogram => raw
                .parse::<Measurement>()
                .map(ExtractionTarget::Measurement)
                .map_err(|_| ExtractError::TargetMismatch {
                    target: raw.to_string(),
                    kind: kind.name(),
                }),
            SourceKind::Spreadsheet => Ok(ExtractionTarget::Sheet(raw.to_string())),
            SourceKind::DelimitedText => Ok(ExtractionTarget::WholeFile),
        }
    }
}

impl fmt::Display for ExtractionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionTarget::Measurement(m) => write!(f, "{m}"),
            ExtractionTarget::Sheet(name) => f.write_str(name),
            ExtractionTarget::WholeFile => f.write_str("csv"),
        }
    }
}

/// Selectable targets for a batch plus the one used when none is chosen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetChoices {
    pub kind: Option<SourceKind>,
    pub targets: Vec<ExtractionTarget>,
}

impl TargetChoices {
    /// The first target, if any.
    pub fn default_target(&self) -> Option<&ExtractionTarget> {
        self.targets.first()
    }
}

/// List the extraction targets a batch offers.
///
/// Unknown or mixed formats yield an empty list rather than an error.
pub fn resolve_targets(paths: &[PathBuf]) -> TargetChoices {
    let kind = match SourceKind::of_batch(paths) {
        Ok(kind) => kind,
        Err(e) => {
            log::warn!("no extraction targets: {e}");
            return TargetChoices::default();
        }
    };
    let targets = match kind {
        SourceKind::Chromatogram => Measurement::ALL
            .iter()
            .copied()
            .map(ExtractionTarget::Measurement)
            .collect(),
        SourceKind::Spreadsheet => match tabular::sheet_names(&paths[0]) {
            Ok(names) => names.into_iter().map(ExtractionTarget::Sheet).collect(),
            Err(e) => {
                log::warn!("listing sheets: {e}");
                Vec::new()
            }
        },
        SourceKind::DelimitedText => vec![ExtractionTarget::WholeFile],
    };
    TargetChoices {
        kind: Some(kind),
        targets,
    }
}

// ---------------------------------------------------------------------------
// Extraktor – one handler per SourceKind
// ---------------------------------------------------------------------------

/// Process-wide extraction entry point: owns the cache and the PDF
/// extractor, dispatches each batch to the handler of its kind.
pub struct Extraktor {
    settings: Settings,
    cache: ExtractionCache,
    pdf: Box<dyn PeakExtractor + Send + Sync>,
}

impl Extraktor {
    pub fn new(settings: Settings) -> Self {
        let pdf = Box::new(PdfPeakExtractor::new(settings.table.clone()));
        Self::with_extractor(settings, pdf)
    }

    /// Use a custom peak extractor for PDFs.
    pub fn with_extractor(settings: Settings, pdf: Box<dyn PeakExtractor + Send + Sync>) -> Self {
        let cache = ExtractionCache::new(&settings.cache);
        Self {
            settings,
            cache,
            pdf,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &ExtractionCache {
        &self.cache
    }

    /// Extract `target` from every file of the batch. `None` picks the
    /// batch's default target.
    pub fn run(&self, paths: &[PathBuf], target: Option<&ExtractionTarget>) -> Result<BatchOutcome> {
        let kind = SourceKind::of_batch(paths)?;
        let target = match target {
            Some(t) => t.clone(),
            None => resolve_targets(paths)
                .default_target()
                .cloned()
                .ok_or_else(|| ExtractError::TargetMismatch {
                    target: "<default>".to_string(),
                    kind: kind.name(),
                })?,
        };
        log::info!("extracting {target} from {} {kind} file(s)", paths.len());

        match (kind, target) {
            (SourceKind::Chromatogram, ExtractionTarget::Measurement(m)) => {
                Aggregator::new(&self.cache, self.pdf.as_ref(), self.settings.binning.clone())
                    .aggregate(paths, m)
            }
            (SourceKind::Spreadsheet, ExtractionTarget::Sheet(sheet)) => {
                tabular::load_tables(paths, |p| tabular::read_sheet(p, &sheet))
            }
            (SourceKind::DelimitedText, ExtractionTarget::WholeFile) => {
                tabular::load_tables(paths, tabular::read_csv)
            }
            (kind, target) => Err(ExtractError::TargetMismatch {
                target: target.to_string(),
                kind: kind.name(),
            }),
        }
    }
}
