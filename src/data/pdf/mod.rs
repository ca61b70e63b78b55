//! Peak-table extraction from chromatography report PDFs.
//!
//! ```text
//!   report.pdf
//!       │  pdfplumber: first page → chars, lines, rects
//!       ▼
//!   ┌──────────┐
//!   │  table    │  lattice, then stream candidates; keep the one
//!   └──────────┘  with the Ret. Time / Area / Area% header
//!       │  header row 2, drop title rows and "Total"
//!       ▼
//!   ExtractedFile (Vec<PeakRow>)
//! ```

pub mod table;

use std::path::Path;

use pdfplumber::Pdf;

use crate::config::TableSettings;
use crate::error::{ExtractError, Result};

use super::model::{ExtractedFile, PeakRow};
use table::Grid;

/// Header labels of the three columns kept from the peak table.
pub const RETENTION_TIME: &str = "Ret. Time";
pub const AREA: &str = "Area";
pub const AREA_PERCENT: &str = "Area%";

/// Zero-based grid row holding the column headers; rows above it are the
/// table title and detector line.
pub const HEADER_ROW: usize = 2;

/// Anything that can turn a report path into its peak table.
///
/// The cache and the batch loop only see this trait, so tests can swap in
/// scripted extractors.
pub trait PeakExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedFile>;
}

/// Reads the first page of a PDF report with `pdfplumber`.
#[derive(Debug, Clone, Default)]
pub struct PdfPeakExtractor {
    settings: TableSettings,
}

impl PdfPeakExtractor {
    pub fn new(settings: TableSettings) -> Self {
        Self { settings }
    }

    /// Extract from an in-memory document; `path` only names the result.
    pub fn extract_bytes(&self, bytes: &[u8], path: &Path) -> Result<ExtractedFile> {
        let source = path.to_string_lossy().into_owned();
        let pdf = Pdf::open(bytes, None).map_err(|e| ExtractError::malformed(path, e.to_string()))?;
        if pdf.page_count() == 0 {
            return Err(ExtractError::malformed(path, "document has no pages"));
        }
        let page = pdf
            .page(0)
            .map_err(|e| ExtractError::malformed(path, format!("reading page 1: {e}")))?;
        log::debug!(
            "{}: {} chars, {} lines, {} rects on page 1",
            source,
            page.chars().len(),
            page.lines().len(),
            page.rects().len()
        );

        match table::find_peak_table(&page, &self.settings) {
            Some(grid) => peak_rows_from_grid(&grid, &source)
                .map_err(|reason| ExtractError::malformed(path, reason)),
            None => {
                log::info!("{source}: no table on page 1");
                Ok(ExtractedFile::empty(source))
            }
        }
    }
}

impl PeakExtractor for PdfPeakExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedFile> {
        let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_bytes(&bytes, path)
    }
}

/// Normalize a raw cell grid into validated peak rows.
///
/// Row [`HEADER_ROW`] names the columns, everything above it and the final
/// summary row are discarded. Rows with a missing or unparsable field are
/// dropped one by one; a missing header or header column fails the file.
pub fn peak_rows_from_grid(grid: &Grid, source: &str) -> std::result::Result<ExtractedFile, String> {
    let header = grid.get(HEADER_ROW).ok_or_else(|| {
        format!(
            "table has {} row(s), expected a header at row {}",
            grid.len(),
            HEADER_ROW + 1
        )
    })?;
    let column = |name: &str| {
        header
            .iter()
            .position(|cell| cell.as_deref().map(str::trim) == Some(name))
            .ok_or_else(|| format!("header lacks column '{name}'"))
    };
    let rt_col = column(RETENTION_TIME)?;
    let area_col = column(AREA)?;
    let pct_col = column(AREA_PERCENT)?;

    // Body: between the header and the trailing total row.
    let body_end = grid.len().saturating_sub(1).max(HEADER_ROW + 1);
    let body = &grid[HEADER_ROW + 1..body_end];

    let mut rows = Vec::with_capacity(body.len());
    for (offset, cells) in body.iter().enumerate() {
        let row_no = HEADER_ROW + 1 + offset;
        match parse_row(cells, rt_col, area_col, pct_col) {
            Some(row) => rows.push(row),
            None => log::debug!("{source}: dropping table row {row_no}: {cells:?}"),
        }
    }
    Ok(ExtractedFile::new(source, rows))
}

fn parse_row(cells: &[Option<String>], rt: usize, area: usize, pct: usize) -> Option<PeakRow> {
    let field = |i: usize| {
        cells
            .get(i)
            .and_then(|c| c.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };
    let retention_time: f64 = field(rt)?.parse().ok()?;
    let area: i64 = field(area)?.parse().ok()?;
    let area_percent: f64 = field(pct)?.parse().ok()?;
    if !retention_time.is_finite() || !area_percent.is_finite() {
        return None;
    }
    Some(PeakRow {
        retention_time,
        area,
        area_percent,
    })
}
