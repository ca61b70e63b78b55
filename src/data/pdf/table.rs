//! Choosing the peak table among the tables `pdfplumber` finds on a page.
//!
//! Ruled (lattice) candidates are tried first. A report page often carries
//! other boxed content, such as the chromatogram frame or an instrument
//! block, so a candidate only counts when one of its rows holds the three
//! column headers. Pages without rules fall back to the text-alignment
//! (stream) strategy under the same header test.

use pdfplumber::{Page, Strategy, Table};

use crate::config::TableSettings;

use super::{AREA, AREA_PERCENT, HEADER_ROW, RETENTION_TIME};

/// Cell text, row by row from the top of the page.
pub type Grid = Vec<Vec<Option<String>>>;

/// The peak table of `page`, with its column header at [`HEADER_ROW`].
///
/// When ruled tables exist but none has the header, the first one is
/// returned as is and later fails header validation. `None` means the page
/// has no table at all.
pub fn find_peak_table(page: &Page, settings: &TableSettings) -> Option<Grid> {
    let ruled = grids(page, settings, Strategy::Lattice);
    if let Some(grid) = with_header(&ruled) {
        return Some(grid);
    }

    let aligned = grids(page, settings, Strategy::Stream);
    if let Some(grid) = with_header(&aligned) {
        log::debug!("peak table found by text alignment");
        return Some(grid);
    }

    ruled.into_iter().next()
}

/// Our tolerances mapped onto the finder's per-axis settings.
pub fn finder_settings(settings: &TableSettings, strategy: Strategy) -> pdfplumber::TableSettings {
    pdfplumber::TableSettings {
        strategy,
        snap_tolerance: settings.snap_tolerance,
        snap_x_tolerance: settings.snap_tolerance,
        snap_y_tolerance: settings.snap_tolerance,
        join_tolerance: settings.join_tolerance,
        join_x_tolerance: settings.join_tolerance,
        join_y_tolerance: settings.join_tolerance,
        intersection_tolerance: settings.intersection_tolerance,
        intersection_x_tolerance: settings.intersection_tolerance,
        intersection_y_tolerance: settings.intersection_tolerance,
        text_tolerance: settings.text_tolerance,
        text_x_tolerance: settings.text_tolerance,
        text_y_tolerance: settings.text_tolerance,
        min_words_vertical: settings.min_words_vertical,
        ..pdfplumber::TableSettings::default()
    }
}

fn grids(page: &Page, settings: &TableSettings, strategy: Strategy) -> Vec<Grid> {
    let tables = page.find_tables(&finder_settings(settings, strategy));
    log::trace!("{strategy:?}: {} table(s) on page", tables.len());
    tables.iter().map(grid_of).collect()
}

fn grid_of(table: &Table) -> Grid {
    table
        .rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.text.clone()).collect())
        .collect()
}

/// First candidate that has a header row, re-anchored so the header sits at
/// [`HEADER_ROW`].
fn with_header(candidates: &[Grid]) -> Option<Grid> {
    candidates.iter().find_map(|grid| {
        let at = header_row(grid)?;
        Some(anchor_header(grid, at))
    })
}

/// Index of the row naming all three kept columns.
pub fn header_row(grid: &Grid) -> Option<usize> {
    grid.iter().position(|row| {
        [RETENTION_TIME, AREA, AREA_PERCENT].iter().all(|name| {
            row.iter()
                .any(|cell| cell.as_deref().map(str::trim) == Some(*name))
        })
    })
}

/// Drop rows or pad with empty ones so row `at` lands on [`HEADER_ROW`].
fn anchor_header(grid: &Grid, at: usize) -> Grid {
    if at >= HEADER_ROW {
        grid[at - HEADER_ROW..].to_vec()
    } else {
        let mut anchored = vec![Vec::new(); HEADER_ROW - at];
        anchored.extend(grid.iter().cloned());
        anchored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| Some(c.to_string())).collect())
            .collect()
    }

    const HEADER: &[&str] = &["Peak#", "Ret. Time", "Area", "Height", "Area%"];

    #[test]
    fn header_is_found_by_all_three_names() {
        let g = grid(&[&["mV"], HEADER, &["1", "1.0", "5", "1", "100"]]);
        assert_eq!(header_row(&g), Some(1));
        let partial = grid(&[&["Peak#", "Ret. Time", "Area"]]);
        assert_eq!(header_row(&partial), None);
    }

    #[test]
    fn candidates_without_header_are_skipped() {
        let frame = grid(&[&["mV", "min"]]);
        let peaks = grid(&[HEADER, &["1", "1.0", "5", "1", "100"], &["Total"]]);
        let chosen = with_header(&[frame, peaks]).unwrap();
        assert_eq!(chosen.len(), 5);
        assert!(chosen[0].is_empty() && chosen[1].is_empty());
        assert_eq!(header_row(&chosen), Some(HEADER_ROW));
    }

    #[test]
    fn extra_rows_above_the_title_are_cut() {
        let g = grid(&[&["Sample"], &["<Peak Table>"], &["Detector A"], HEADER, &["Total"]]);
        let anchored = with_header(&[g]).unwrap();
        assert_eq!(anchored.len(), 4);
        assert_eq!(anchored[0][0].as_deref(), Some("<Peak Table>"));
        assert_eq!(header_row(&anchored), Some(HEADER_ROW));
    }

    #[test]
    fn tolerances_reach_both_axes() {
        let ours = TableSettings {
            snap_tolerance: 1.5,
            join_tolerance: 2.0,
            ..TableSettings::default()
        };
        let theirs = finder_settings(&ours, Strategy::Stream);
        assert_eq!(theirs.strategy, Strategy::Stream);
        assert_eq!(theirs.snap_x_tolerance, 1.5);
        assert_eq!(theirs.snap_y_tolerance, 1.5);
        assert_eq!(theirs.join_y_tolerance, 2.0);
        assert_eq!(theirs.min_words_vertical, 3);
    }
}
