use std::collections::HashMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{ExtractError, Result};

use super::aggregate::{excluded_for, unique_paths};
use super::model::{BatchOutcome, ExcludedFile, ExclusionReason, FeatureMatrix};

// ---------------------------------------------------------------------------
// Raw tables – header + typed cells, before the numeric filter
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            return Cell::Empty;
        }
        match s.parse::<f64>() {
            Ok(v) => Cell::Number(v),
            Err(_) => Cell::Text(s.to_string()),
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::String(s) => Cell::parse(s),
            other => Cell::Text(other.to_string()),
        }
    }
}

/// A header row plus data records, as read from one file or sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Keep the columns whose non-empty cells are all numbers.
    ///
    /// Empty cells become `0.0`. A column with text in it, or with no value
    /// at all, is left out.
    pub fn numeric_columns(&self, source: &str) -> (Vec<String>, Vec<Vec<f64>>) {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&col| {
                let cells = self.records.iter().map(|r| r.get(col).unwrap_or(&Cell::Empty));
                let mut any_number = false;
                for cell in cells {
                    match cell {
                        Cell::Text(t) => {
                            log::warn!(
                                "{source}: skipping non-numeric column '{}' (found '{t}')",
                                self.headers[col]
                            );
                            return false;
                        }
                        Cell::Number(_) => any_number = true,
                        Cell::Empty => {}
                    }
                }
                any_number
            })
            .collect();

        let columns = keep.iter().map(|&c| self.headers[c].clone()).collect();
        let rows = self
            .records
            .iter()
            .map(|record| {
                keep.iter()
                    .map(|&c| match record.get(c) {
                        Some(Cell::Number(v)) => *v,
                        _ => 0.0,
                    })
                    .collect()
            })
            .collect();
        (columns, rows)
    }
}

fn header_names(cells: impl Iterator<Item = String>) -> Vec<String> {
    cells
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim();
            if h.is_empty() {
                format!("column{}", i + 1)
            } else {
                h.to_string()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Readers
// ---------------------------------------------------------------------------

/// Read a delimited-text file with a header row.
pub fn read_csv(path: &Path) -> Result<RawTable> {
    let csv_err = |source| ExtractError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = header_names(reader.headers().map_err(csv_err)?.iter().map(str::to_string));

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        records.push(record.iter().map(Cell::parse).collect());
    }
    Ok(RawTable { headers, records })
}

/// Sheet names of a workbook, in workbook order.
pub fn sheet_names(path: &Path) -> Result<Vec<String>> {
    let workbook = open_workbook_auto(path).map_err(|e| ExtractError::Spreadsheet {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(workbook.sheet_names())
}

/// Read one sheet; its first row is the header.
pub fn read_sheet(path: &Path, sheet: &str) -> Result<RawTable> {
    let sheet_err = |reason: String| ExtractError::Spreadsheet {
        path: path.to_path_buf(),
        reason,
    };
    let mut workbook = open_workbook_auto(path).map_err(|e| sheet_err(e.to_string()))?;
    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| sheet_err(format!("sheet '{sheet}': {e}")))?;

    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(first) => header_names(first.iter().map(|d| d.to_string())),
        None => return Ok(RawTable::default()),
    };
    let records = rows.map(|r| r.iter().map(Cell::from).collect()).collect();
    Ok(RawTable { headers, records })
}

// ---------------------------------------------------------------------------
// Batch loading
// ---------------------------------------------------------------------------

/// Load a batch of plain tables and stack their numeric columns.
///
/// Each record becomes one matrix row tagged with its source path. The
/// column set is the union over all files in first-seen order; a file
/// lacking a column gets `0.0` there.
pub fn load_tables<F>(paths: &[PathBuf], read: F) -> Result<BatchOutcome>
where
    F: Fn(&Path) -> Result<RawTable>,
{
    if paths.is_empty() {
        return Err(ExtractError::EmptyBatch);
    }

    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut parts: Vec<(String, Vec<usize>, Vec<Vec<f64>>)> = Vec::new();
    let mut excluded = Vec::new();

    for path in unique_paths(paths) {
        let source = path.to_string_lossy().into_owned();
        let raw = match read(path) {
            Ok(raw) => raw,
            Err(e) => {
                excluded.push(excluded_for(path, &e));
                continue;
            }
        };
        let (names, rows) = raw.numeric_columns(&source);
        if names.is_empty() || rows.is_empty() {
            log::warn!("excluding {source}: no numeric data");
            excluded.push(ExcludedFile {
                path: source,
                reason: ExclusionReason::NoData,
            });
            continue;
        }
        let slots = names
            .into_iter()
            .map(|name| {
                *index.entry(name.clone()).or_insert_with(|| {
                    columns.push(name);
                    columns.len() - 1
                })
            })
            .collect();
        log::info!("{source}: {} record(s)", rows.len());
        parts.push((source, slots, rows));
    }

    if parts.is_empty() {
        return Err(ExtractError::NothingExtracted { excluded });
    }

    let mut matrix = FeatureMatrix::with_columns(columns);
    for (source, slots, rows) in parts {
        for row in rows {
            let mut values = vec![0.0; matrix.width()];
            for (slot, v) in slots.iter().zip(row) {
                values[*slot] = v;
            }
            matrix.push_row(source.clone(), values);
        }
    }
    let positions = (0..matrix.width()).map(|i| i as f64).collect();
    Ok(BatchOutcome {
        matrix,
        positions,
        excluded,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn csv_keeps_numeric_columns_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        fs::write(
            &path,
            "sample,c1,c2,notes\nA,1.5,2,ok\nB,,4,\nC,3,6.25,redo\n",
        )
        .unwrap();

        let raw = read_csv(&path).unwrap();
        assert_eq!(raw.headers, vec!["sample", "c1", "c2", "notes"]);
        let (cols, rows) = raw.numeric_columns("samples.csv");
        assert_eq!(cols, vec!["c1", "c2"]);
        assert_eq!(rows, vec![vec![1.5, 2.0], vec![0.0, 4.0], vec![3.0, 6.25]]);
    }

    #[test]
    fn batches_union_columns_and_zero_fill() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        let bad = dir.path().join("missing.csv");
        fs::write(&a, "x,y\n1,2\n").unwrap();
        fs::write(&b, "y,z\n3,4\n5,6\n").unwrap();

        let outcome = load_tables(&[a.clone(), bad.clone(), b.clone()], read_csv).unwrap();
        let m = &outcome.matrix;
        assert_eq!(m.columns, vec!["x", "y", "z"]);
        assert_eq!(m.len(), 3);
        assert_eq!(m.values[0], vec![1.0, 2.0, 0.0]);
        assert_eq!(m.values[1], vec![0.0, 3.0, 4.0]);
        assert_eq!(m.values[2], vec![0.0, 5.0, 6.0]);
        assert_eq!(m.files[1], b.to_string_lossy());
        assert_eq!(outcome.positions, vec![0.0, 1.0, 2.0]);
        assert_eq!(outcome.excluded.len(), 1);
        assert_eq!(outcome.excluded[0].path, bad.to_string_lossy());
    }

    #[test]
    fn text_only_file_is_excluded_as_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.csv");
        fs::write(&path, "name\nalpha\nbeta\n").unwrap();
        match load_tables(&[path], read_csv) {
            Err(ExtractError::NothingExtracted { excluded }) => {
                assert_eq!(excluded[0].reason, ExclusionReason::NoData)
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sheet_cells_convert() {
        assert_eq!(Cell::from(&Data::Int(4)), Cell::Number(4.0));
        assert_eq!(Cell::from(&Data::String(" 2.5 ".into())), Cell::Number(2.5));
        assert_eq!(Cell::from(&Data::Bool(true)), Cell::Text("true".into()));
        assert_eq!(Cell::from(&Data::Empty), Cell::Empty);
    }
}
