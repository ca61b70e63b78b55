use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Measurement – which peak-table column feeds the matrix
// ---------------------------------------------------------------------------

/// A numeric column of the peak table that can be pivoted into the matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Measurement {
    /// Integrated peak area (`Area`).
    #[default]
    Area,
    /// Share of the total area in percent (`Area%`).
    AreaPercent,
}

impl Measurement {
    /// Every measurement, in the order they are offered to the user.
    pub const ALL: [Measurement; 2] = [Measurement::Area, Measurement::AreaPercent];

    /// Header text of the column as printed in the report.
    pub fn column_name(self) -> &'static str {
        match self {
            Measurement::Area => "Area",
            Measurement::AreaPercent => "Area%",
        }
    }

    /// Read this measurement from a peak row.
    pub fn value_of(self, row: &PeakRow) -> f64 {
        match self {
            Measurement::Area => row.area as f64,
            Measurement::AreaPercent => row.area_percent,
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Measurement {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "area" => Ok(Measurement::Area),
            "area%" | "area-percent" | "area_percent" | "areapercent" => {
                Ok(Measurement::AreaPercent)
            }
            other => Err(format!("unknown measurement '{other}' (expected Area or Area%)")),
        }
    }
}

// ---------------------------------------------------------------------------
// PeakRow / ExtractedFile – one report's validated peak table
// ---------------------------------------------------------------------------

/// One validated row of a report's peak table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRow {
    /// Retention time in minutes.
    pub retention_time: f64,
    pub area: i64,
    /// 0–100.
    pub area_percent: f64,
}

/// The peak table of a single report together with its source identity.
///
/// An `ExtractedFile` with no rows means the first page carried no table;
/// it is a valid result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFile {
    /// Source path exactly as it was handed to the extractor.
    pub source: String,
    pub rows: Vec<PeakRow>,
}

impl ExtractedFile {
    pub fn new(source: impl Into<String>, rows: Vec<PeakRow>) -> Self {
        Self {
            source: source.into(),
            rows,
        }
    }

    /// A result for a page without a detectable table.
    pub fn empty(source: impl Into<String>) -> Self {
        Self::new(source, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FeatureMatrix – the wide table handed to plotting / statistics
// ---------------------------------------------------------------------------

/// A rectangular `files × features` table.
///
/// Every row has exactly `columns.len()` values; observations that are
/// absent for a file are stored as `0.0`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    /// Feature column labels (excludes the `file` column).
    pub columns: Vec<String>,
    /// Source identity of each row.
    pub files: Vec<String>,
    /// Row-major values, `values[row][column]`.
    pub values: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Name of the designated non-numeric identity column.
    pub const FILE_COLUMN: &'static str = "file";

    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            columns,
            files: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a row. Short rows are zero-padded, long rows truncated, so the
    /// matrix always stays rectangular.
    pub fn push_row(&mut self, file: impl Into<String>, mut values: Vec<f64>) {
        values.resize(self.columns.len(), 0.0);
        self.files.push(file.into());
        self.values.push(values);
    }

    /// Number of rows (files or records).
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of numeric feature columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Full header including the leading `file` column.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once(Self::FILE_COLUMN)
            .chain(self.columns.iter().map(String::as_str))
            .collect()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Look up one cell by file identity and column label.
    pub fn value(&self, file: &str, column: &str) -> Option<f64> {
        let row = self.files.iter().position(|f| f == file)?;
        let col = self.column_index(column)?;
        self.values.get(row)?.get(col).copied()
    }
}

// ---------------------------------------------------------------------------
// Batch results
// ---------------------------------------------------------------------------

/// Why a file did not contribute a row to the matrix.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionReason {
    /// The file was read fine but had nothing to extract.
    NoData,
    /// Extraction failed; the message is the rendered error.
    Failed(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::NoData => f.write_str("no peak table found"),
            ExclusionReason::Failed(msg) => f.write_str(msg),
        }
    }
}

/// A file left out of a batch, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedFile {
    pub path: String,
    pub reason: ExclusionReason,
}

/// Outcome of one extraction pass over a batch of files.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub matrix: FeatureMatrix,
    /// X coordinate of each feature column (bin centre, or column ordinal for
    /// plain tables), for plotting rows as curves.
    pub positions: Vec<f64>,
    pub excluded: Vec<ExcludedFile>,
}

impl BatchOutcome {
    /// A one-line warning naming every excluded file, if any.
    pub fn warning(&self) -> Option<String> {
        if self.excluded.is_empty() {
            return None;
        }
        let names: Vec<String> = self
            .excluded
            .iter()
            .map(|e| format!("{} ({})", e.path, e.reason))
            .collect();
        Some(format!(
            "{} file(s) excluded: {}",
            self.excluded.len(),
            names.join("; ")
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measurement_parses_report_headers() {
        assert_eq!("Area".parse::<Measurement>(), Ok(Measurement::Area));
        assert_eq!("Area%".parse::<Measurement>(), Ok(Measurement::AreaPercent));
        assert_eq!("area_percent".parse::<Measurement>(), Ok(Measurement::AreaPercent));
        assert!("Height".parse::<Measurement>().is_err());
    }

    #[test]
    fn push_row_keeps_matrix_rectangular() {
        let mut m = FeatureMatrix::with_columns(vec!["a".into(), "b".into(), "c".into()]);
        m.push_row("one", vec![1.0]);
        m.push_row("two", vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(m.values[0], vec![1.0, 0.0, 0.0]);
        assert_eq!(m.values[1], vec![1.0, 2.0, 3.0]);
        assert_eq!(m.header(), vec!["file", "a", "b", "c"]);
        assert_eq!(m.value("two", "c"), Some(3.0));
        assert_eq!(m.value("three", "c"), None);
    }

    #[test]
    fn warning_lists_excluded_files() {
        let outcome = BatchOutcome {
            matrix: FeatureMatrix::default(),
            positions: Vec::new(),
            excluded: vec![
                ExcludedFile {
                    path: "b.pdf".into(),
                    reason: ExclusionReason::NoData,
                },
                ExcludedFile {
                    path: "c.pdf".into(),
                    reason: ExclusionReason::Failed("broken xref".into()),
                },
            ],
        };
        let msg = outcome.warning().unwrap();
        assert!(msg.starts_with("2 file(s) excluded"));
        assert!(msg.contains("b.pdf (no peak table found)"));
        assert!(msg.contains("c.pdf (broken xref)"));
        assert!(BatchOutcome::default().warning().is_none());
    }
}
