use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::BinSettings;
use crate::error::{ExtractError, Result};

use super::cache::ExtractionCache;
use super::model::{
    BatchOutcome, ExcludedFile, ExclusionReason, ExtractedFile, FeatureMatrix, Measurement,
};
use super::pdf::PeakExtractor;

// ---------------------------------------------------------------------------
// RetentionBins – equal-width, right-closed intervals over the RT axis
// ---------------------------------------------------------------------------

/// `len()` equal-width intervals `(lo, hi]` covering a retention-time range.
///
/// The lowest edge sits 0.1 % of the range below the minimum so the minimum
/// itself falls into the first interval.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionBins {
    edges: Vec<f64>,
    precision: usize,
}

impl RetentionBins {
    /// Build `count` bins spanning `[min, max]`. `count` must be non-zero.
    pub fn spanning(min: f64, max: f64, count: usize) -> Self {
        let count = count.max(1);
        let (lo, hi, widened) = if max > min {
            (min, max, false)
        } else {
            let pad = if min == 0.0 { 0.001 } else { 0.001 * min.abs() };
            (min - pad, max + pad, true)
        };

        let step = (hi - lo) / count as f64;
        let mut edges: Vec<f64> = (0..=count).map(|i| lo + step * i as f64).collect();
        edges[count] = hi;
        if !widened {
            edges[0] -= (hi - lo) * 0.001;
        }

        let precision = label_precision(&edges);
        Self { edges, precision }
    }

    /// Number of intervals.
    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interval containing `x`, or `None` outside the covered range.
    pub fn index_of(&self, x: f64) -> Option<usize> {
        let first = *self.edges.first()?;
        let last = *self.edges.last()?;
        if !(x > first && x <= last) {
            return None;
        }
        let upper = self.edges.partition_point(|e| *e < x);
        Some(upper.clamp(1, self.len()) - 1)
    }

    /// Column label of interval `i`, printed the way pandas prints a `cut`
    /// interval, e.g. `(0.996, 2.0]` or `(0.0123, 0.0312]`.
    pub fn label(&self, i: usize) -> String {
        let p = self.precision;
        format!(
            "({}, {}]",
            format_edge(round_frac(self.edges[i], p)),
            format_edge(round_frac(self.edges[i + 1], p))
        )
    }

    /// Midpoint of interval `i`, used as the plot x coordinate.
    pub fn center(&self, i: usize) -> f64 {
        (self.edges[i] + self.edges[i + 1]) / 2.0
    }
}

/// Smallest precision from 3 up at which no two edges round to the same
/// value.
fn label_precision(edges: &[f64]) -> usize {
    (3..20)
        .find(|&p| {
            edges
                .windows(2)
                .all(|w| round_frac(w[0], p) != round_frac(w[1], p))
        })
        .unwrap_or(3)
}

/// `precision` decimals, or `precision` significant digits when the value
/// has no integer part. Whole numbers are left alone.
fn round_frac(x: f64, precision: usize) -> f64 {
    if !x.is_finite() || x.fract() == 0.0 {
        return x;
    }
    let digits = if x.trunc() == 0.0 {
        precision as i32 - 1 - x.abs().log10().floor() as i32
    } else {
        precision as i32
    };
    if digits > 15 {
        return x;
    }
    let scale = 10f64.powi(digits);
    (x * scale).round() / scale
}

/// Shortest round-trip form, keeping one decimal on whole numbers.
fn format_edge(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{x:.1}")
    } else {
        x.to_string()
    }
}

// ---------------------------------------------------------------------------
// Pivot
// ---------------------------------------------------------------------------

/// A pivoted batch together with the binning that produced it.
#[derive(Debug, Clone, Default)]
pub struct Pivot {
    pub matrix: FeatureMatrix,
    /// Centre retention time of each matrix column.
    pub positions: Vec<f64>,
    pub bins: Option<RetentionBins>,
}

/// Reshape per-file peak tables into a `files × bins` matrix.
///
/// Bin edges are computed once over every row of every file, so a given
/// retention time lands in the same column for all files. Peaks of one file
/// that share a bin are summed; bins without a peak are `0.0`.
pub fn pivot_peaks(
    files: &[ExtractedFile],
    measurement: Measurement,
    settings: &BinSettings,
) -> Pivot {
    let (min, max) = files
        .iter()
        .flat_map(|f| f.rows.iter())
        .map(|r| r.retention_time)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), rt| {
            (lo.min(rt), hi.max(rt))
        });
    if !min.is_finite() || !max.is_finite() {
        return Pivot::default();
    }

    let bins = RetentionBins::spanning(min, max, settings.bin_count);
    let mut dense: Vec<Vec<f64>> = Vec::with_capacity(files.len());
    let mut occupied = vec![settings.keep_empty_bins; bins.len()];
    for file in files {
        let mut row = vec![0.0; bins.len()];
        for peak in &file.rows {
            if let Some(i) = bins.index_of(peak.retention_time) {
                row[i] += measurement.value_of(peak);
                occupied[i] = true;
            }
        }
        dense.push(row);
    }

    let keep: Vec<usize> = (0..bins.len()).filter(|&i| occupied[i]).collect();
    let mut matrix = FeatureMatrix::with_columns(keep.iter().map(|&i| bins.label(i)).collect());
    for (file, row) in files.iter().zip(dense) {
        matrix.push_row(file.source.clone(), keep.iter().map(|&i| row[i]).collect());
    }
    Pivot {
        positions: keep.iter().map(|&i| bins.center(i)).collect(),
        matrix,
        bins: Some(bins),
    }
}

// ---------------------------------------------------------------------------
// Batch aggregation
// ---------------------------------------------------------------------------

/// Drop repeated paths, keeping the first occurrence.
pub(crate) fn unique_paths(paths: &[PathBuf]) -> Vec<&Path> {
    let mut seen = HashSet::new();
    paths
        .iter()
        .filter(|p| {
            let fresh = seen.insert(p.as_path());
            if !fresh {
                log::warn!("{} listed twice; processing it once", p.display());
            }
            fresh
        })
        .map(PathBuf::as_path)
        .collect()
}

pub(crate) fn excluded_for(path: &Path, err: &ExtractError) -> ExcludedFile {
    log::warn!("excluding {}: {err}", path.display());
    ExcludedFile {
        path: path.to_string_lossy().into_owned(),
        reason: ExclusionReason::Failed(err.to_string()),
    }
}

/// Runs cache-or-extract over a batch of reports and pivots the result.
pub struct Aggregator<'a> {
    cache: &'a ExtractionCache,
    extractor: &'a dyn PeakExtractor,
    bins: BinSettings,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        cache: &'a ExtractionCache,
        extractor: &'a dyn PeakExtractor,
        bins: BinSettings,
    ) -> Self {
        Self {
            cache,
            extractor,
            bins,
        }
    }

    /// Extract every file, skipping the ones that fail or carry no table,
    /// and pivot the rest. Rows follow the order files were processed in.
    pub fn aggregate(&self, paths: &[PathBuf], measurement: Measurement) -> Result<BatchOutcome> {
        if paths.is_empty() {
            return Err(ExtractError::EmptyBatch);
        }

        let mut files = Vec::new();
        let mut excluded = Vec::new();
        for path in unique_paths(paths) {
            match self.cache.get_or_compute(path, self.extractor) {
                Ok(file) if file.is_empty() => {
                    log::warn!("excluding {}: no peak table", path.display());
                    excluded.push(ExcludedFile {
                        path: path.to_string_lossy().into_owned(),
                        reason: ExclusionReason::NoData,
                    });
                }
                Ok(file) => files.push(file),
                Err(e) => excluded.push(excluded_for(path, &e)),
            }
        }

        if files.is_empty() {
            return Err(ExtractError::NothingExtracted { excluded });
        }

        let pivot = pivot_peaks(&files, measurement, &self.bins);
        log::info!(
            "pivoted {} file(s) on {} into {} column(s)",
            pivot.matrix.len(),
            measurement,
            pivot.matrix.width()
        );
        Ok(BatchOutcome {
            matrix: pivot.matrix,
            positions: pivot.positions,
            excluded,
        })
    }
}
