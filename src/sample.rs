//! Synthetic chromatography reports.
//!
//! Writes single-page PDFs laid out like an LC/GC data-system printout: a
//! title block followed by a peak table with a `<Peak Table>` caption, a
//! detector line, the column header, one row per peak and a `Total` row.
//! Used by the `generate_sample` binary and by the integration tests.

use std::path::Path;

use anyhow::{Context, Result};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const FONT_SIZE: i64 = 9;
const LINE: i64 = 14;
const TABLE_TOP: i64 = 600;
/// Distance from a row's top rule down to its text baseline.
const ABOVE_BASELINE: i64 = 9;

/// Left edge of each peak-table column and the box borders.
const COLUMNS: [i64; 5] = [60, 130, 210, 290, 370];
const BOX_LEFT: i64 = 50;
const BOX_RIGHT: i64 = 450;
const SEPARATORS: [i64; 6] = [BOX_LEFT, 120, 200, 280, 360, BOX_RIGHT];

const HEADER: [&str; 5] = ["Peak#", "Ret. Time", "Area", "Height", "Area%"];

/// How the peak table is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableStyle {
    /// Horizontal and vertical rules around and between the cells.
    #[default]
    Ruled,
    /// Text only, columns aligned by position.
    Borderless,
    /// No peak table at all, just a note below the title block.
    Omitted,
}

/// One peak as printed in the report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePeak {
    pub retention_time: f64,
    pub area: i64,
    pub height: i64,
}

impl SamplePeak {
    /// A peak whose height follows from a gaussian of width `sigma` minutes.
    pub fn gaussian(retention_time: f64, area: i64, sigma: f64) -> Self {
        let height = area as f64 / (sigma * 60.0 * (2.0 * std::f64::consts::PI).sqrt());
        Self {
            retention_time,
            area,
            height: height.round() as i64,
        }
    }
}

/// Builder for one report page.
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    sample_name: String,
    detector: String,
    style: TableStyle,
    peaks: Vec<SamplePeak>,
}

impl ReportBuilder {
    pub fn new(sample_name: impl Into<String>) -> Self {
        Self {
            sample_name: sample_name.into(),
            detector: "Detector A 254nm".to_string(),
            style: TableStyle::Ruled,
            peaks: Vec::new(),
        }
    }

    pub fn style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    pub fn detector(mut self, detector: impl Into<String>) -> Self {
        self.detector = detector.into();
        self
    }

    pub fn peak(mut self, retention_time: f64, area: i64) -> Self {
        self.peaks.push(SamplePeak::gaussian(retention_time, area, 0.05));
        self
    }

    pub fn peaks(mut self, peaks: impl IntoIterator<Item = SamplePeak>) -> Self {
        self.peaks.extend(peaks);
        self
    }

    /// `Area%` of every peak, rounded the way the report prints it.
    pub fn area_percents(&self) -> Vec<f64> {
        let total: i64 = self.peaks.iter().map(|p| p.area).sum();
        self.peaks
            .iter()
            .map(|p| {
                let pct = if total == 0 {
                    0.0
                } else {
                    p.area as f64 * 100.0 / total as f64
                };
                (pct * 1000.0).round() / 1000.0
            })
            .collect()
    }

    fn content(&self) -> Content {
        let mut ops = Vec::new();

        text(&mut ops, 60, 780, 14, "Analysis Report");
        text(&mut ops, 60, 760, FONT_SIZE, &format!("Sample Name: {}", self.sample_name));
        text(&mut ops, 60, 746, FONT_SIZE, "Method: synthetic gradient");

        if self.style == TableStyle::Omitted {
            text(&mut ops, 60, 700, FONT_SIZE, "No peaks were integrated for this run.");
            return Content { operations: ops };
        }

        // Baselines of every table row, caption first.
        let mut baselines = Vec::with_capacity(self.peaks.len() + 4);
        let mut y = TABLE_TOP - ABOVE_BASELINE;
        text(&mut ops, COLUMNS[0], y, FONT_SIZE, "<Peak Table>");
        baselines.push(y);
        y -= LINE;
        text(&mut ops, COLUMNS[0], y, FONT_SIZE, &self.detector);
        baselines.push(y);
        y -= LINE;
        for (x, label) in COLUMNS.iter().zip(HEADER) {
            text(&mut ops, *x, y, FONT_SIZE, label);
        }
        baselines.push(y);

        let percents = self.area_percents();
        for (i, (peak, pct)) in self.peaks.iter().zip(&percents).enumerate() {
            y -= LINE;
            let cells = [
                (i + 1).to_string(),
                format!("{:.3}", peak.retention_time),
                peak.area.to_string(),
                peak.height.to_string(),
                format!("{pct:.3}"),
            ];
            for (x, cell) in COLUMNS.iter().zip(&cells) {
                text(&mut ops, *x, y, FONT_SIZE, cell);
            }
            baselines.push(y);
        }

        y -= LINE;
        let area: i64 = self.peaks.iter().map(|p| p.area).sum();
        let height: i64 = self.peaks.iter().map(|p| p.height).sum();
        let totals = [
            (COLUMNS[0], "Total".to_string()),
            (COLUMNS[2], area.to_string()),
            (COLUMNS[3], height.to_string()),
            (COLUMNS[4], "100.000".to_string()),
        ];
        for (x, cell) in &totals {
            text(&mut ops, *x, y, FONT_SIZE, cell);
        }
        baselines.push(y);
        let bottom = y - (LINE - ABOVE_BASELINE);

        // Full grid: a rule above every row, one below the last, and every
        // column separator from top to bottom.
        if self.style == TableStyle::Ruled {
            ops.push(Operation::new("w", vec![Object::Real(0.5)]));
            for rule_y in baselines.iter().map(|b| b + ABOVE_BASELINE).chain([bottom]) {
                line(&mut ops, (BOX_LEFT, rule_y), (BOX_RIGHT, rule_y));
            }
            for x in SEPARATORS {
                line(&mut ops, (x, bottom), (x, TABLE_TOP));
            }
            ops.push(Operation::new("S", vec![]));
        }

        Content { operations: ops }
    }

    /// Assemble the one-page document.
    pub fn build(&self) -> Result<Document> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });
        let encoded = self.content().encode().context("encoding page content")?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        Ok(doc)
    }

    /// The serialized document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut doc = self.build()?;
        let mut buf = Vec::new();
        doc.save_to(&mut buf).context("serializing report")?;
        Ok(buf)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let mut doc = self.build()?;
        doc.save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

fn text(ops: &mut Vec<Operation>, x: i64, y: i64, size: i64, s: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec!["F1".into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new("Tj", vec![Object::string_literal(s)]));
    ops.push(Operation::new("ET", vec![]));
}

fn line(ops: &mut Vec<Operation>, from: (i64, i64), to: (i64, i64)) {
    ops.push(Operation::new("m", vec![from.0.into(), from.1.into()]));
    ops.push(Operation::new("l", vec![to.0.into(), to.1.into()]));
}

// ---------------------------------------------------------------------------
// Deterministic peak lists
// ---------------------------------------------------------------------------

/// Minimal deterministic PRNG (xoshiro256**)
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5)).rotate_left(7).wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    pub fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// A compound of the synthetic mixture: nominal retention time (min) and
/// typical area.
pub type Compound = (f64, f64);

pub const MIXTURE: [Compound; 6] = [
    (1.25, 52_000.0),
    (2.10, 18_500.0),
    (3.87, 34_000.0),
    (5.42, 9_800.0),
    (7.05, 61_000.0),
    (9.30, 12_400.0),
];

/// Peaks for one injection: retention times drift a little, areas scale
/// with `concentration`, and a compound is occasionally missed.
pub fn injection(rng: &mut SimpleRng, compounds: &[Compound], concentration: f64) -> Vec<SamplePeak> {
    let mut peaks = Vec::with_capacity(compounds.len());
    for &(rt, area) in compounds {
        if rng.next_f64() < 0.1 {
            continue;
        }
        let rt = rng.gauss(rt, 0.01).max(0.001);
        let area = rng.gauss(area * concentration, area * concentration * 0.03).max(1.0);
        peaks.push(SamplePeak::gaussian(rt, area.round() as i64, 0.04));
    }
    peaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ExtractedFile;
    use crate::data::pdf::PdfPeakExtractor;

    fn read_back(builder: &ReportBuilder) -> crate::error::Result<ExtractedFile> {
        let bytes = builder.to_bytes().unwrap();
        PdfPeakExtractor::default().extract_bytes(&bytes, Path::new("std-1.pdf"))
    }

    fn two_peaks() -> ReportBuilder {
        ReportBuilder::new("std-1").peak(1.254, 51234).peak(3.871, 34001)
    }

    #[test]
    fn ruled_report_reads_back() {
        let builder = two_peaks();
        let file = read_back(&builder).unwrap();
        assert_eq!(file.source, "std-1.pdf");
        assert_eq!(file.len(), 2);
        assert_eq!(file.rows[0].retention_time, 1.254);
        assert_eq!(file.rows[1].area, 34001);
        assert_eq!(file.rows[0].area_percent, builder.area_percents()[0]);
        assert_eq!(file.rows[0].area_percent, 60.109);
    }

    #[test]
    fn long_detector_name_does_not_disturb_the_grid() {
        let builder = two_peaks().detector("Detector B Ch2 280nm reference 360nm bw 100");
        assert_eq!(read_back(&builder).unwrap().len(), 2);
    }

    #[test]
    fn borderless_report_never_fails() {
        // Without rules only a text-aligned candidate carrying the full
        // header is accepted, so the page yields rows or nothing.
        assert!(read_back(&two_peaks().style(TableStyle::Borderless)).is_ok());
    }

    #[test]
    fn omitted_table_reads_as_empty() {
        let file = read_back(&two_peaks().style(TableStyle::Omitted)).unwrap();
        assert!(file.is_empty());
    }

    #[test]
    fn rng_is_deterministic() {
        let a = injection(&mut SimpleRng::new(7), &MIXTURE, 1.0);
        let b = injection(&mut SimpleRng::new(7), &MIXTURE, 1.0);
        assert_eq!(a, b);
        assert!(a.iter().all(|p| p.area > 0 && p.retention_time > 0.0));
    }
}
