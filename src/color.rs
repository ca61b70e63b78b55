use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: source file → Color32
// ---------------------------------------------------------------------------

/// One colour per source file of the current matrix.
#[derive(Debug, Clone, Default)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
}

impl ColorMap {
    /// Distinct files in first-seen order each get the next hue.
    pub fn new<'a>(files: impl IntoIterator<Item = &'a str>) -> Self {
        let mut distinct: Vec<&str> = Vec::new();
        for file in files {
            if !distinct.contains(&file) {
                distinct.push(file);
            }
        }
        let palette = generate_palette(distinct.len());
        let mapping = distinct
            .into_iter()
            .zip(palette)
            .map(|(f, c)| (f.to_string(), c))
            .collect();
        ColorMap { mapping }
    }

    pub fn color_for(&self, file: &str) -> Color32 {
        self.mapping.get(file).copied().unwrap_or(Color32::GRAY)
    }
}
