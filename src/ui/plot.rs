use eframe::egui::Ui;
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Matrix plot (central panel)
// ---------------------------------------------------------------------------

fn scaled(values: &[f64], minmax: bool) -> Vec<f64> {
    if !minmax {
        return values.to_vec();
    }
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if range.abs() < f64::EPSILON {
        vec![0.0; values.len()]
    } else {
        values.iter().map(|&v| (v - min) / range).collect()
    }
}

/// Render every matrix row as a curve over the column positions.
pub fn matrix_plot(ui: &mut Ui, state: &AppState) {
    let outcome = match &state.outcome {
        Some(o) => o,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open reports to build a matrix  (File → Open…)");
            });
            return;
        }
    };

    let (x_label, y_label) = if state.is_chromatogram() {
        let y = state
            .target
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_default();
        ("Retention time (min)".to_string(), y)
    } else {
        ("Column".to_string(), "Value".to_string())
    };

    let matrix = &outcome.matrix;
    Plot::new("matrix_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for (file, values) in matrix.files.iter().zip(&matrix.values) {
                let y_values = scaled(values, state.minmax_scaling);
                let points: PlotPoints = outcome
                    .positions
                    .iter()
                    .zip(y_values.iter())
                    .map(|(&xi, &yi)| [xi, yi])
                    .collect();

                let name = std::path::Path::new(file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone());

                let line = Line::new(points)
                    .name(name)
                    .color(state.color_map.color_for(file))
                    .width(1.5);

                plot_ui.line(line);
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minmax_scaling_maps_to_unit_range() {
        assert_eq!(scaled(&[2.0, 4.0, 6.0], true), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled(&[3.0, 3.0], true), vec![0.0, 0.0]);
        assert_eq!(scaled(&[3.0, 1.0], false), vec![3.0, 1.0]);
    }
}
