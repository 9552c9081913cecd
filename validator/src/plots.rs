use anyhow::Result;
use plotters::prelude::*;
use rand::Rng;
use std::path::Path;
use tracing::info;

use crate::calibration::ScoredVariant;
use crate::dataset::VariantClass;
use crate::roc::RocPoint;

fn plot_err(e: impl std::fmt::Display) -> anyhow::Error {
    anyhow::anyhow!("plot rendering failed: {}", e)
}

/// Draws the calibration ROC curve with the random baseline.
pub fn draw_roc_plot(output_path: &Path, points: &[RocPoint], auroc: f64) -> Result<()> {
    let caption_font = ("sans-serif bold", 26);
    let axis_font = ("sans-serif", 22);
    let label_font = ("sans-serif bold", 18);

    let curve_colour = RGBColor(196, 30, 58);

    let root = BitMapBackend::new(output_path, (900, 650)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("BRCA1 zero-shot variant classification", caption_font)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("False Positive Rate")
        .y_desc("True Positive Rate")
        .axis_desc_style(axis_font)
        .label_style(label_font)
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            points.iter().map(|p| (p.fpr, p.tpr)),
            curve_colour.stroke_width(3),
        ))
        .map_err(plot_err)?
        .label(format!("Evo 2 delta score (AUC = {:.3})", auroc))
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 25, y)], curve_colour.stroke_width(3))
        });

    chart
        .draw_series(LineSeries::new(
            vec![(0.0, 0.0), (1.0, 1.0)],
            BLACK.mix(0.2).stroke_width(2),
        ))
        .map_err(plot_err)?
        .label("Random (AUC = 0.50)")
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 25, y)], BLACK.mix(0.2).stroke_width(3))
        });

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .legend_area_size(25)
        .position(SeriesLabelPosition::LowerRight)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("ROC curve saved to: {}", output_path.display());
    Ok(())
}

/// Strip-style scatter of delta scores by SNV class, with per-class
/// medians and the calibrated threshold marked.
pub fn draw_delta_distribution(
    output_path: &Path,
    variants: &[ScoredVariant],
    threshold: f64,
) -> Result<()> {
    let caption_font = ("sans-serif bold", 26);
    let axis_font = ("sans-serif", 22);
    let label_font = ("sans-serif bold", 18);

    let deltas: Vec<f64> = variants.iter().map(|v| v.delta_score).collect();
    let min_d = deltas.iter().cloned().fold(f64::INFINITY, f64::min);
    let max_d = deltas.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max_d - min_d) * 0.05).max(1e-4);

    let root = BitMapBackend::new(output_path, (900, 420)).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Delta likelihood score by BRCA1 SNV class", caption_font)
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(40)
        .build_cartesian_2d((min_d - pad)..(max_d + pad), -0.6f64..1.6f64)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc("Delta likelihood score, Evo 2")
        .axis_desc_style(axis_font)
        .label_style(label_font)
        .y_labels(0)
        .disable_y_mesh()
        .draw()
        .map_err(plot_err)?;

    let mut rng = rand::thread_rng();
    let classes = [
        (VariantClass::FuncInt, 0.0f64, RGBColor(119, 119, 119)),
        (VariantClass::Lof, 1.0f64, RGBColor(214, 39, 40)),
    ];

    for (class, base_y, colour) in classes {
        let xs: Vec<f64> = variants
            .iter()
            .filter(|v| v.record.class == class)
            .map(|v| v.delta_score)
            .collect();

        let jittered: Vec<(f64, f64)> = xs
            .iter()
            .map(|&x| (x, base_y + rng.gen_range(-0.3..0.3)))
            .collect();

        chart
            .draw_series(
                jittered
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 2, colour.filled())),
            )
            .map_err(plot_err)?
            .label(class.to_string())
            .legend(move |(x, y)| Circle::new((x + 10, y), 4, colour.filled()));

        if let Some(med) = median(&xs) {
            chart
                .draw_series(LineSeries::new(
                    vec![(med, base_y - 0.35), (med, base_y + 0.35)],
                    BLACK.stroke_width(2),
                ))
                .map_err(plot_err)?;
        }
    }

    chart
        .draw_series(LineSeries::new(
            vec![(threshold, -0.6), (threshold, 1.6)],
            BLACK.mix(0.4).stroke_width(1),
        ))
        .map_err(plot_err)?
        .label(format!("Threshold ({:.5})", threshold))
        .legend(|(x, y)| {
            PathElement::new(vec![(x, y), (x + 25, y)], BLACK.mix(0.4).stroke_width(2))
        });

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(&BLACK)
        .label_font(label_font)
        .legend_area_size(25)
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    info!("Delta distribution plot saved to: {}", output_path.display());
    Ok(())
}

fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}
