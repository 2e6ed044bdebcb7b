//! Rasterises charts with `plotters` for PNG export and the clipboard.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use plotters::coord::types::{RangedCoordf64, RangedCoordi32};
use plotters::coord::ranged1d::SegmentedCoord;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::error::{Result, StatError};
use crate::processing::correlation::CorrelationMatrix;
use crate::processing::distribution::{BoxStats, Histogram, Violin};
use crate::render::chart::{Chart, ChartBody, Layer};
use crate::state::palette;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub scale: f32,
    pub annotate_heatmap: bool,
}

fn chart_error<E: std::fmt::Display>(e: E) -> StatError {
    StatError::Chart(e.to_string())
}

fn label_area(font: f64, lines: f64) -> u32 {
    (font * lines).round() as u32
}

fn rgb(c: [u8; 3]) -> RGBColor {
    RGBColor(c[0], c[1], c[2])
}

/// Output size in pixels for a chart at the given scale.
pub fn pixel_size(chart: &Chart, scale: f32) -> (u32, u32) {
    let scale = scale.clamp(0.25, 8.0);
    let w = (chart.width as f32 * scale).round().max(1.0) as u32;
    let h = (chart.height as f32 * scale).round().max(1.0) as u32;
    (w, h)
}

/// Render to a packed RGB buffer.
pub fn render_rgb(chart: &Chart, options: RenderOptions) -> Result<(u32, u32, Vec<u8>)> {
    let (width, height) = pixel_size(chart, options.scale);
    let mut buffer = vec![0u8; (width * height * 3) as usize];
    let font = f64::from(16.0 * options.scale).round().max(8.0);

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        match &chart.body {
            ChartBody::Histogram(layers) => draw_histogram(&root, &chart.title, layers, font)?,
            ChartBody::Density(layers) => draw_density(&root, &chart.title, layers, font)?,
            ChartBody::Box(layer) => draw_box(&root, &chart.title, layer, font)?,
            ChartBody::Violin(layer) => draw_violin(&root, &chart.title, layer, font)?,
            ChartBody::Heatmap(matrix) => {
                draw_heatmap(&root, &chart.title, matrix, font, options.annotate_heatmap)?
            }
        }

        root.present().map_err(chart_error)?;
    }

    Ok((width, height, buffer))
}

/// Write `<dir>/<chart file name>` and return the path.
pub fn save_png(chart: &Chart, dir: &Path, options: RenderOptions) -> Result<PathBuf> {
    let (width, height, buffer) = render_rgb(chart, options)?;
    let image = image::RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| StatError::Chart("image buffer has the wrong size".to_string()))?;
    let path = dir.join(&chart.file_name);
    image.save(&path)?;
    tracing::info!("Saved chart to {:?}", path);
    Ok(path)
}

pub fn save_all(charts: &[Chart], dir: &Path, options: RenderOptions) -> Result<Vec<PathBuf>> {
    charts.iter().map(|c| save_png(c, dir, options)).collect()
}

pub fn copy_to_clipboard(chart: &Chart, options: RenderOptions) -> Result<()> {
    let (width, height, buffer) = render_rgb(chart, options)?;
    let rgba: Vec<u8> = buffer
        .chunks_exact(3)
        .flat_map(|p| [p[0], p[1], p[2], 255])
        .collect();

    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_image(arboard::ImageData {
        width: width as usize,
        height: height as usize,
        bytes: Cow::Owned(rgba),
    })?;
    tracing::info!("Copied '{}' to clipboard", chart.title);
    Ok(())
}

fn draw_histogram(root: &Area<'_>, title: &str, layers: &[Layer<Histogram>], font: f64) -> Result<()> {
    let x_min = layers
        .iter()
        .filter_map(|l| l.data.edges.first())
        .copied()
        .fold(f64::INFINITY, f64::min);
    let x_max = layers
        .iter()
        .filter_map(|l| l.data.edges.last())
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let y_max = layers.iter().map(|l| l.data.max_count()).max().unwrap_or(1).max(1) as f64 * 1.05;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", font))
        .margin(10)
        .x_label_area_size(label_area(font, 2.0))
        .y_label_area_size(label_area(font, 3.0))
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .y_desc("Count")
        .draw()
        .map_err(chart_error)?;

    for layer in layers {
        let fill = rgb(layer.color);
        let edge = rgb(palette::darken(layer.color, 0.7));
        chart
            .draw_series(layer.data.bins().map(|(left, right, count)| {
                Rectangle::new([(left, 0.0), (right, count as f64)], fill.mix(0.7).filled())
            }))
            .map_err(chart_error)?
            .label(layer.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], fill.filled()));
        chart
            .draw_series(layer.data.bins().map(|(left, right, count)| {
                Rectangle::new([(left, 0.0), (right, count as f64)], edge.stroke_width(1))
            }))
            .map_err(chart_error)?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;
    Ok(())
}

fn draw_density(
    root: &Area<'_>,
    title: &str,
    layers: &[Layer<Vec<[f64; 2]>>],
    font: f64,
) -> Result<()> {
    let points = layers.iter().flat_map(|l| l.data.iter());
    let (x_min, x_max, y_max) = points.fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0_f64),
        |(lo, hi, top), p| (lo.min(p[0]), hi.max(p[0]), top.max(p[1])),
    );

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", font))
        .margin(10)
        .x_label_area_size(label_area(font, 2.0))
        .y_label_area_size(label_area(font, 3.0))
        .build_cartesian_2d(x_min..x_max, 0.0..(y_max * 1.05).max(f64::EPSILON))
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .y_desc("Density")
        .draw()
        .map_err(chart_error)?;

    for layer in layers {
        let color = rgb(layer.color);
        let mut outline: Vec<(f64, f64)> = layer.data.iter().map(|p| (p[0], p[1])).collect();
        if let (Some(first), Some(last)) = (layer.data.first(), layer.data.last()) {
            outline.push((last[0], 0.0));
            outline.push((first[0], 0.0));
        }
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.5).filled())))
            .map_err(chart_error)?;
        chart
            .draw_series(LineSeries::new(
                layer.data.iter().map(|p| (p[0], p[1])),
                rgb(palette::darken(layer.color, 0.7)).stroke_width(2),
            ))
            .map_err(chart_error)?
            .label(layer.label.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(chart_error)?;
    Ok(())
}

/// Vertical value range covering the whiskers and outliers, padded.
fn value_range(stats: &BoxStats, extra: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = stats
        .outliers
        .iter()
        .copied()
        .chain(extra)
        .chain([stats.lower_whisker, stats.upper_whisker])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(0.5);
    (lo - pad, hi + pad)
}

fn draw_box(root: &Area<'_>, title: &str, layer: &Layer<BoxStats>, font: f64) -> Result<()> {
    let stats = &layer.data;
    let (lo, hi) = value_range(stats, std::iter::empty());

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", font))
        .margin(10)
        .x_label_area_size(label_area(font, 1.0))
        .y_label_area_size(label_area(font, 3.0))
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc(layer.label.as_str())
        .draw()
        .map_err(chart_error)?;

    draw_box_glyph(&mut chart, stats, layer.color, 0.3, 0.7)?;
    Ok(())
}

fn draw_box_glyph(
    chart: &mut ChartContext<'_, BitMapBackend<'_>, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
    stats: &BoxStats,
    color: [u8; 3],
    left: f64,
    right: f64,
) -> Result<()> {
    let fill = rgb(color);
    let edge = rgb(palette::darken(color, 0.55));
    let mid = (left + right) / 2.0;
    let cap = (right - left) / 4.0;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            fill.filled(),
        )))
        .map_err(chart_error)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(left, stats.q1), (right, stats.q3)],
            edge.stroke_width(2),
        )))
        .map_err(chart_error)?;

    let segments = [
        vec![(left, stats.median), (right, stats.median)],
        vec![(mid, stats.q1), (mid, stats.lower_whisker)],
        vec![(mid, stats.q3), (mid, stats.upper_whisker)],
        vec![(mid - cap, stats.lower_whisker), (mid + cap, stats.lower_whisker)],
        vec![(mid - cap, stats.upper_whisker), (mid + cap, stats.upper_whisker)],
    ];
    chart
        .draw_series(segments.into_iter().map(|s| PathElement::new(s, edge.stroke_width(2))))
        .map_err(chart_error)?;
    chart
        .draw_series(
            stats
                .outliers
                .iter()
                .map(|&v| Circle::new((mid, v), 3, edge.filled())),
        )
        .map_err(chart_error)?;
    Ok(())
}

fn draw_violin(root: &Area<'_>, title: &str, layer: &Layer<Violin>, font: f64) -> Result<()> {
    let violin = &layer.data;
    let (lo, hi) = value_range(&violin.inner, violin.outline.iter().map(|p| p[0]));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", font))
        .margin(10)
        .x_label_area_size(label_area(font, 1.0))
        .y_label_area_size(label_area(font, 3.0))
        .build_cartesian_2d(0.0..1.0, lo..hi)
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .y_desc(layer.label.as_str())
        .draw()
        .map_err(chart_error)?;

    let half = 0.4;
    let mut outline: Vec<(f64, f64)> = violin
        .outline
        .iter()
        .map(|[v, w]| (0.5 + w * half, *v))
        .collect();
    outline.extend(violin.outline.iter().rev().map(|[v, w]| (0.5 - w * half, *v)));

    let fill = rgb(layer.color);
    let edge = rgb(palette::darken(layer.color, 0.55));
    chart
        .draw_series(std::iter::once(Polygon::new(outline.clone(), fill.filled())))
        .map_err(chart_error)?;
    outline.push(outline[0]);
    chart
        .draw_series(std::iter::once(PathElement::new(outline, edge.stroke_width(1))))
        .map_err(chart_error)?;

    let inner = &violin.inner;
    chart
        .draw_series([
            PathElement::new(
                vec![(0.5, inner.lower_whisker), (0.5, inner.upper_whisker)],
                edge.stroke_width(1),
            ),
            PathElement::new(vec![(0.5, inner.q1), (0.5, inner.q3)], edge.stroke_width(6)),
        ])
        .map_err(chart_error)?;
    chart
        .draw_series(std::iter::once(Circle::new((0.5, inner.median), 3, WHITE.filled())))
        .map_err(chart_error)?;
    Ok(())
}

/// Category axis with exactly `n` cells.
fn heatmap_axis(n: i32) -> SegmentedCoord<RangedCoordi32> {
    (0..n - 1).into_segmented()
}

fn draw_heatmap(
    root: &Area<'_>,
    title: &str,
    matrix: &CorrelationMatrix,
    font: f64,
    annotate: bool,
) -> Result<()> {
    let n = matrix.size() as i32;
    let labels = &matrix.labels;
    let label_at = |value: &SegmentValue<i32>, flip: bool| -> String {
        match value {
            SegmentValue::CenterOf(i) => {
                let idx = if flip { n - 1 - i } else { *i };
                labels.get(idx as usize).cloned().unwrap_or_default()
            }
            _ => String::new(),
        }
    };

    let body = root.titled(title, ("sans-serif", font)).map_err(chart_error)?;
    let (width, _) = body.dim_in_pixel();
    let bar_width = label_area(font, 4.5).min(width / 4);
    let (cells_area, bar_area) = body.split_horizontally(width - bar_width);

    let mut chart = ChartBuilder::on(&cells_area)
        .margin(10)
        .x_label_area_size(label_area(font, 2.0))
        .y_label_area_size(label_area(font, 5.0))
        .build_cartesian_2d(heatmap_axis(n), heatmap_axis(n))
        .map_err(chart_error)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n as usize)
        .y_labels(n as usize)
        .x_label_formatter(&|v| label_at(v, false))
        .y_label_formatter(&|v| label_at(v, true))
        .draw()
        .map_err(chart_error)?;

    // Lower triangle only; row 0 is drawn at the top.
    let cells: Vec<(i32, i32, f64)> = (0..n)
        .flat_map(|row| (0..row).map(move |col| (row, col)))
        .filter_map(|(row, col)| {
            let r = matrix.get(row as usize, col as usize)?;
            Some((row, col, r))
        })
        .collect();

    chart
        .draw_series(cells.iter().map(|&(row, col, r)| {
            let y = n - 1 - row;
            Rectangle::new(
                [
                    (SegmentValue::Exact(col), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(col + 1), SegmentValue::Exact(y + 1)),
                ],
                rgb(palette::correlation_color(r)).filled(),
            )
        }))
        .map_err(chart_error)?;

    if annotate {
        chart
            .draw_series(cells.iter().map(|&(row, col, r)| {
                let text_color = rgb(palette::contrast_text(palette::correlation_color(r)));
                let style = ("sans-serif", font)
                    .into_font()
                    .color(&text_color)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                Text::new(
                    format!("{r:.2}"),
                    (SegmentValue::CenterOf(col), SegmentValue::CenterOf(n - 1 - row)),
                    style,
                )
            }))
            .map_err(chart_error)?;
    }

    draw_color_scale(&bar_area, font)
}

/// Vertical colour bar for the fixed [-1, 1] correlation scale.
fn draw_color_scale(area: &Area<'_>, font: f64) -> Result<()> {
    const STEPS: usize = 100;

    let mut bar = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(label_area(font, 2.0))
        .y_label_area_size(label_area(font, 2.5))
        .build_cartesian_2d(0.0..1.0, -1.0..1.0)
        .map_err(chart_error)?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_labels(5)
        .y_label_formatter(&|v| format!("{v:.1}"))
        .label_style(("sans-serif", font * 0.8))
        .draw()
        .map_err(chart_error)?;

    let step = 2.0 / STEPS as f64;
    bar.draw_series((0..STEPS).map(|i| {
        let lo = -1.0 + step * i as f64;
        Rectangle::new(
            [(0.0, lo), (1.0, lo + step)],
            rgb(palette::correlation_color(lo + step / 2.0)).filled(),
        )
    }))
    .map_err(chart_error)?;
    Ok(())
}
