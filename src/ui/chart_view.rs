//! Interactive previews of chart specifications with `egui_plot`.

use egui::Color32;
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoint,
    PlotPoints, PlotUi, Points, Polygon, Text,
};

use crate::processing::correlation::CorrelationMatrix;
use crate::processing::distribution::{BoxStats, Histogram, Violin};
use crate::render::chart::{Chart, ChartBody, Layer};
use crate::state::palette;

/// Buttons pressed under a preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartAction {
    None,
    SavePng,
    Copy,
}

fn color(c: [u8; 3]) -> Color32 {
    Color32::from_rgb(c[0], c[1], c[2])
}

/// Show one chart with its title and action buttons.
pub fn show_chart(ui: &mut egui::Ui, chart: &Chart, index: usize, annotate: bool) -> ChartAction {
    let mut action = ChartAction::None;

    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(8))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(&chart.title).strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Copy").on_hover_text("Copy image to clipboard").clicked() {
                        action = ChartAction::Copy;
                    }
                    if ui.button("Save PNG").clicked() {
                        action = ChartAction::SavePng;
                    }
                });
            });

            let plot = Plot::new(("chart", index))
                .height(chart.height as f32)
                .width(ui.available_width().min(chart.width as f32 * 1.5))
                .allow_scroll(false);

            match &chart.body {
                ChartBody::Histogram(layers) => {
                    plot.legend(Legend::default())
                        .y_axis_label("Count")
                        .show(ui, |plot_ui| histogram(plot_ui, layers));
                }
                ChartBody::Density(layers) => {
                    plot.legend(Legend::default())
                        .y_axis_label("Density")
                        .show(ui, |plot_ui| density(plot_ui, layers));
                }
                ChartBody::Box(layer) => {
                    plot.show_x(false)
                        .x_axis_formatter(|_, _| String::new())
                        .y_axis_label(layer.label.clone())
                        .show(ui, |plot_ui| box_plot(plot_ui, layer));
                }
                ChartBody::Violin(layer) => {
                    plot.show_x(false)
                        .x_axis_formatter(|_, _| String::new())
                        .y_axis_label(layer.label.clone())
                        .show(ui, |plot_ui| violin(plot_ui, layer));
                }
                ChartBody::Heatmap(matrix) => {
                    let n = matrix.size();
                    let x_labels = matrix.labels.clone();
                    let y_labels = matrix.labels.clone();
                    let width = (ui.available_width() - COLOR_SCALE_WIDTH)
                        .min(chart.width as f32 * 1.5)
                        .max(120.0);
                    ui.horizontal(|ui| {
                        plot.width(width)
                            .show_grid(false)
                            .data_aspect(1.0)
                            .show_x(false)
                            .show_y(false)
                            .x_axis_formatter(move |mark, _| axis_label(&x_labels, mark.value))
                            .y_axis_formatter(move |mark, _| {
                                axis_label(&y_labels, n as f64 - 1.0 - mark.value)
                            })
                            .x_grid_spacer(unit_grid)
                            .y_grid_spacer(unit_grid)
                            .show(ui, |plot_ui| heatmap(plot_ui, matrix, annotate));
                        color_scale(ui, chart.height as f32);
                    });
                }
            }
        });

    action
}

const COLOR_SCALE_WIDTH: f32 = 64.0;
const COLOR_SCALE_STEPS: usize = 64;

/// Correlation value shown by step `i` of the colour bar, counted from the top.
fn scale_step_value(i: usize) -> f64 {
    1.0 - (i as f64 + 0.5) * 2.0 / COLOR_SCALE_STEPS as f64
}

/// Vertical colour bar beside the heatmap, +1 at the top.
fn color_scale(ui: &mut egui::Ui, height: f32) {
    let (rect, _) =
        ui.allocate_exact_size(egui::vec2(COLOR_SCALE_WIDTH, height), egui::Sense::hover());
    let bar = egui::Rect::from_min_size(
        rect.min + egui::vec2(8.0, 12.0),
        egui::vec2(16.0, (height - 24.0).max(10.0)),
    );
    let painter = ui.painter_at(rect);

    let step = bar.height() / COLOR_SCALE_STEPS as f32;
    for i in 0..COLOR_SCALE_STEPS {
        let top = bar.top() + step * i as f32;
        painter.rect_filled(
            egui::Rect::from_min_max(egui::pos2(bar.left(), top), egui::pos2(bar.right(), top + step)),
            0.0,
            color(palette::correlation_color(scale_step_value(i))),
        );
    }

    for (label, t) in [("1.0", 0.0), ("0.5", 0.25), ("0.0", 0.5), ("-0.5", 0.75), ("-1.0", 1.0)] {
        painter.text(
            egui::pos2(bar.right() + 4.0, bar.top() + bar.height() * t),
            egui::Align2::LEFT_CENTER,
            label,
            egui::FontId::proportional(11.0),
            ui.visuals().text_color(),
        );
    }
}

/// Label of the cell centred on `value`, if it is one.
fn axis_label(labels: &[String], value: f64) -> String {
    let rounded = value.round();
    if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// One grid mark per cell centre.
fn unit_grid(input: egui_plot::GridInput) -> Vec<GridMark> {
    let (min, max) = input.bounds;
    let start = min.ceil().max(0.0) as i64;
    let end = max.floor() as i64;
    (start..=end)
        .map(|v| GridMark {
            value: v as f64,
            step_size: 1.0,
        })
        .collect()
}

fn histogram(plot_ui: &mut PlotUi, layers: &[Layer<Histogram>]) {
    for layer in layers {
        let fill = color(layer.color).gamma_multiply(0.7);
        let edge = color(palette::darken(layer.color, 0.7));
        let width = layer.data.bin_width();
        let bars: Vec<Bar> = layer
            .data
            .bins()
            .map(|(left, right, count)| {
                Bar::new((left + right) / 2.0, count as f64)
                    .width(width)
                    .fill(fill)
                    .stroke(egui::Stroke::new(1.0, edge))
            })
            .collect();
        plot_ui.bar_chart(BarChart::new(bars).color(fill).name(&layer.label));
    }
}

fn density(plot_ui: &mut PlotUi, layers: &[Layer<Vec<[f64; 2]>>]) {
    for layer in layers {
        let mut area = layer.data.clone();
        if let (Some(first), Some(last)) = (layer.data.first(), layer.data.last()) {
            area.push([last[0], 0.0]);
            area.push([first[0], 0.0]);
        }
        plot_ui.polygon(
            Polygon::new(PlotPoints::from(area))
                .fill_color(color(layer.color).gamma_multiply(0.5))
                .stroke(egui::Stroke::NONE)
                .name(&layer.label),
        );
        plot_ui.line(
            Line::new(PlotPoints::from(layer.data.clone()))
                .color(color(palette::darken(layer.color, 0.7)))
                .width(2.0)
                .name(&layer.label),
        );
    }
}

fn draw_box(plot_ui: &mut PlotUi, stats: &BoxStats, fill: Color32, edge: Color32, name: &str) {
    let spread = BoxSpread::new(
        stats.lower_whisker,
        stats.q1,
        stats.median,
        stats.q3,
        stats.upper_whisker,
    );
    let elem = BoxElem::new(0.5, spread)
        .box_width(0.4)
        .whisker_width(0.2)
        .fill(fill)
        .stroke(egui::Stroke::new(2.0, edge));
    plot_ui.box_plot(BoxPlot::new(vec![elem]).name(name));

    if !stats.outliers.is_empty() {
        let points: Vec<[f64; 2]> = stats.outliers.iter().map(|&v| [0.5, v]).collect();
        plot_ui.points(Points::new(PlotPoints::from(points)).radius(3.0).color(edge));
    }
}

fn box_plot(plot_ui: &mut PlotUi, layer: &Layer<BoxStats>) {
    draw_box(
        plot_ui,
        &layer.data,
        color(layer.color),
        color(palette::darken(layer.color, 0.55)),
        &layer.label,
    );
}

fn violin(plot_ui: &mut PlotUi, layer: &Layer<Violin>) {
    let v = &layer.data;
    let half = 0.4;
    let mut outline: Vec<[f64; 2]> = v.outline.iter().map(|[y, w]| [0.5 + w * half, *y]).collect();
    outline.extend(v.outline.iter().rev().map(|[y, w]| [0.5 - w * half, *y]));

    let edge = color(palette::darken(layer.color, 0.55));
    plot_ui.polygon(
        Polygon::new(PlotPoints::from(outline))
            .fill_color(color(layer.color))
            .stroke(egui::Stroke::new(1.0, edge))
            .name(&layer.label),
    );

    let inner = &v.inner;
    plot_ui.line(
        Line::new(PlotPoints::from(vec![[0.5, inner.lower_whisker], [0.5, inner.upper_whisker]]))
            .color(edge)
            .width(1.0),
    );
    plot_ui.line(
        Line::new(PlotPoints::from(vec![[0.5, inner.q1], [0.5, inner.q3]]))
            .color(edge)
            .width(6.0),
    );
    plot_ui.points(
        Points::new(PlotPoints::from(vec![[0.5, inner.median]]))
            .radius(3.0)
            .color(Color32::WHITE),
    );
}

/// Lower triangle of the matrix; row 0 sits at the top.
fn heatmap(plot_ui: &mut PlotUi, matrix: &CorrelationMatrix, annotate: bool) {
    let n = matrix.size();
    for row in 0..n {
        for col in 0..row {
            let Some(r) = matrix.get(row, col) else {
                continue;
            };
            let bg = palette::correlation_color(r);
            let (x, y) = (col as f64, (n - 1 - row) as f64);
            let cell = vec![
                [x - 0.5, y - 0.5],
                [x + 0.5, y - 0.5],
                [x + 0.5, y + 0.5],
                [x - 0.5, y + 0.5],
            ];
            plot_ui.polygon(
                Polygon::new(PlotPoints::from(cell))
                    .fill_color(color(bg))
                    .stroke(egui::Stroke::new(1.0, Color32::WHITE)),
            );
            if annotate {
                plot_ui.text(
                    Text::new(PlotPoint::new(x, y), format!("{r:.2}"))
                        .color(color(palette::contrast_text(bg))),
                );
            }
        }
    }
}
