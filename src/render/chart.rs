use serde::{Deserialize, Serialize};

use crate::data::dataset::{Dataset, Source};
use crate::error::{Result, StatError};
use crate::processing::correlation::CorrelationMatrix;
use crate::processing::distribution::{
    self, BoxStats, Histogram, Violin, DENSITY_CUT, DENSITY_POINTS,
};
use crate::state::palette;

/// Base figure size in pixels (6 x 4 inches at 100 dpi).
pub const BASE_WIDTH: u32 = 600;
pub const BASE_HEIGHT: u32 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlotKind {
    Histogram,
    Boxplot,
    Violinplot,
    DensityPlot,
    CorrelationHeatmap,
}

impl PlotKind {
    pub const ALL: [PlotKind; 5] = [
        PlotKind::Histogram,
        PlotKind::Boxplot,
        PlotKind::Violinplot,
        PlotKind::DensityPlot,
        PlotKind::CorrelationHeatmap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PlotKind::Histogram => "Histogram",
            PlotKind::Boxplot => "Boxplot",
            PlotKind::Violinplot => "Violinplot",
            PlotKind::DensityPlot => "Density Plot",
            PlotKind::CorrelationHeatmap => "Correlation Heatmap",
        }
    }
}

/// One column drawn on an overlay chart.
#[derive(Debug, Clone)]
pub struct Layer<T> {
    pub label: String,
    pub color: [u8; 3],
    pub data: T,
}

#[derive(Debug, Clone)]
pub enum ChartBody {
    Histogram(Vec<Layer<Histogram>>),
    Density(Vec<Layer<Vec<[f64; 2]>>>),
    Box(Layer<BoxStats>),
    Violin(Layer<Violin>),
    Heatmap(CorrelationMatrix),
}

/// A chart ready to be previewed or rendered to an image.
#[derive(Debug, Clone)]
pub struct Chart {
    pub kind: PlotKind,
    pub title: String,
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub body: ChartBody,
}

/// Replace characters that are not safe in file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Build every requested chart for every included sheet.
pub fn build_charts(
    dataset: &Dataset,
    columns: &[String],
    kinds: &[PlotKind],
    histogram_bins: usize,
) -> Result<Vec<Chart>> {
    if columns.is_empty() {
        return Err(StatError::NothingSelected("columns"));
    }
    if kinds.is_empty() {
        return Err(StatError::NothingSelected("plots"));
    }

    let mut charts = Vec::new();
    for source in dataset.sources() {
        for kind in PlotKind::ALL.iter().filter(|k| kinds.contains(k)) {
            match kind {
                PlotKind::Boxplot | PlotKind::Violinplot => {
                    charts.extend(per_column_charts(&source, columns, *kind));
                }
                PlotKind::Histogram | PlotKind::DensityPlot => {
                    charts.extend(overlay_chart(&source, columns, *kind, histogram_bins));
                }
                PlotKind::CorrelationHeatmap => {
                    charts.extend(heatmap_chart(&source, columns));
                }
            }
        }
    }

    tracing::info!("Built {} chart(s)", charts.len());
    Ok(charts)
}

/// Selected columns present and numeric in the sheet, with their palette
/// index (position in the selection) and non-missing values.
fn present_columns<'a>(
    source: &Source<'a>,
    columns: &'a [String],
) -> impl Iterator<Item = (usize, &'a str, Vec<f64>)> + 'a {
    let table = source.table;
    columns.iter().enumerate().filter_map(move |(i, name)| {
        let column = table.numeric_column(name)?;
        let values = column.dropna();
        (!values.is_empty()).then_some((i, name.as_str(), values))
    })
}

fn per_column_charts(source: &Source<'_>, columns: &[String], kind: PlotKind) -> Vec<Chart> {
    let label = source.label();
    present_columns(source, columns)
        .filter_map(|(i, name, values)| {
            let color = palette::pastel(i);
            let body = match kind {
                PlotKind::Boxplot => ChartBody::Box(Layer {
                    label: name.to_string(),
                    color,
                    data: distribution::box_stats(&values)?,
                }),
                _ => ChartBody::Violin(Layer {
                    label: name.to_string(),
                    color,
                    data: distribution::violin(&values)?,
                }),
            };
            Some(Chart {
                kind,
                title: format!("{} \u{2013} {name} (Sheet: {label})", kind.label()),
                file_name: sanitize_file_name(&format!("{}_{name}_{label}.png", kind.label())),
                width: BASE_WIDTH,
                height: BASE_HEIGHT,
                body,
            })
        })
        .collect()
}

fn overlay_chart(
    source: &Source<'_>,
    columns: &[String],
    kind: PlotKind,
    bins: usize,
) -> Option<Chart> {
    let label = source.label();
    let present: Vec<_> = present_columns(source, columns).collect();

    let body = if kind == PlotKind::Histogram {
        let layers: Vec<Layer<Histogram>> = present
            .iter()
            .filter_map(|(i, name, values)| {
                Some(Layer {
                    label: name.to_string(),
                    color: palette::pastel(*i),
                    data: distribution::histogram(values, bins)?,
                })
            })
            .collect();
        if layers.is_empty() {
            return None;
        }
        ChartBody::Histogram(layers)
    } else {
        let layers: Vec<Layer<Vec<[f64; 2]>>> = present
            .iter()
            .filter_map(|(i, name, values)| {
                let kde = distribution::GaussianKde::new(values)?;
                Some(Layer {
                    label: name.to_string(),
                    color: palette::pastel(*i),
                    data: kde.curve(DENSITY_CUT, DENSITY_POINTS),
                })
            })
            .collect();
        if layers.is_empty() {
            tracing::debug!("No column of '{label}' has enough spread for a density plot");
            return None;
        }
        ChartBody::Density(layers)
    };

    Some(Chart {
        kind,
        title: format!("{} \u{2013} Sheet: {label}", kind.label()),
        file_name: sanitize_file_name(&format!("{}_{label}.png", kind.label())),
        width: BASE_WIDTH,
        height: overlay_height(columns.len()),
        body,
    })
}

/// Overlay charts grow with the number of selected columns.
fn overlay_height(column_count: usize) -> u32 {
    BASE_HEIGHT.max((column_count as u32) * 60)
}

fn heatmap_chart(source: &Source<'_>, columns: &[String]) -> Option<Chart> {
    let label = source.label();
    let aligned: Vec<(String, Vec<Option<f64>>)> = columns
        .iter()
        .filter_map(|name| source.table.numeric_column(name))
        .map(|c| (c.name.clone(), c.numeric_values()))
        .collect();
    let matrix = CorrelationMatrix::compute(&aligned)?;

    Some(Chart {
        kind: PlotKind::CorrelationHeatmap,
        title: format!("Correlation Heatmap \u{2013} Sheet: {label}"),
        file_name: sanitize_file_name(&format!("Correlation_Heatmap_{label}.png")),
        width: BASE_WIDTH,
        height: overlay_height(columns.len()),
        body: ChartBody::Heatmap(matrix),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{numeric_column, sheet, workbook};

    fn dataset() -> Dataset {
        Dataset::new(vec![workbook(
            "data.xlsx",
            vec![sheet(
                "Q1/Q2",
                vec![
                    numeric_column("a", &[Some(1.0), Some(2.0), Some(3.0), Some(5.0)]),
                    numeric_column("b", &[Some(2.0), Some(1.0), Some(4.0), Some(3.0)]),
                    numeric_column("empty", &[None, None, None, None]),
                ],
            )],
        )])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn nothing_selected_is_an_error() {
        let ds = dataset();
        assert!(build_charts(&ds, &[], &[PlotKind::Histogram], 20).is_err());
        assert!(build_charts(&ds, &cols(&["a"]), &[], 20).is_err());
    }

    #[test]
    fn per_column_kinds_make_one_chart_per_column_with_data() {
        let charts =
            build_charts(&dataset(), &cols(&["a", "b", "empty", "missing"]), &[PlotKind::Boxplot], 20)
                .unwrap();
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].title, "Boxplot \u{2013} a (Sheet: Q1/Q2)");
        assert_eq!(charts[0].file_name, "Boxplot_a_Q1_Q2.png");
        assert_eq!((charts[0].width, charts[0].height), (600, 400));
    }

    #[test]
    fn overlay_kinds_make_one_chart_per_sheet() {
        let charts = build_charts(
            &dataset(),
            &cols(&["a", "b"]),
            &[PlotKind::DensityPlot, PlotKind::Histogram],
            10,
        )
        .unwrap();
        // charts follow the fixed kind order, not the selection order
        assert_eq!(charts[0].kind, PlotKind::Histogram);
        assert_eq!(charts[1].kind, PlotKind::DensityPlot);
        assert_eq!(charts[1].file_name, "Density Plot_Q1_Q2.png");
        match &charts[0].body {
            ChartBody::Histogram(layers) => {
                assert_eq!(layers.len(), 2);
                assert_eq!(layers[0].color, palette::pastel(0));
                assert_eq!(layers[1].color, palette::pastel(1));
                assert_eq!(layers[0].data.counts.len(), 10);
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn heatmap_needs_two_columns() {
        let ds = dataset();
        let one = build_charts(&ds, &cols(&["a"]), &[PlotKind::CorrelationHeatmap], 20).unwrap();
        assert!(one.is_empty());

        let two =
            build_charts(&ds, &cols(&["a", "b"]), &[PlotKind::CorrelationHeatmap], 20).unwrap();
        assert_eq!(two.len(), 1);
        assert_eq!(two[0].file_name, "Correlation_Heatmap_Q1_Q2.png");
    }

    #[test]
    fn overlay_height_grows_with_selection() {
        assert_eq!(overlay_height(2), 400);
        assert_eq!(overlay_height(10), 600);
    }
}
