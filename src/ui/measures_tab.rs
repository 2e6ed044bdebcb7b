use std::cmp::Ordering;

use crate::processing::correlation::CorrelationMatrix;
use crate::processing::statistics::{format_value, Measure};
use crate::processing::summary::{SheetSummary, Summary};
use crate::state::app_state::MeasureSelection;
use crate::state::palette;

pub const NOTHING_SELECTED: &str = "No columns or measures selected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// What the sidebar asked for this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasuresAction {
    None,
    Preview,
    SaveExcel,
    SaveCsv,
    CopyTable,
}

/// Preview state of the Measures tab.
#[derive(Default)]
pub struct MeasuresView {
    pub summary: Option<Summary>,
    /// Shown instead of the tables, e.g. when nothing is selected.
    pub message: Option<String>,
    /// Sort column and direction per previewed sheet.
    sort: Vec<Option<(usize, SortDirection)>>,
}

impl MeasuresView {
    pub fn set_summary(&mut self, summary: Summary) {
        self.sort = vec![None; summary.sheets.len()];
        self.summary = Some(summary);
        self.message = None;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.summary = None;
        self.sort.clear();
        self.message = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.summary = None;
        self.sort.clear();
        self.message = None;
    }
}

pub fn show_sidebar(
    ui: &mut egui::Ui,
    selection: &mut MeasureSelection,
    available: &[String],
    has_data: bool,
) -> MeasuresAction {
    let mut action = MeasuresAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        super::checklist(ui, "Columns", available, |c| c.clone(), &mut selection.columns, 220.0);
        ui.add_space(10.0);

        super::checklist(
            ui,
            "Measures",
            &Measure::ALL,
            |m| m.label().to_string(),
            &mut selection.measures,
            260.0,
        );
        ui.add_space(6.0);
        ui.checkbox(&mut selection.correlation, "Correlation matrix");

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(6.0);

        if super::action_button(ui, "Preview Measures", has_data) {
            action = MeasuresAction::Preview;
        }
        if super::action_button(ui, "Save Measures (Excel)", has_data) {
            action = MeasuresAction::SaveExcel;
        }
        if super::action_button(ui, "Save Measures (CSV)", has_data) {
            action = MeasuresAction::SaveCsv;
        }
        if super::action_button(ui, "Copy Table", has_data) {
            action = MeasuresAction::CopyTable;
        }
    });

    action
}

pub fn show_results(ui: &mut egui::Ui, view: &mut MeasuresView, decimals: usize) {
    if let Some(message) = &view.message {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| ui.label(egui::RichText::new(message).weak()));
        return;
    }

    let Some(summary) = &view.summary else {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("Choose columns and measures, then press Preview Measures.")
                    .weak(),
            )
        });
        return;
    };

    egui::ScrollArea::vertical().show(ui, |ui| {
        for (i, sheet) in summary.sheets.iter().enumerate() {
            ui.push_id(i, |ui| {
                egui::CollapsingHeader::new(egui::RichText::new(&sheet.label).strong())
                    .default_open(true)
                    .show(ui, |ui| {
                        if sheet.columns.is_empty() {
                            ui.label(
                                egui::RichText::new("None of the selected columns are in this sheet.")
                                    .weak(),
                            );
                        } else if !summary.measures.is_empty() {
                            let sort = view.sort.get_mut(i);
                            if let Some(sort) = sort {
                                show_measure_table(ui, &summary.measures, sheet, decimals, sort);
                            }
                        }
                        if let Some(matrix) = &sheet.correlation {
                            ui.add_space(8.0);
                            ui.label(egui::RichText::new("Correlation").strong());
                            show_correlation_grid(ui, matrix, decimals);
                        }
                    });
            });
            ui.add_space(10.0);
        }
    });
}

fn cycle_sort(current: Option<(usize, SortDirection)>, col: usize) -> Option<(usize, SortDirection)> {
    match current {
        Some((c, SortDirection::Ascending)) if c == col => Some((col, SortDirection::Descending)),
        Some((c, SortDirection::Descending)) if c == col => None,
        _ => Some((col, SortDirection::Ascending)),
    }
}

/// Row order for a sheet table. Column 0 sorts by name, column `k` by the
/// `k - 1`th measure; undefined values sort last either way.
fn sorted_rows(sheet: &SheetSummary, sort: Option<(usize, SortDirection)>) -> Vec<usize> {
    let mut rows: Vec<usize> = (0..sheet.columns.len()).collect();
    let Some((col, dir)) = sort else {
        return rows;
    };

    rows.sort_by(|&a, &b| {
        let (ca, cb) = (&sheet.columns[a], &sheet.columns[b]);
        if col == 0 {
            let cmp = ca.name.cmp(&cb.name);
            return match dir {
                SortDirection::Ascending => cmp,
                SortDirection::Descending => cmp.reverse(),
            };
        }
        let va = ca.values.get(col - 1).copied().flatten();
        let vb = cb.values.get(col - 1).copied().flatten();
        match (va, vb) {
            (Some(x), Some(y)) => {
                let cmp = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
                match dir {
                    SortDirection::Ascending => cmp,
                    SortDirection::Descending => cmp.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    rows
}

fn show_measure_table(
    ui: &mut egui::Ui,
    measures: &[Measure],
    sheet: &SheetSummary,
    decimals: usize,
    sort: &mut Option<(usize, SortDirection)>,
) {
    use egui_extras::{Column, TableBuilder};

    let rows = sorted_rows(sheet, *sort);
    let current_sort = *sort;
    let clicked_col: std::cell::Cell<Option<usize>> = std::cell::Cell::new(None);

    let header_button = |ui: &mut egui::Ui, col: usize, title: &str| {
        let arrow = match current_sort {
            Some((c, SortDirection::Ascending)) if c == col => " ^",
            Some((c, SortDirection::Descending)) if c == col => " v",
            _ => "",
        };
        if ui.button(format!("{title}{arrow}")).clicked() {
            clicked_col.set(Some(col));
        }
    };

    egui::ScrollArea::horizontal().show(ui, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .vscroll(false)
            .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
            .column(Column::auto().at_least(120.0))
            .columns(Column::auto().at_least(80.0), measures.len())
            .header(24.0, |mut header| {
                header.col(|ui| header_button(ui, 0, "Column"));
                for (i, measure) in measures.iter().enumerate() {
                    header.col(|ui| header_button(ui, i + 1, measure.column_name()));
                }
            })
            .body(|body| {
                body.rows(20.0, rows.len(), |mut row| {
                    let column = &sheet.columns[rows[row.index()]];
                    row.col(|ui| {
                        if column.has_data() {
                            ui.label(&column.name);
                        } else {
                            ui.label(egui::RichText::new(&column.name).weak())
                                .on_hover_text("No numeric values in this sheet");
                        };
                    });
                    for value in &column.values {
                        row.col(|ui| {
                            ui.monospace(format_value(*value, decimals));
                        });
                    }
                });
            });
    });

    if let Some(col) = clicked_col.get() {
        *sort = cycle_sort(*sort, col);
    }
}

fn show_correlation_grid(ui: &mut egui::Ui, matrix: &CorrelationMatrix, decimals: usize) {
    egui::ScrollArea::horizontal().id_salt("correlation").show(ui, |ui| {
        egui::Grid::new("correlation_grid")
            .spacing(egui::vec2(2.0, 2.0))
            .show(ui, |ui| {
                ui.label("");
                for label in &matrix.labels {
                    ui.label(egui::RichText::new(label).strong());
                }
                ui.end_row();

                for (r, label) in matrix.labels.iter().enumerate() {
                    ui.label(egui::RichText::new(label).strong());
                    for c in 0..matrix.size() {
                        let value = matrix.get(r, c);
                        let text = format_value(value, decimals);
                        match value {
                            Some(v) => {
                                let [br, bg, bb] = palette::correlation_color(v);
                                let [tr, tg, tb] = palette::contrast_text([br, bg, bb]);
                                egui::Frame::default()
                                    .fill(egui::Color32::from_rgb(br, bg, bb))
                                    .inner_margin(egui::Margin::symmetric(6, 2))
                                    .show(ui, |ui| {
                                        ui.label(
                                            egui::RichText::new(text)
                                                .monospace()
                                                .color(egui::Color32::from_rgb(tr, tg, tb)),
                                        );
                                    });
                            }
                            None => {
                                ui.monospace(text);
                            }
                        }
                    }
                    ui.end_row();
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::summary::ColumnSummary;

    fn sheet() -> SheetSummary {
        let column = |name: &str, v: Option<f64>| ColumnSummary {
            name: name.to_string(),
            count: 1,
            values: vec![v],
        };
        SheetSummary {
            file_name: "f.csv".into(),
            sheet_name: "f".into(),
            label: "f".into(),
            columns: vec![column("b", Some(2.0)), column("c", None), column("a", Some(5.0))],
            correlation: None,
        }
    }

    #[test]
    fn sort_cycles_ascending_descending_off() {
        let s = cycle_sort(None, 2);
        assert_eq!(s, Some((2, SortDirection::Ascending)));
        let s = cycle_sort(s, 2);
        assert_eq!(s, Some((2, SortDirection::Descending)));
        assert_eq!(cycle_sort(s, 2), None);
        assert_eq!(cycle_sort(s, 1), Some((1, SortDirection::Ascending)));
    }

    #[test]
    fn rows_sort_by_name_or_value_with_na_last() {
        let sheet = sheet();
        assert_eq!(sorted_rows(&sheet, None), vec![0, 1, 2]);
        assert_eq!(sorted_rows(&sheet, Some((0, SortDirection::Ascending))), vec![2, 0, 1]);
        assert_eq!(sorted_rows(&sheet, Some((1, SortDirection::Ascending))), vec![0, 2, 1]);
        assert_eq!(sorted_rows(&sheet, Some((1, SortDirection::Descending))), vec![2, 0, 1]);
    }

    #[test]
    fn message_replaces_summary() {
        let mut view = MeasuresView::default();
        view.set_message(NOTHING_SELECTED);
        assert!(view.summary.is_none());
        assert_eq!(view.message.as_deref(), Some(NOTHING_SELECTED));
    }
}
