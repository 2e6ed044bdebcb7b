use crate::render::chart::{Chart, PlotKind};
use crate::state::app_state::PlotSelection;
use crate::ui::chart_view::{self, ChartAction};

pub const NOTHING_SELECTED: &str = "No columns or plots selected.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotsAction {
    None,
    Preview,
    SaveAll,
    SaveChart(usize),
    CopyChart(usize),
}

/// Preview state of the Plots tab.
#[derive(Default)]
pub struct PlotsView {
    pub charts: Vec<Chart>,
    pub message: Option<String>,
}

impl PlotsView {
    pub fn set_charts(&mut self, charts: Vec<Chart>) {
        self.message = if charts.is_empty() {
            Some("No chart could be drawn from the selected columns.".to_string())
        } else {
            None
        };
        self.charts = charts;
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.charts.clear();
        self.message = Some(message.into());
    }

    pub fn clear(&mut self) {
        self.charts.clear();
        self.message = None;
    }
}

pub fn show_sidebar(
    ui: &mut egui::Ui,
    selection: &mut PlotSelection,
    available: &[String],
    has_data: bool,
) -> PlotsAction {
    let mut action = PlotsAction::None;

    egui::ScrollArea::vertical().show(ui, |ui| {
        super::checklist(ui, "Columns", available, |c| c.clone(), &mut selection.columns, 260.0);
        ui.add_space(10.0);
        super::checklist(
            ui,
            "Plots",
            &PlotKind::ALL,
            |k| k.label().to_string(),
            &mut selection.kinds,
            160.0,
        );

        ui.add_space(12.0);
        ui.separator();
        ui.add_space(6.0);

        if super::action_button(ui, "Preview Plots", has_data) {
            action = PlotsAction::Preview;
        }
        if super::action_button(ui, "Save Plots (PNG)", has_data) {
            action = PlotsAction::SaveAll;
        }
    });

    action
}

pub fn show_previews(ui: &mut egui::Ui, view: &PlotsView, annotate_heatmap: bool) -> PlotsAction {
    let mut action = PlotsAction::None;

    if let Some(message) = &view.message {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| ui.label(egui::RichText::new(message).weak()));
        return action;
    }
    if view.charts.is_empty() {
        ui.add_space(40.0);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("Choose columns and plots, then press Preview Plots.").weak())
        });
        return action;
    }

    ui.label(egui::RichText::new(format!("{} chart(s)", view.charts.len())).weak());
    egui::ScrollArea::vertical().show(ui, |ui| {
        for (i, chart) in view.charts.iter().enumerate() {
            match chart_view::show_chart(ui, chart, i, annotate_heatmap) {
                ChartAction::SavePng => action = PlotsAction::SaveChart(i),
                ChartAction::Copy => action = PlotsAction::CopyChart(i),
                ChartAction::None => {}
            }
            ui.add_space(10.0);
        }
    });

    action
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chart_list_explains_itself() {
        let mut view = PlotsView::default();
        view.set_charts(Vec::new());
        assert!(view.message.is_some());

        view.set_message(NOTHING_SELECTED);
        assert_eq!(view.message.as_deref(), Some(NOTHING_SELECTED));
        view.clear();
        assert!(view.message.is_none());
    }
}
