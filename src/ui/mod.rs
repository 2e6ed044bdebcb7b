pub mod chart_view;
pub mod measures_tab;
pub mod plots_tab;
pub mod preferences_dialog;
pub mod sheet_selection_dialog;

use crate::state::app_state::set_selected;

/// A titled, scrollable checkbox list with All / None buttons.
pub(crate) fn checklist<T: PartialEq + Clone>(
    ui: &mut egui::Ui,
    title: &str,
    items: &[T],
    label: impl Fn(&T) -> String,
    selected: &mut Vec<T>,
    max_height: f32,
) {
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(title).strong());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("None").clicked() {
                selected.clear();
            }
            if ui.small_button("All").clicked() {
                *selected = items.to_vec();
            }
        });
    });
    ui.add_space(2.0);

    egui::Frame::group(ui.style())
        .inner_margin(egui::Margin::same(6))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            egui::ScrollArea::vertical()
                .id_salt(title)
                .max_height(max_height)
                .show(ui, |ui| {
                    if items.is_empty() {
                        ui.label(egui::RichText::new("Nothing to select.").weak());
                    }
                    for item in items {
                        let mut checked = selected.contains(item);
                        if ui.checkbox(&mut checked, label(item)).changed() {
                            set_selected(selected, item, checked);
                        }
                    }
                });
        });
}

/// A full-width sidebar button.
pub(crate) fn action_button(ui: &mut egui::Ui, text: &str, enabled: bool) -> bool {
    ui.add_enabled(
        enabled,
        egui::Button::new(egui::RichText::new(text).strong())
            .min_size(egui::vec2(ui.available_width(), 28.0)),
    )
    .clicked()
}
