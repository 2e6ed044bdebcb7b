use crate::data::dataset::SheetEntry;

/// State for the sheet selection dialog: one entry per loaded sheet.
pub struct SheetSelectionState {
    pub entries: Vec<SheetEntry>,
}

impl SheetSelectionState {
    pub fn new(entries: Vec<SheetEntry>) -> Self {
        Self { entries }
    }

    pub fn any_selected(&self) -> bool {
        self.entries.iter().any(|e| e.included)
    }

    pub fn set_all(&mut self, included: bool) {
        for entry in &mut self.entries {
            entry.included = included;
        }
    }

    /// Whether the entries span more than one file.
    fn multi_file(&self) -> bool {
        let first = self.entries.first().map(|e| &e.path);
        self.entries.iter().any(|e| Some(&e.path) != first)
    }
}

/// Result of the dialog interaction each frame.
pub enum DialogResult {
    Ok(Vec<SheetEntry>),
    Cancel,
}

/// Show the sheet selection dialog.
///
/// Returns `Some(DialogResult)` when the user presses OK or Cancel, or
/// `None` while the dialog is still open.
pub fn show_sheet_selection_dialog(
    ctx: &egui::Context,
    state: &mut SheetSelectionState,
) -> Option<DialogResult> {
    let mut result = None;
    let multi_file = state.multi_file();

    egui::Window::new("Select Sheets")
        .collapsible(false)
        .resizable(true)
        .default_width(420.0)
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(format!("{} sheet(s) loaded.", state.entries.len())).weak(),
            );
            ui.add_space(8.0);

            ui.horizontal(|ui| {
                if ui.small_button("All").clicked() {
                    state.set_all(true);
                }
                if ui.small_button("None").clicked() {
                    state.set_all(false);
                }
            });

            egui::Frame::group(ui.style())
                .inner_margin(egui::Margin::same(8))
                .show(ui, |ui| {
                    egui::ScrollArea::vertical()
                        .max_height(300.0)
                        .show(ui, |ui| {
                            for entry in &mut state.entries {
                                let text = if multi_file {
                                    format!("{} - {}", entry.file_name, entry.sheet)
                                } else {
                                    entry.sheet.clone()
                                };
                                ui.checkbox(&mut entry.included, text)
                                    .on_hover_text(entry.path.display().to_string());
                            }
                        });
                });

            ui.add_space(12.0);

            let any_selected = state.any_selected();
            ui.horizontal(|ui| {
                let ok_btn = ui.add_enabled(
                    any_selected,
                    egui::Button::new(egui::RichText::new("OK").strong())
                        .min_size(egui::vec2(100.0, 32.0)),
                );
                if ok_btn.clicked() {
                    result = Some(DialogResult::Ok(state.entries.clone()));
                }

                if ui.add(egui::Button::new("Cancel").min_size(egui::vec2(100.0, 32.0))).clicked() {
                    result = Some(DialogResult::Cancel);
                }

                if !any_selected {
                    ui.colored_label(egui::Color32::from_rgb(255, 80, 80), "No sheets selected!");
                }
            });
        });

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn entry(path: &str, sheet: &str, included: bool) -> SheetEntry {
        let path = PathBuf::from(path);
        SheetEntry {
            file_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            path,
            sheet: sheet.to_string(),
            included,
        }
    }

    #[test]
    fn select_all_and_none() {
        let mut state = SheetSelectionState::new(vec![
            entry("/d/a.xlsx", "S1", true),
            entry("/d/a.xlsx", "S2", false),
        ]);
        assert!(state.any_selected());
        assert!(!state.multi_file());
        state.set_all(false);
        assert!(!state.any_selected());
        state.set_all(true);
        assert!(state.entries.iter().all(|e| e.included));
    }

    #[test]
    fn same_name_in_two_folders_counts_as_two_files() {
        let state = SheetSelectionState::new(vec![
            entry("/one/a.xlsx", "S1", true),
            entry("/two/a.xlsx", "S1", true),
        ]);
        assert!(state.multi_file());
    }
}
