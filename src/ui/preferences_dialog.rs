use crate::state::app_state::Preferences;

/// Show the preferences window. Returns `true` while it should stay open,
/// `false` when the user closes it.
pub fn show_preferences_dialog(ctx: &egui::Context, prefs: &mut Preferences) -> bool {
    let mut open = true;
    let mut close = false;

    egui::Window::new("Preferences")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .default_width(360.0)
        .show(ctx, |ui| {
            egui::Grid::new("preferences_grid")
                .num_columns(2)
                .spacing(egui::vec2(12.0, 8.0))
                .show(ui, |ui| {
                    ui.label("Decimal places");
                    ui.add(egui::Slider::new(&mut prefs.decimals, Preferences::DECIMALS));
                    ui.end_row();

                    ui.label("Histogram bins");
                    ui.add(egui::Slider::new(&mut prefs.histogram_bins, Preferences::BINS));
                    ui.end_row();

                    ui.label("Image scale");
                    ui.add(
                        egui::Slider::new(&mut prefs.export_scale, Preferences::SCALE)
                            .step_by(0.25)
                            .suffix("x"),
                    )
                    .on_hover_text("Multiplier on the 600 x 400 base size of exported images");
                    ui.end_row();

                    ui.label("Heatmap values");
                    ui.checkbox(&mut prefs.annotate_heatmap, "Annotate cells");
                    ui.end_row();
                });

            ui.add_space(12.0);
            ui.horizontal(|ui| {
                if ui.button("Restore Defaults").clicked() {
                    *prefs = Preferences::default();
                }
                if ui.add(egui::Button::new("Close").min_size(egui::vec2(80.0, 28.0))).clicked() {
                    close = true;
                }
            });
        });

    prefs.clamp();
    open && !close
}
