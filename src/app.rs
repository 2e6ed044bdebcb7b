use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use eframe::egui;

use crate::data::dataset::{Dataset, SheetEntry};
use crate::data::loader::{self, LoadReport, SUPPORTED_EXTENSIONS};
use crate::error::{Result, StatError};
use crate::export::{table, workbook};
use crate::processing::summary::{self, Summary};
use crate::render::chart::{self, Chart};
use crate::render::png;
use crate::state::app_state::{in_display_order, AppState, Tab, SESSION_EXTENSION, VERSION};
use crate::ui::measures_tab::{self, MeasuresAction, MeasuresView};
use crate::ui::plots_tab::{self, PlotsAction, PlotsView};
use crate::ui::preferences_dialog;
use crate::ui::sheet_selection_dialog::{self, DialogResult, SheetSelectionState};

/// Pending background load.
struct PendingLoad {
    result: Arc<Mutex<Option<LoadReport>>>,
    /// Session whose selections are restored once its files are loaded.
    restore: Option<AppState>,
}

/// The main SummaryStat application.
pub struct SummaryStatApp {
    pub state: AppState,
    dataset: Dataset,
    /// Numeric columns across the included sheets.
    available_columns: Vec<String>,
    measures_view: MeasuresView,
    plots_view: PlotsView,
    sheet_dialog: Option<SheetSelectionState>,
    show_preferences: bool,
    /// Last error, shown in the footer until dismissed.
    pub error_message: Option<String>,
    /// Last completed action, shown in the footer.
    status_message: Option<String>,
    pending_load: Option<PendingLoad>,
}

impl SummaryStatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, initial_files: Vec<PathBuf>) -> Self {
        let state = AppState::new();

        let ctx = &cc.egui_ctx;
        let mut style = (*ctx.style()).clone();
        style.text_styles.insert(egui::TextStyle::Body, egui::FontId::proportional(15.0));
        style.text_styles.insert(egui::TextStyle::Button, egui::FontId::proportional(14.5));
        style.text_styles.insert(egui::TextStyle::Heading, egui::FontId::proportional(22.0));
        style.text_styles.insert(egui::TextStyle::Small, egui::FontId::proportional(12.0));
        style.text_styles.insert(egui::TextStyle::Monospace, egui::FontId::monospace(13.5));
        style.spacing.button_padding = egui::vec2(10.0, 5.0);
        style.spacing.item_spacing = egui::vec2(8.0, 6.0);
        style.spacing.window_margin = egui::Margin::same(12);
        style.spacing.indent = 20.0;
        ctx.set_style(style);
        ctx.set_visuals(state.theme.visuals());

        let mut app = Self {
            state,
            dataset: Dataset::default(),
            available_columns: Vec::new(),
            measures_view: MeasuresView::default(),
            plots_view: PlotsView::default(),
            sheet_dialog: None,
            show_preferences: false,
            error_message: None,
            status_message: None,
            pending_load: None,
        };

        if !initial_files.is_empty() {
            app.start_load(initial_files, None);
        }
        app
    }

    fn report_error(&mut self, context: &str, err: StatError) {
        tracing::error!("{context}: {err}");
        self.error_message = Some(format!("{context}: {err}"));
    }

    fn set_status(&mut self, message: String) {
        tracing::info!("{message}");
        self.status_message = Some(message);
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    fn open_files_dialog(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("Spreadsheets", &SUPPORTED_EXTENSIONS)
            .add_filter("All Files", &["*"])
            .pick_files()
        {
            self.start_load(paths, None);
        }
    }

    /// Load files on a background thread so the UI stays responsive.
    fn start_load(&mut self, paths: Vec<PathBuf>, restore: Option<AppState>) {
        let result: Arc<Mutex<Option<LoadReport>>> = Arc::new(Mutex::new(None));
        let result_clone = Arc::clone(&result);

        std::thread::spawn(move || {
            // A panicking reader still has to clear the spinner.
            let report = std::panic::catch_unwind(|| loader::load_files(&paths))
                .unwrap_or_else(|_| {
                    tracing::error!("Loader thread panicked");
                    LoadReport {
                        workbooks: Vec::new(),
                        failures: paths
                            .iter()
                            .map(|p| (p.clone(), "reader panicked".to_string()))
                            .collect(),
                    }
                });
            if let Ok(mut slot) = result_clone.lock() {
                *slot = Some(report);
            }
        });

        self.pending_load = Some(PendingLoad { result, restore });
    }

    fn poll_load(&mut self) {
        let report = match &self.pending_load {
            Some(pending) => match pending.result.lock() {
                Ok(mut slot) => slot.take(),
                Err(poisoned) => poisoned.into_inner().take(),
            },
            None => return,
        };

        if let Some(report) = report {
            let restore = self.pending_load.take().and_then(|p| p.restore);
            self.finish_load(report, restore);
        }
    }

    fn finish_load(&mut self, report: LoadReport, restore: Option<AppState>) {
        self.error_message = report.failure_message();
        let sheet_count = report.sheet_count();
        let file_count = report.workbooks.len();

        self.dataset = Dataset::new(report.workbooks);
        self.measures_view.clear();
        self.plots_view.clear();
        let files: Vec<PathBuf> = self.dataset.workbooks.iter().map(|w| w.path.clone()).collect();

        match restore {
            Some(mut session) => {
                self.dataset.apply_inclusion(&session.sheets);
                session.files = files;
                session.sheets = self.dataset.sheet_inclusion();
                self.state = session;
                self.available_columns = self.dataset.numeric_columns();
                self.state.retain_columns(&self.available_columns);
            }
            None => {
                self.state.files = files;
                self.state.sheets = self.dataset.sheet_inclusion();
                self.available_columns = self.dataset.numeric_columns();
                self.state.select_all_columns(&self.available_columns);
                if sheet_count > 1 {
                    self.sheet_dialog =
                        Some(SheetSelectionState::new(self.dataset.sheet_inclusion()));
                }
            }
        }

        if file_count > 0 {
            self.set_status(format!("Loaded {file_count} file(s), {sheet_count} sheet(s)"));
        }
    }

    fn apply_sheet_selection(&mut self, entries: Vec<SheetEntry>) {
        self.dataset.apply_inclusion(&entries);
        self.state.sheets = self.dataset.sheet_inclusion();

        let previous = std::mem::take(&mut self.available_columns);
        self.available_columns = self.dataset.numeric_columns();
        self.state.refresh_columns(&previous, &self.available_columns);
        self.measures_view.clear();
        self.plots_view.clear();
        tracing::info!("{} of {} sheet(s) included", self.dataset.included_count(), self.dataset.sheet_count());
    }

    // ------------------------------------------------------------------
    // Measures
    // ------------------------------------------------------------------

    fn compute_summary(&self) -> Result<Summary> {
        let selection = &self.state.measures;
        let columns = in_display_order(&self.available_columns, &selection.columns);
        summary::summarize(
            &self.dataset,
            &columns,
            &selection.ordered_measures(),
            selection.correlation,
        )
    }

    /// Summary for an export, or `None` after reporting why not.
    fn summary_for_export(&mut self) -> Option<Summary> {
        match self.compute_summary() {
            Ok(summary) => Some(summary),
            Err(StatError::NothingSelected(_)) => {
                self.error_message = Some(measures_tab::NOTHING_SELECTED.to_string());
                None
            }
            Err(e) => {
                self.report_error("Failed to compute measures", e);
                None
            }
        }
    }

    fn preview_measures(&mut self) {
        match self.compute_summary() {
            Ok(summary) => self.measures_view.set_summary(summary),
            Err(StatError::NothingSelected(_)) => {
                self.measures_view.set_message(measures_tab::NOTHING_SELECTED)
            }
            Err(e) => self.report_error("Failed to compute measures", e),
        }
    }

    fn save_measures_excel(&mut self) {
        let Some(summary) = self.summary_for_export() else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("summary_measures.xlsx")
            .add_filter("Excel Files", &["xlsx"])
            .save_file()
        {
            match workbook::write_workbook(&summary, &path) {
                Ok(()) => self.set_status(format!("Measures saved to {}", path.display())),
                Err(e) => self.report_error("Failed to save measures", e),
            }
        }
    }

    fn save_measures_csv(&mut self) {
        let Some(summary) = self.summary_for_export() else {
            return;
        };
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name("summary_measures.csv")
            .add_filter("CSV Files", &["csv"])
            .save_file()
        {
            match table::write_csv(&summary, &path) {
                Ok(()) => self.set_status(format!("Measures saved to {}", path.display())),
                Err(e) => self.report_error("Failed to save measures", e),
            }
        }
    }

    fn copy_table(&mut self) {
        let Some(summary) = self.summary_for_export() else {
            return;
        };
        let text = summary.to_tsv(self.state.preferences.decimals);
        let copied = arboard::Clipboard::new().and_then(|mut c| c.set_text(text));
        match copied {
            Ok(()) => self.set_status(format!("Copied {} row(s) to clipboard", summary.row_count())),
            Err(e) => self.report_error("Failed to copy table", e.into()),
        }
    }

    // ------------------------------------------------------------------
    // Plots
    // ------------------------------------------------------------------

    fn build_charts(&self) -> Result<Vec<Chart>> {
        let selection = &self.state.plots;
        let columns = in_display_order(&self.available_columns, &selection.columns);
        chart::build_charts(
            &self.dataset,
            &columns,
            &selection.kinds,
            self.state.preferences.histogram_bins,
        )
    }

    fn preview_plots(&mut self) {
        match self.build_charts() {
            Ok(charts) => self.plots_view.set_charts(charts),
            Err(StatError::NothingSelected(_)) => {
                self.plots_view.set_message(plots_tab::NOTHING_SELECTED)
            }
            Err(e) => self.report_error("Failed to build charts", e),
        }
    }

    fn save_all_plots(&mut self) {
        let charts = match self.build_charts() {
            Ok(charts) => charts,
            Err(StatError::NothingSelected(_)) => {
                self.error_message = Some(plots_tab::NOTHING_SELECTED.to_string());
                return;
            }
            Err(e) => {
                self.report_error("Failed to build charts", e);
                return;
            }
        };

        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            let options = self.state.preferences.render_options();
            match png::save_all(&charts, &dir, options) {
                Ok(paths) => {
                    self.set_status(format!("Saved {} plot(s) to {}", paths.len(), dir.display()))
                }
                Err(e) => self.report_error("Failed to save plots", e),
            }
        }
    }

    fn save_chart(&mut self, index: usize) {
        let Some(chart) = self.plots_view.charts.get(index) else {
            return;
        };
        let options = self.state.preferences.render_options();
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(&chart.file_name)
            .add_filter("PNG Image", &["png"])
            .save_file()
        else {
            return;
        };

        let result = match (path.parent(), path.file_name()) {
            (Some(dir), Some(name)) => {
                let mut renamed = chart.clone();
                renamed.file_name = name.to_string_lossy().into_owned();
                png::save_png(&renamed, dir, options)
            }
            _ => Err(StatError::Chart(format!("invalid path {}", path.display()))),
        };
        match result {
            Ok(saved) => self.set_status(format!("Saved {}", saved.display())),
            Err(e) => self.report_error("Failed to save plot", e),
        }
    }

    fn copy_chart(&mut self, index: usize) {
        let Some(chart) = self.plots_view.charts.get(index) else {
            return;
        };
        let title = chart.title.clone();
        match png::copy_to_clipboard(chart, self.state.preferences.render_options()) {
            Ok(()) => self.set_status(format!("Copied '{title}' to clipboard")),
            Err(e) => self.report_error("Failed to copy plot", e),
        }
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    fn save_session(&mut self) {
        self.state.sheets = self.dataset.sheet_inclusion();
        if let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("session.{SESSION_EXTENSION}"))
            .add_filter("SummaryStat Session", &[SESSION_EXTENSION, "json"])
            .save_file()
        {
            match self.state.save(&path) {
                Ok(()) => self.set_status(format!("Session saved to {}", path.display())),
                Err(e) => self.report_error("Failed to save session", e),
            }
        }
    }

    fn load_session(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("SummaryStat Session", &[SESSION_EXTENSION, "json"])
            .pick_file()
        {
            self.restore_session(&path);
        }
    }

    fn restore_session(&mut self, path: &Path) {
        match AppState::load(path) {
            Ok(session) if session.files.is_empty() => {
                self.dataset = Dataset::default();
                self.available_columns.clear();
                self.measures_view.clear();
                self.plots_view.clear();
                self.state = session;
            }
            Ok(session) => {
                let files = session.files.clone();
                self.start_load(files, Some(session));
            }
            Err(e) => self.report_error("Failed to load session", e),
        }
    }

    // ------------------------------------------------------------------
    // Panels
    // ------------------------------------------------------------------

    fn show_header(&mut self, ctx: &egui::Context) {
        let mut open_files = false;
        let mut save_session = false;
        let mut load_session = false;

        egui::TopBottomPanel::top("header")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 8)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.visuals_mut().override_text_color = Some(ui.visuals().strong_text_color());
                    ui.heading("SummaryStat");
                    ui.visuals_mut().override_text_color = None;

                    ui.separator();
                    for tab in [Tab::Measures, Tab::Plots] {
                        ui.selectable_value(&mut self.state.tab, tab, egui::RichText::new(tab.label()).strong());
                    }
                    ui.separator();

                    if ui.button("Load Files").clicked() {
                        open_files = true;
                    }
                    let sheets_btn = ui.add_enabled(
                        !self.dataset.is_empty(),
                        egui::Button::new("Sheets\u{2026}"),
                    );
                    if sheets_btn.clicked() {
                        self.sheet_dialog =
                            Some(SheetSelectionState::new(self.dataset.sheet_inclusion()));
                    }
                    ui.separator();
                    if ui.button("Save Session").clicked() {
                        save_session = true;
                    }
                    if ui.button("Load Session").clicked() {
                        load_session = true;
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button(self.state.theme.toggle_label()).clicked() {
                            self.state.theme = self.state.theme.toggle();
                        }
                        if ui.button("Preferences").clicked() {
                            self.show_preferences = true;
                        }
                        ui.separator();
                        ui.small(format!("v{VERSION}"));
                    });
                });
            });

        if open_files {
            self.open_files_dialog();
        }
        if save_session {
            self.save_session();
        }
        if load_session {
            self.load_session();
        }
    }

    fn show_footer(&mut self, ctx: &egui::Context) {
        let error_color = self.state.theme.error_color();
        egui::TopBottomPanel::bottom("footer")
            .frame(egui::Frame::side_top_panel(&ctx.style()).inner_margin(egui::Margin::symmetric(16, 6)))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    let status = if self.dataset.is_empty() {
                        "No files loaded".to_string()
                    } else {
                        format!(
                            "{} file(s), {} of {} sheet(s) included, {} numeric column(s)",
                            self.dataset.workbooks.len(),
                            self.dataset.included_count(),
                            self.dataset.sheet_count(),
                            self.available_columns.len()
                        )
                    };
                    ui.label(egui::RichText::new(status).weak());

                    if let Some(msg) = &self.status_message {
                        ui.separator();
                        ui.label(msg);
                    }

                    if let Some(msg) = &self.error_message {
                        ui.separator();
                        ui.colored_label(error_color, msg);
                        if ui.small_button("dismiss").clicked() {
                            self.error_message = None;
                        }
                    }
                });
            });
    }

    fn show_measures_tab(&mut self, ctx: &egui::Context) {
        let has_data = !self.dataset.is_empty();
        let mut action = MeasuresAction::None;
        egui::SidePanel::left("measures_sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                action = measures_tab::show_sidebar(
                    ui,
                    &mut self.state.measures,
                    &self.available_columns,
                    has_data,
                );
            });

        let decimals = self.state.preferences.decimals;
        egui::CentralPanel::default().show(ctx, |ui| {
            if has_data {
                measures_tab::show_results(ui, &mut self.measures_view, decimals);
            } else {
                welcome(ui);
            }
        });

        match action {
            MeasuresAction::None => {}
            MeasuresAction::Preview => self.preview_measures(),
            MeasuresAction::SaveExcel => self.save_measures_excel(),
            MeasuresAction::SaveCsv => self.save_measures_csv(),
            MeasuresAction::CopyTable => self.copy_table(),
        }
    }

    fn show_plots_tab(&mut self, ctx: &egui::Context) {
        let has_data = !self.dataset.is_empty();
        let mut action = PlotsAction::None;
        egui::SidePanel::left("plots_sidebar")
            .resizable(true)
            .default_width(260.0)
            .show(ctx, |ui| {
                action = plots_tab::show_sidebar(
                    ui,
                    &mut self.state.plots,
                    &self.available_columns,
                    has_data,
                );
            });

        let annotate = self.state.preferences.annotate_heatmap;
        egui::CentralPanel::default().show(ctx, |ui| {
            if has_data {
                let preview_action = plots_tab::show_previews(ui, &self.plots_view, annotate);
                if preview_action != PlotsAction::None {
                    action = preview_action;
                }
            } else {
                welcome(ui);
            }
        });

        match action {
            PlotsAction::None => {}
            PlotsAction::Preview => self.preview_plots(),
            PlotsAction::SaveAll => self.save_all_plots(),
            PlotsAction::SaveChart(i) => self.save_chart(i),
            PlotsAction::CopyChart(i) => self.copy_chart(i),
        }
    }
}

fn welcome(ui: &mut egui::Ui) {
    ui.add_space(80.0);
    ui.vertical_centered(|ui| {
        ui.heading("Welcome to SummaryStat");
        ui.add_space(12.0);
        ui.label(
            egui::RichText::new(
                "Click \"Load Files\" above, or drag-and-drop Excel / CSV files to get started.",
            )
            .weak(),
        );
    });
}

impl eframe::App for SummaryStatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(self.state.theme.visuals());

        // Dropped files replace the loaded set, like Load Files.
        let mut dropped_paths: Vec<PathBuf> = Vec::new();
        ctx.input(|i| {
            for file in &i.raw.dropped_files {
                if let Some(path) = &file.path {
                    if loader::is_supported(path) {
                        dropped_paths.push(path.clone());
                    } else {
                        tracing::warn!("Ignoring dropped file {:?}", path);
                    }
                }
            }
        });
        if !dropped_paths.is_empty() && self.pending_load.is_none() {
            self.start_load(dropped_paths, None);
        }

        self.poll_load();

        self.show_header(ctx);
        self.show_footer(ctx);
        match self.state.tab {
            Tab::Measures => self.show_measures_tab(ctx),
            Tab::Plots => self.show_plots_tab(ctx),
        }

        if self.pending_load.is_some() {
            egui::Window::new("Loading")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Loading files...");
                    });
                });
            ctx.request_repaint();
        }

        let mut sheet_result = None;
        if let Some(ref mut dialog) = self.sheet_dialog {
            sheet_result = sheet_selection_dialog::show_sheet_selection_dialog(ctx, dialog);
        }
        match sheet_result {
            Some(DialogResult::Ok(entries)) => {
                self.sheet_dialog = None;
                self.apply_sheet_selection(entries);
            }
            Some(DialogResult::Cancel) => self.sheet_dialog = None,
            None => {}
        }

        if self.show_preferences {
            self.show_preferences =
                preferences_dialog::show_preferences_dialog(ctx, &mut self.state.preferences);
        }
    }
}
