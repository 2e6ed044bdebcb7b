use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::dataset::SheetEntry;
use crate::error::Result;
use crate::processing::distribution::DEFAULT_BINS;
use crate::processing::statistics::Measure;
use crate::render::chart::PlotKind;
use crate::render::png::RenderOptions;
use crate::state::theme::Theme;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extension used for saved sessions.
pub const SESSION_EXTENSION: &str = "summarystat";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Tab {
    #[default]
    Measures,
    Plots,
}

impl Tab {
    pub fn label(&self) -> &'static str {
        match self {
            Tab::Measures => "Measures",
            Tab::Plots => "Plots",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Decimal places shown in previews and copied tables.
    pub decimals: usize,
    pub histogram_bins: usize,
    /// Multiplier applied to the base chart size when exporting images.
    pub export_scale: f32,
    pub annotate_heatmap: bool,
}

impl Preferences {
    pub const DECIMALS: std::ops::RangeInclusive<usize> = 0..=10;
    pub const BINS: std::ops::RangeInclusive<usize> = 1..=200;
    pub const SCALE: std::ops::RangeInclusive<f32> = 0.5..=4.0;

    /// Pull every field back into its allowed range.
    pub fn clamp(&mut self) {
        self.decimals = self.decimals.clamp(*Self::DECIMALS.start(), *Self::DECIMALS.end());
        self.histogram_bins = self.histogram_bins.clamp(*Self::BINS.start(), *Self::BINS.end());
        self.export_scale = if self.export_scale.is_finite() {
            self.export_scale.clamp(*Self::SCALE.start(), *Self::SCALE.end())
        } else {
            1.0
        };
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            scale: self.export_scale,
            annotate_heatmap: self.annotate_heatmap,
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            decimals: 4,
            histogram_bins: DEFAULT_BINS,
            export_scale: 1.0,
            annotate_heatmap: true,
        }
    }
}

/// Selections on the Measures tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureSelection {
    pub columns: Vec<String>,
    pub measures: Vec<Measure>,
    pub correlation: bool,
}

impl MeasureSelection {
    /// Selected measures in display order.
    pub fn ordered_measures(&self) -> Vec<Measure> {
        Measure::ALL
            .iter()
            .copied()
            .filter(|m| self.measures.contains(m))
            .collect()
    }
}

impl Default for MeasureSelection {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            measures: Measure::ALL.to_vec(),
            correlation: true,
        }
    }
}

/// Selections on the Plots tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSelection {
    pub columns: Vec<String>,
    pub kinds: Vec<PlotKind>,
}

impl Default for PlotSelection {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            kinds: vec![PlotKind::Histogram],
        }
    }
}

/// Everything persisted in a session file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppState {
    pub files: Vec<PathBuf>,
    pub sheets: Vec<SheetEntry>,
    pub tab: Tab,
    pub measures: MeasureSelection,
    pub plots: PlotSelection,
    pub preferences: Preferences,
    pub theme: Theme,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            sheets: Vec::new(),
            tab: Tab::default(),
            measures: MeasureSelection::default(),
            plots: PlotSelection::default(),
            preferences: Preferences::default(),
            theme: Theme::default(),
        }
    }

    /// Select every available column on both tabs, as after a fresh load.
    pub fn select_all_columns(&mut self, available: &[String]) {
        self.measures.columns = available.to_vec();
        self.plots.columns = available.to_vec();
    }

    /// Drop selected columns that are no longer offered.
    pub fn retain_columns(&mut self, available: &[String]) {
        self.measures.columns.retain(|c| available.contains(c));
        self.plots.columns.retain(|c| available.contains(c));
    }

    /// Follow a change of the offered columns: columns that were not offered
    /// before are selected on both tabs, ones that are gone are dropped.
    pub fn refresh_columns(&mut self, previous: &[String], available: &[String]) {
        for column in available.iter().filter(|c| !previous.contains(c)) {
            set_selected(&mut self.measures.columns, column, true);
            set_selected(&mut self.plots.columns, column, true);
        }
        self.retain_columns(available);
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        tracing::info!("Session saved to {:?}", path);
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let mut state: AppState = serde_json::from_str(&json)?;
        state.preferences.clamp();
        tracing::info!("Session loaded from {:?}", path);
        Ok(state)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Keep the items of `available` that are in `selected`, in the order of
/// `available`.
pub fn in_display_order(available: &[String], selected: &[String]) -> Vec<String> {
    available
        .iter()
        .filter(|c| selected.contains(c))
        .cloned()
        .collect()
}

/// Add or remove `item` from a selection list.
pub fn set_selected<T: PartialEq + Clone>(list: &mut Vec<T>, item: &T, selected: bool) {
    let present = list.contains(item);
    if selected && !present {
        list.push(item.clone());
    } else if !selected && present {
        list.retain(|x| x != item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_everything_but_plots() {
        let state = AppState::new();
        assert_eq!(state.measures.measures.len(), Measure::ALL.len());
        assert!(state.measures.correlation);
        assert_eq!(state.plots.kinds, vec![PlotKind::Histogram]);
        assert_eq!(state.preferences.decimals, 4);
        assert_eq!(state.preferences.histogram_bins, 20);
    }

    #[test]
    fn session_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.summarystat");

        let mut state = AppState::new();
        state.files.push(PathBuf::from("/data/book.xlsx"));
        state.sheets.push(SheetEntry {
            path: PathBuf::from("/data/book.xlsx"),
            file_name: "book.xlsx".into(),
            sheet: "Sheet1".into(),
            included: false,
        });
        state.measures.measures = vec![Measure::Mean, Measure::Iqr];
        state.plots.kinds = vec![PlotKind::Boxplot, PlotKind::CorrelationHeatmap];
        state.tab = Tab::Plots;
        state.theme = Theme::Light;
        state.save(&path).unwrap();

        let loaded = AppState::load(&path).unwrap();
        assert_eq!(loaded.files, state.files);
        assert_eq!(loaded.sheets, state.sheets);
        assert_eq!(loaded.measures, state.measures);
        assert_eq!(loaded.plots, state.plots);
        assert_eq!(loaded.tab, Tab::Plots);
        assert_eq!(loaded.theme, Theme::Light);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let state: AppState = serde_json::from_str(r#"{"preferences": {"decimals": 2}}"#).unwrap();
        assert_eq!(state.preferences.decimals, 2);
        assert_eq!(state.preferences.histogram_bins, 20);
        assert!(state.measures.correlation);
    }

    #[test]
    fn loading_clamps_out_of_range_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.summarystat");
        std::fs::write(
            &path,
            r#"{"preferences": {"decimals": 99, "histogram_bins": 0, "export_scale": 10.0}}"#,
        )
        .unwrap();
        let prefs = AppState::load(&path).unwrap().preferences;
        assert_eq!(prefs.decimals, 10);
        assert_eq!(prefs.histogram_bins, 1);
        assert_eq!(prefs.export_scale, 4.0);
    }

    #[test]
    fn invalid_session_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.summarystat");
        std::fs::write(&path, "not json").unwrap();
        assert!(AppState::load(&path).is_err());
    }

    #[test]
    fn selections_keep_display_order() {
        let available: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let mut selected = vec!["c".to_string()];
        set_selected(&mut selected, &"a".to_string(), true);
        set_selected(&mut selected, &"a".to_string(), true);
        assert_eq!(selected, vec!["c", "a"]);
        assert_eq!(in_display_order(&available, &selected), vec!["a", "c"]);

        set_selected(&mut selected, &"c".to_string(), false);
        assert_eq!(selected, vec!["a"]);

        let mut sel = MeasureSelection::default();
        sel.measures = vec![Measure::Max, Measure::Count];
        assert_eq!(sel.ordered_measures(), vec![Measure::Count, Measure::Max]);
    }

    #[test]
    fn retain_drops_unavailable_columns() {
        let mut state = AppState::new();
        state.select_all_columns(&["x".to_string(), "y".to_string()]);
        state.retain_columns(&["y".to_string()]);
        assert_eq!(state.measures.columns, vec!["y"]);
        assert_eq!(state.plots.columns, vec!["y"]);
    }

    #[test]
    fn refresh_selects_new_columns_and_keeps_user_choices() {
        let names = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut state = AppState::new();
        state.select_all_columns(&names(&["a", "b"]));
        set_selected(&mut state.measures.columns, &"b".to_string(), false);

        state.refresh_columns(&names(&["a", "b"]), &names(&["b", "c"]));

        // "b" stays deselected on Measures, "c" is new, "a" disappeared
        assert_eq!(state.measures.columns, vec!["c"]);
        assert_eq!(state.plots.columns, vec!["b", "c"]);
    }
}
