use egui::{Color32, CornerRadius, Stroke, Visuals};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Base visuals with the app's rounding and hover strokes.
    pub fn visuals(&self) -> Visuals {
        let mut vis = match self {
            Theme::Dark => Visuals::dark(),
            Theme::Light => Visuals::light(),
        };
        vis.window_corner_radius = CornerRadius::same(8);
        for widget in [
            &mut vis.widgets.noninteractive,
            &mut vis.widgets.inactive,
            &mut vis.widgets.hovered,
            &mut vis.widgets.active,
            &mut vis.widgets.open,
        ] {
            widget.corner_radius = CornerRadius::same(6);
        }
        vis.widgets.hovered.bg_stroke = Stroke::new(1.5, Color32::from_gray(160));
        vis.widgets.active.bg_stroke = Stroke::new(2.0, Color32::from_gray(200));
        vis
    }

    /// Text of the button that switches to the other theme.
    pub fn toggle_label(&self) -> &'static str {
        match self {
            Theme::Dark => "Light Mode",
            Theme::Light => "Dark Mode",
        }
    }

    pub fn error_color(&self) -> Color32 {
        match self {
            Theme::Dark => Color32::from_rgb(255, 80, 80),
            Theme::Light => Color32::from_rgb(200, 30, 30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_theme() {
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Light.toggle().toggle(), Theme::Light);
        assert_eq!(Theme::Dark.toggle_label(), "Light Mode");
    }

    #[test]
    fn visuals_follow_theme() {
        assert!(Theme::Dark.visuals().dark_mode);
        assert!(!Theme::Light.visuals().dark_mode);
        assert_eq!(Theme::Light.visuals().window_corner_radius, CornerRadius::same(8));
    }
}
