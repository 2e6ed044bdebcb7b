pub mod app_state;
pub mod palette;
pub mod theme;
