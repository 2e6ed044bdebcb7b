pub mod chart;
pub mod png;
