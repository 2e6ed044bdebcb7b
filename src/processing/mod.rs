pub mod correlation;
pub mod distribution;
pub mod statistics;
pub mod summary;
