pub mod dataset;
pub mod loader;
pub mod parser;
pub mod table;
