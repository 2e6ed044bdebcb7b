pub mod table;
pub mod workbook;
