use std::path::{Path, PathBuf};

use crate::data::parser;
use crate::data::table::{CellValue, SheetTable};
use crate::error::{Result, StatError};

/// Extensions accepted by the file dialog and drag-and-drop.
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

/// A loaded spreadsheet file and all of its readable sheets.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub path: PathBuf,
    pub file_name: String,
    pub sheets: Vec<SheetTable>,
}

/// Outcome of loading several files; failures don't stop the others.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub workbooks: Vec<Workbook>,
    pub failures: Vec<(PathBuf, String)>,
}

impl LoadReport {
    pub fn sheet_count(&self) -> usize {
        self.workbooks.iter().map(|w| w.sheets.len()).sum()
    }

    /// One line per failed file, for the status bar.
    pub fn failure_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .failures
            .iter()
            .map(|(path, err)| format!("{}: {err}", display_name(path)))
            .collect();
        Some(format!("Failed to load {}", lines.join("; ")))
    }
}

pub fn is_supported(path: &Path) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension(path).as_str())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Load several files in order, collecting per-file failures.
pub fn load_files(paths: &[PathBuf]) -> LoadReport {
    let mut report = LoadReport::default();
    for path in paths {
        match load_file(path) {
            Ok(workbook) => {
                tracing::info!(
                    "Loaded {:?} ({} sheet(s))",
                    path,
                    workbook.sheets.len()
                );
                report.workbooks.push(workbook);
            }
            Err(e) => {
                tracing::error!("Failed to load {:?}: {e}", path);
                report.failures.push((path.clone(), e.to_string()));
            }
        }
    }
    report
}

/// Load a CSV or Excel-family file.
pub fn load_file(path: &Path) -> Result<Workbook> {
    let ext = extension(path);
    let sheets = match ext.as_str() {
        "csv" => vec![load_csv(path)?],
        "xls" | "xlsx" | "xlsm" | "xlsb" | "ods" => load_excel(path)?,
        _ => return Err(StatError::UnsupportedFormat(ext)),
    };

    Ok(Workbook {
        path: path.to_path_buf(),
        file_name: display_name(path),
        sheets,
    })
}

fn load_csv(path: &Path) -> Result<SheetTable> {
    let content = std::fs::read(path)?;
    // Fall back to Latin-1 when the file is not valid UTF-8.
    let text = match String::from_utf8(content) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| b as char).collect(),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<Vec<CellValue>> = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(parser::parse_text_cell).collect());
    }

    let sheet_name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "CSV".to_string());

    Ok(parser::rows_to_table(&sheet_name, rows))
}

fn load_excel(path: &Path) -> Result<Vec<SheetTable>> {
    use calamine::{open_workbook_auto, Reader};

    let mut workbook = open_workbook_auto(path).map_err(|e| StatError::Workbook {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut sheets = Vec::new();
    for sheet_name in workbook.sheet_names() {
        let range = match workbook.worksheet_range(&sheet_name) {
            Ok(range) => range,
            Err(e) => {
                let err = StatError::Sheet {
                    sheet: sheet_name.clone(),
                    message: e.to_string(),
                };
                tracing::warn!("Skipping sheet in {:?}: {err}", path);
                continue;
            }
        };

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(parser::excel_cell).collect())
            .collect();
        sheets.push(parser::rows_to_table(&sheet_name, rows));
    }

    if sheets.is_empty() {
        return Err(StatError::Workbook {
            path: path.to_path_buf(),
            message: "no readable sheets".to_string(),
        });
    }

    Ok(sheets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn csv_file_becomes_single_sheet_named_after_stem() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "name,math,art").unwrap();
        writeln!(file, "ann,90,NA").unwrap();
        writeln!(file, "bob,70,5").unwrap();
        drop(file);

        let workbook = load_file(&path).unwrap();
        assert_eq!(workbook.file_name, "scores.csv");
        assert_eq!(workbook.sheets.len(), 1);

        let sheet = &workbook.sheets[0];
        assert_eq!(sheet.name, "scores");
        assert_eq!(sheet.row_count, 2);
        assert_eq!(sheet.numeric_column_names().collect::<Vec<_>>(), vec!["math", "art"]);
        assert_eq!(sheet.column("art").unwrap().dropna(), vec![5.0]);
    }

    #[test]
    fn latin1_csv_is_decoded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        std::fs::write(&path, b"caf\xe9,x\n1,2\n").unwrap();

        let workbook = load_file(&path).unwrap();
        assert_eq!(workbook.sheets[0].columns[0].name, "caf\u{e9}");
    }

    #[test]
    fn excel_workbook_loads_every_sheet() {
        use rust_xlsxwriter::Workbook as XlsxWorkbook;

        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let mut book = XlsxWorkbook::new();

        let one = book.add_worksheet();
        one.set_name("One").unwrap();
        // header on the second row
        one.write_string(1, 0, "x").unwrap();
        one.write_string(1, 1, "name").unwrap();
        one.write_number(2, 0, 1.5).unwrap();
        one.write_string(2, 1, "ann").unwrap();
        one.write_number(3, 0, 2.5).unwrap();
        one.write_string(3, 1, "bob").unwrap();

        let two = book.add_worksheet();
        two.set_name("Two").unwrap();
        two.write_string(0, 0, "z").unwrap();
        two.write_number(1, 0, 7.0).unwrap();
        book.save(&path).unwrap();

        let workbook = load_file(&path).unwrap();
        assert_eq!(workbook.file_name, "book.xlsx");
        let names: Vec<&str> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["One", "Two"]);

        let one = &workbook.sheets[0];
        let columns: Vec<&str> = one.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(columns, vec!["x", "name"]);
        assert_eq!(one.row_count, 2);
        assert_eq!(one.numeric_column_names().collect::<Vec<_>>(), vec!["x"]);
        assert_eq!(one.column("x").unwrap().dropna(), vec![1.5, 2.5]);

        let two = &workbook.sheets[1];
        assert_eq!(two.numeric_column_names().collect::<Vec<_>>(), vec!["z"]);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("notes.txt")).unwrap_err();
        assert!(matches!(err, StatError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn load_files_keeps_going_after_a_failure() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.csv");
        std::fs::write(&good, "a\n1\n2\n").unwrap();
        let missing = dir.path().join("missing.csv");

        let report = load_files(&[missing.clone(), good]);
        assert_eq!(report.workbooks.len(), 1);
        assert_eq!(report.sheet_count(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, missing);
        assert!(report.failure_message().unwrap().contains("missing.csv"));
    }

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported(Path::new("a/B.XLSX")));
        assert!(is_supported(Path::new("data.csv")));
        assert!(!is_supported(Path::new("data.json")));
    }
}
