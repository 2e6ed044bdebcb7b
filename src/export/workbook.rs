//! Excel export of a computed summary.
//!
//! Layout: one worksheet of measures per sheet, a `<label>_Correlation`
//! worksheet per correlation matrix, and a final `Master_Descriptive`
//! worksheet that stacks every (file, sheet, column) row.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::Result;
use crate::processing::correlation::CorrelationMatrix;
use crate::processing::summary::{SheetSummary, Summary};

/// Excel's limit on worksheet name length.
const MAX_SHEET_NAME: usize = 31;

pub const MASTER_SHEET: &str = "Master_Descriptive";

/// Worksheet names handed out so far, compared without regard to case.
#[derive(Debug, Default)]
struct SheetNames {
    used: Vec<String>,
}

impl SheetNames {
    /// A legal, unique worksheet name derived from `base`.
    fn claim(&mut self, base: &str) -> String {
        let cleaned: String = base
            .chars()
            .map(|c| match c {
                '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
                c => c,
            })
            .collect();
        let cleaned = cleaned.trim_matches('\'');
        let cleaned = if cleaned.is_empty() { "Sheet" } else { cleaned };

        let mut name = truncate(cleaned, MAX_SHEET_NAME);
        let mut n = 2;
        while self.is_used(&name) {
            let suffix = format!("_{n}");
            name = format!("{}{suffix}", truncate(cleaned, MAX_SHEET_NAME - suffix.len()));
            n += 1;
        }
        self.used.push(name.to_lowercase());
        name
    }

    fn is_used(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.used.iter().any(|u| *u == lower)
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: Option<f64>) -> Result<()> {
    // Undefined and non-finite values stay blank.
    if let Some(v) = value.filter(|v| v.is_finite()) {
        sheet.write_number(row, col, v)?;
    }
    Ok(())
}

fn write_header(sheet: &mut Worksheet, header: &[&str], bold: &Format) -> Result<()> {
    for (col, title) in header.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, bold)?;
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn write_measures_sheet(
    workbook: &mut Workbook,
    names: &mut SheetNames,
    summary: &Summary,
    sheet_summary: &SheetSummary,
    bold: &Format,
) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(names.claim(&sheet_summary.label))?;

    let mut header = vec!["Column"];
    header.extend(summary.measures.iter().map(|m| m.column_name()));
    write_header(sheet, &header, bold)?;

    for (i, column) in sheet_summary.columns.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, &column.name)?;
        for (j, value) in column.values.iter().enumerate() {
            write_value(sheet, row, j as u16 + 1, *value)?;
        }
    }

    sheet.autofit();
    Ok(())
}

fn write_correlation_sheet(
    workbook: &mut Workbook,
    names: &mut SheetNames,
    label: &str,
    matrix: &CorrelationMatrix,
    bold: &Format,
) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(names.claim(&format!("{label}_Correlation")))?;

    let mut header = vec![""];
    header.extend(matrix.labels.iter().map(String::as_str));
    write_header(sheet, &header, bold)?;
    sheet.set_freeze_panes(1, 1)?;

    for (r, name) in matrix.labels.iter().enumerate() {
        let row = r as u32 + 1;
        sheet.write_string_with_format(row, 0, name, bold)?;
        for c in 0..matrix.size() {
            write_value(sheet, row, c as u16 + 1, matrix.get(r, c))?;
        }
    }

    sheet.autofit();
    Ok(())
}

fn write_master_sheet(
    workbook: &mut Workbook,
    names: &mut SheetNames,
    summary: &Summary,
    bold: &Format,
) -> Result<()> {
    let sheet = workbook.add_worksheet();
    sheet.set_name(names.claim(MASTER_SHEET))?;
    write_header(sheet, &summary.master_header(), bold)?;

    for (i, row) in summary.master_rows().enumerate() {
        let r = i as u32 + 1;
        sheet.write_string(r, 0, row.file_name)?;
        sheet.write_string(r, 1, row.sheet_name)?;
        sheet.write_string(r, 2, &row.column.name)?;
        for (j, value) in row.column.values.iter().enumerate() {
            write_value(sheet, r, j as u16 + 3, *value)?;
        }
    }

    sheet.autofit();
    Ok(())
}

/// Write the summary to an `.xlsx` file at `path`.
pub fn write_workbook(summary: &Summary, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let mut names = SheetNames::default();
    let bold = Format::new().set_bold();
    let has_measures = !summary.measures.is_empty();

    for sheet_summary in &summary.sheets {
        if has_measures {
            write_measures_sheet(&mut workbook, &mut names, summary, sheet_summary, &bold)?;
        }
        if let Some(matrix) = &sheet_summary.correlation {
            write_correlation_sheet(&mut workbook, &mut names, &sheet_summary.label, matrix, &bold)?;
        }
    }
    write_master_sheet(&mut workbook, &mut names, summary, &bold)?;

    workbook.save(path)?;
    tracing::info!("Exported measures to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{numeric_column, sheet, workbook};
    use crate::data::dataset::Dataset;
    use crate::processing::statistics::Measure;
    use crate::processing::summary::summarize;
    use calamine::{open_workbook_auto, Data, Reader};

    fn summary(correlation: bool) -> Summary {
        let ds = Dataset::new(vec![workbook(
            "book.xlsx",
            vec![
                sheet(
                    "Scores",
                    vec![
                        numeric_column("math", &[Some(1.0), Some(2.0), Some(3.0)]),
                        numeric_column("art", &[Some(3.0), Some(1.0), None]),
                    ],
                ),
                sheet("Empty", vec![numeric_column("math", &[None, None, None])]),
            ],
        )]);
        let columns = vec!["math".to_string(), "art".to_string()];
        summarize(&ds, &columns, &[Measure::Mean, Measure::Variance], correlation).unwrap()
    }

    #[test]
    fn sheet_names_are_legal_and_unique() {
        let mut names = SheetNames::default();
        assert_eq!(names.claim("a/b:c"), "a_b_c");
        assert_eq!(names.claim("A_B_C"), "A_B_C_2");
        assert_eq!(names.claim("'quoted'"), "quoted");
        assert_eq!(names.claim(""), "Sheet");

        let long = "x".repeat(40);
        let first = names.claim(&long);
        let second = names.claim(&long);
        assert_eq!(first.chars().count(), 31);
        assert_eq!(second.chars().count(), 31);
        assert!(second.ends_with("_2"));
    }

    #[test]
    fn export_writes_measure_correlation_and_master_sheets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        write_workbook(&summary(true), &path).unwrap();

        let mut book = open_workbook_auto(&path).unwrap();
        assert_eq!(
            book.sheet_names(),
            vec!["Scores", "Scores_Correlation", "Empty", MASTER_SHEET]
        );

        let scores = book.worksheet_range("Scores").unwrap();
        assert_eq!(scores.get_value((0, 0)), Some(&Data::String("Column".into())));
        assert_eq!(scores.get_value((0, 2)), Some(&Data::String("Variance".into())));
        assert_eq!(scores.get_value((1, 0)), Some(&Data::String("math".into())));
        assert_eq!(scores.get_value((1, 1)), Some(&Data::Float(2.0)));

        let corr = book.worksheet_range("Scores_Correlation").unwrap();
        assert_eq!(corr.get_value((0, 1)), Some(&Data::String("math".into())));
        assert_eq!(corr.get_value((1, 1)), Some(&Data::Float(1.0)));
        assert_eq!(corr.get_value((2, 1)), Some(&Data::Float(-1.0)));

        let master = book.worksheet_range(MASTER_SHEET).unwrap();
        assert_eq!(master.get_value((0, 3)), Some(&Data::String("Mean".into())));
        assert_eq!(master.get_value((3, 1)), Some(&Data::String("Empty".into())));
        // an all-missing column exports blank measures
        assert!(matches!(master.get_value((3, 3)), None | Some(Data::Empty)));
    }

    #[test]
    fn correlation_sheets_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.xlsx");
        write_workbook(&summary(false), &path).unwrap();

        let book = open_workbook_auto(&path).unwrap();
        assert_eq!(book.sheet_names(), vec!["Scores", "Empty", MASTER_SHEET]);
    }
}
