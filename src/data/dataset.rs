use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::data::loader::Workbook;
use crate::data::table::SheetTable;

/// Inclusion flag of one loaded sheet, keyed by the workbook's full path so
/// files with the same name in different folders stay apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetEntry {
    pub path: PathBuf,
    pub file_name: String,
    pub sheet: String,
    pub included: bool,
}

/// An included sheet together with where it came from.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub file_name: &'a str,
    pub table: &'a SheetTable,
    multi_file: bool,
}

impl Source<'_> {
    /// Display label: the sheet name, prefixed with the file name when
    /// more than one file is loaded.
    pub fn label(&self) -> String {
        if self.multi_file {
            format!("{} - {}", self.file_name, self.table.name)
        } else {
            self.table.name.clone()
        }
    }
}

/// Everything currently loaded.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub workbooks: Vec<Workbook>,
}

impl Dataset {
    pub fn new(workbooks: Vec<Workbook>) -> Self {
        Self { workbooks }
    }

    pub fn is_empty(&self) -> bool {
        self.workbooks.is_empty()
    }

    pub fn sheet_count(&self) -> usize {
        self.workbooks.iter().map(|w| w.sheets.len()).sum()
    }

    pub fn included_count(&self) -> usize {
        self.sources().count()
    }

    /// Included sheets in load order.
    pub fn sources(&self) -> impl Iterator<Item = Source<'_>> {
        let multi_file = self.workbooks.len() > 1;
        self.workbooks
            .iter()
            .flat_map(move |workbook| {
                workbook
                    .sheets
                    .iter()
                    .filter(|s| s.included)
                    .map(move |table| Source {
                        file_name: &workbook.file_name,
                        table,
                        multi_file,
                    })
            })
    }

    /// Union of numeric column names over the included sheets, in the
    /// order they are first seen.
    pub fn numeric_columns(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for source in self.sources() {
            for name in source.table.numeric_column_names() {
                if !names.iter().any(|n| n == name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }

    /// One entry per loaded sheet, in load order.
    pub fn sheet_inclusion(&self) -> Vec<SheetEntry> {
        self.workbooks
            .iter()
            .flat_map(|w| {
                w.sheets.iter().map(move |s| SheetEntry {
                    path: w.path.clone(),
                    file_name: w.file_name.clone(),
                    sheet: s.name.clone(),
                    included: s.included,
                })
            })
            .collect()
    }

    /// Apply entries as produced by `sheet_inclusion`. Sheets without an
    /// entry keep their current flag.
    pub fn apply_inclusion(&mut self, entries: &[SheetEntry]) {
        for workbook in &mut self.workbooks {
            for sheet in &mut workbook.sheets {
                if let Some(entry) = entries
                    .iter()
                    .find(|e| e.path == workbook.path && e.sheet == sheet.name)
                {
                    sheet.included = entry.included;
                }
            }
        }
    }
}
