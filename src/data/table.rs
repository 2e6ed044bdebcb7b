/// A single spreadsheet cell after interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }
}

/// One named column of a sheet, stored row by row.
#[derive(Debug, Clone)]
pub struct TableColumn {
    pub name: String,
    pub cells: Vec<CellValue>,
}

impl TableColumn {
    /// A column is numeric when no cell holds text. An all-empty column
    /// counts as numeric (with no data), mirroring a float column of NaN.
    pub fn is_numeric(&self) -> bool {
        !self.cells.iter().any(|c| matches!(c, CellValue::Text(_)))
    }

    /// Values aligned to rows; `None` marks a missing value.
    pub fn numeric_values(&self) -> Vec<Option<f64>> {
        self.cells.iter().map(CellValue::as_number).collect()
    }

    /// Non-missing values in row order.
    pub fn dropna(&self) -> Vec<f64> {
        self.cells.iter().filter_map(CellValue::as_number).collect()
    }
}

/// One worksheet (or CSV file) as a set of columns.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub name: String,
    pub columns: Vec<TableColumn>,
    pub row_count: usize,
    /// Whether the sheet takes part in summaries and plots.
    pub included: bool,
}

impl SheetTable {
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The named column, if present and numeric.
    pub fn numeric_column(&self, name: &str) -> Option<&TableColumn> {
        self.column(name).filter(|c| c.is_numeric())
    }

    pub fn numeric_column_names(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .filter(|c| c.is_numeric())
            .map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(name: &str, cells: Vec<CellValue>) -> TableColumn {
        TableColumn { name: name.to_string(), cells }
    }

    #[test]
    fn text_cell_makes_column_non_numeric() {
        let col = column(
            "a",
            vec![CellValue::Number(1.0), CellValue::Text("x".into())],
        );
        assert!(!col.is_numeric());
    }

    #[test]
    fn empty_column_is_numeric_without_data() {
        let col = column("a", vec![CellValue::Empty, CellValue::Empty]);
        assert!(col.is_numeric());
        assert!(col.dropna().is_empty());
    }

    #[test]
    fn nan_numbers_are_treated_as_missing() {
        let col = column(
            "a",
            vec![
                CellValue::Number(2.0),
                CellValue::Number(f64::NAN),
                CellValue::Empty,
                CellValue::Number(4.0),
            ],
        );
        assert_eq!(col.dropna(), vec![2.0, 4.0]);
        assert_eq!(col.numeric_values(), vec![Some(2.0), None, None, Some(4.0)]);
    }

    #[test]
    fn numeric_column_lookup_skips_text_columns() {
        let sheet = SheetTable {
            name: "S".into(),
            columns: vec![
                column("num", vec![CellValue::Number(1.0)]),
                column("txt", vec![CellValue::Text("a".into())]),
            ],
            row_count: 1,
            included: true,
        };
        assert!(sheet.numeric_column("num").is_some());
        assert!(sheet.numeric_column("txt").is_none());
        assert!(sheet.numeric_column("missing").is_none());
        assert_eq!(sheet.numeric_column_names().collect::<Vec<_>>(), vec!["num"]);
    }
}
