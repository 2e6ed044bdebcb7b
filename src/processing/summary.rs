use crate::data::dataset::Dataset;
use crate::error::{Result, StatError};
use crate::processing::correlation::CorrelationMatrix;
use crate::processing::statistics::{format_value, Measure, Sample};

/// Measures for one column of one sheet, parallel to `Summary::measures`.
#[derive(Debug, Clone)]
pub struct ColumnSummary {
    pub name: String,
    pub count: usize,
    pub values: Vec<Option<f64>>,
}

impl ColumnSummary {
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

#[derive(Debug, Clone)]
pub struct SheetSummary {
    pub file_name: String,
    pub sheet_name: String,
    pub label: String,
    pub columns: Vec<ColumnSummary>,
    pub correlation: Option<CorrelationMatrix>,
}

/// Computed measures for every selected (sheet, column) pair.
#[derive(Debug, Clone)]
pub struct Summary {
    pub measures: Vec<Measure>,
    pub sheets: Vec<SheetSummary>,
}

/// Row of the master table: file, sheet and the column's measures.
pub struct MasterRow<'a> {
    pub file_name: &'a str,
    pub sheet_name: &'a str,
    pub column: &'a ColumnSummary,
}

impl Summary {
    /// Header of the master table.
    pub fn master_header(&self) -> Vec<&'static str> {
        let mut header = vec!["File", "Sheet", "Column"];
        header.extend(self.measures.iter().map(|m| m.column_name()));
        header
    }

    pub fn master_rows(&self) -> impl Iterator<Item = MasterRow<'_>> {
        self.sheets.iter().flat_map(|sheet| {
            sheet.columns.iter().map(move |column| MasterRow {
                file_name: &sheet.file_name,
                sheet_name: &sheet.sheet_name,
                column,
            })
        })
    }

    pub fn row_count(&self) -> usize {
        self.sheets.iter().map(|s| s.columns.len()).sum()
    }

    /// Master table as tab-separated text (for the clipboard).
    pub fn to_tsv(&self, decimals: usize) -> String {
        let mut out = self.master_header().join("\t");
        out.push('\n');
        for row in self.master_rows() {
            let mut fields = vec![
                row.file_name.to_string(),
                row.sheet_name.to_string(),
                row.column.name.clone(),
            ];
            fields.extend(row.column.values.iter().map(|v| match v {
                Some(_) => format_value(*v, decimals),
                None => String::new(),
            }));
            out.push_str(&fields.join("\t"));
            out.push('\n');
        }
        out
    }
}

/// Compute the selected measures for the selected columns of every
/// included sheet. Columns missing from a sheet, or not numeric there,
/// are skipped for that sheet.
pub fn summarize(
    dataset: &Dataset,
    columns: &[String],
    measures: &[Measure],
    correlation: bool,
) -> Result<Summary> {
    if columns.is_empty() {
        return Err(StatError::NothingSelected("columns"));
    }
    if measures.is_empty() && !correlation {
        return Err(StatError::NothingSelected("measures"));
    }

    let mut sheets = Vec::new();
    for source in dataset.sources() {
        let present: Vec<_> = columns
            .iter()
            .filter_map(|name| source.table.numeric_column(name))
            .collect();

        let column_summaries: Vec<ColumnSummary> = present
            .iter()
            .map(|column| {
                let sample = Sample::new(&column.dropna());
                ColumnSummary {
                    name: column.name.clone(),
                    count: sample.len(),
                    values: measures.iter().map(|m| m.compute(&sample)).collect(),
                }
            })
            .collect();

        let matrix = if correlation {
            let aligned: Vec<(String, Vec<Option<f64>>)> = present
                .iter()
                .map(|c| (c.name.clone(), c.numeric_values()))
                .collect();
            CorrelationMatrix::compute(&aligned)
        } else {
            None
        };

        tracing::debug!(
            "Summarised {} column(s) of '{}'",
            column_summaries.len(),
            source.label()
        );

        sheets.push(SheetSummary {
            file_name: source.file_name.to_string(),
            sheet_name: source.table.name.clone(),
            label: source.label(),
            columns: column_summaries,
            correlation: matrix,
        });
    }

    Ok(Summary {
        measures: measures.to_vec(),
        sheets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{numeric_column, sheet, workbook};
    use crate::data::table::{CellValue, TableColumn};

    fn dataset() -> Dataset {
        let text = TableColumn {
            name: "name".into(),
            cells: vec![CellValue::Text("a".into()), CellValue::Text("b".into())],
        };
        Dataset::new(vec![workbook(
            "book.xlsx",
            vec![
                sheet(
                    "S1",
                    vec![
                        text,
                        numeric_column("x", &[Some(1.0), Some(3.0)]),
                        numeric_column("y", &[Some(2.0), Some(6.0)]),
                    ],
                ),
                sheet("S2", vec![numeric_column("x", &[None, None])]),
            ],
        )])
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_selection_is_an_error() {
        let ds = dataset();
        assert!(matches!(
            summarize(&ds, &[], &[Measure::Mean], false),
            Err(StatError::NothingSelected("columns"))
        ));
        assert!(matches!(
            summarize(&ds, &cols(&["x"]), &[], false),
            Err(StatError::NothingSelected("measures"))
        ));
        assert!(summarize(&ds, &cols(&["x", "y"]), &[], true).is_ok());
    }

    #[test]
    fn skips_missing_and_text_columns_per_sheet() {
        let summary = summarize(
            &dataset(),
            &cols(&["x", "y", "name"]),
            &[Measure::Mean, Measure::Max],
            true,
        )
        .unwrap();

        assert_eq!(summary.sheets.len(), 2);
        let s1 = &summary.sheets[0];
        assert_eq!(s1.columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(s1.columns[0].values, vec![Some(2.0), Some(3.0)]);
        assert!(s1.correlation.is_some());

        let s2 = &summary.sheets[1];
        assert_eq!(s2.columns.len(), 1);
        assert!(!s2.columns[0].has_data());
        assert_eq!(s2.columns[0].values, vec![None, None]);
        assert!(s2.correlation.is_none());
        assert_eq!(summary.row_count(), 3);
    }

    #[test]
    fn excluded_sheets_are_not_summarised() {
        let mut ds = dataset();
        ds.workbooks[0].sheets[1].included = false;
        let summary = summarize(&ds, &cols(&["x"]), &[Measure::Count], false).unwrap();
        assert_eq!(summary.sheets.len(), 1);
        assert_eq!(summary.sheets[0].label, "S1");
    }

    #[test]
    fn tsv_lists_master_rows_with_blank_na() {
        let summary =
            summarize(&dataset(), &cols(&["x"]), &[Measure::Mean, Measure::Variance], false)
                .unwrap();
        let tsv = summary.to_tsv(2);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "File\tSheet\tColumn\tMean\tVariance");
        assert_eq!(lines[1], "book.xlsx\tS1\tx\t2.00\t2.00");
        assert_eq!(lines[2], "book.xlsx\tS2\tx\t\t");
    }
}
