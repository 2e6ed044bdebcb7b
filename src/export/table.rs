use std::path::Path;

use crate::error::Result;
use crate::processing::summary::Summary;

/// Write the master table (File, Sheet, Column, measures) as CSV.
/// Undefined measures are empty fields.
pub fn write_csv(summary: &Summary, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(summary.master_header())?;

    for row in summary.master_rows() {
        let mut record = vec![
            row.file_name.to_string(),
            row.sheet_name.to_string(),
            row.column.name.clone(),
        ];
        record.extend(
            row.column
                .values
                .iter()
                .map(|v| v.map(|v| v.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    tracing::info!("Exported {} row(s) to {:?}", summary.row_count(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::tests::{numeric_column, sheet, workbook};
    use crate::data::dataset::Dataset;
    use crate::processing::statistics::Measure;
    use crate::processing::summary::summarize;

    #[test]
    fn csv_has_master_header_and_blank_na() {
        let ds = Dataset::new(vec![
            workbook("a.csv", vec![sheet("a", vec![numeric_column("v", &[Some(1.0), Some(4.0)])])]),
            workbook("b.csv", vec![sheet("b", vec![numeric_column("v", &[Some(2.0)])])]),
        ]);
        let summary = summarize(
            &ds,
            &["v".to_string()],
            &[Measure::Count, Measure::Mean, Measure::StdDev],
            false,
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("measures.csv");
        write_csv(&summary, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "File,Sheet,Column,Count,Mean,Standard Deviation");
        assert_eq!(lines[1], "a.csv,a,v,2,2.5,2.1213203435596424");
        assert_eq!(lines[2], "b.csv,b,v,1,2,");
        assert_eq!(lines.len(), 3);
    }
}
