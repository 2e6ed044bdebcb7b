use std::collections::HashSet;

use crate::data::table::{CellValue, SheetTable, TableColumn};

/// Strings read as missing values in text sources.
const NA_TOKENS: [&str; 13] = [
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "#N/A", "#NA",
    "<NA>",
];

/// Interpret a raw text cell (CSV) as empty, numeric or text.
pub fn parse_text_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() || NA_TOKENS.contains(&trimmed) {
        return CellValue::Empty;
    }
    match trimmed.parse::<f64>() {
        Ok(v) => CellValue::Number(v),
        Err(_) => CellValue::Text(trimmed.to_string()),
    }
}

/// Interpret a calamine cell. Only real numbers count as numeric; strings,
/// booleans and dates keep the column out of the numeric set.
pub fn excel_cell(cell: &calamine::Data) -> CellValue {
    use calamine::Data;

    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Text(b.to_string()),
        Data::DateTime(dt) => CellValue::Text(dt.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

/// Index of the header row: the first row with any content.
pub fn detect_header_row(rows: &[Vec<CellValue>]) -> Option<usize> {
    rows.iter().position(|row| row.iter().any(|c| !c.is_empty()))
}

/// Build column names from a header row.
///
/// Blank headers become `Unnamed: <index>` and repeated names get `.1`,
/// `.2`, ... suffixes so every column can be addressed by name.
pub fn column_names(header: &[CellValue], width: usize) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(width);

    for idx in 0..width {
        let base = match header.get(idx) {
            Some(CellValue::Text(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(CellValue::Number(v)) => format_header_number(*v),
            _ => format!("Unnamed: {idx}"),
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{base}.{suffix}");
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

fn format_header_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

/// Turn row-major cells into a column-major sheet table.
pub fn rows_to_table(name: &str, rows: Vec<Vec<CellValue>>) -> SheetTable {
    let Some(header_idx) = detect_header_row(&rows) else {
        return SheetTable {
            name: name.to_string(),
            columns: Vec::new(),
            row_count: 0,
            included: true,
        };
    };

    let data_rows = &rows[header_idx + 1..];
    let width = data_rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(rows[header_idx].len()))
        .max()
        .unwrap_or(0);

    let names = column_names(&rows[header_idx], width);
    let mut columns: Vec<TableColumn> = names
        .into_iter()
        .map(|name| TableColumn {
            name,
            cells: Vec::with_capacity(data_rows.len()),
        })
        .collect();

    for row in data_rows {
        for (col_idx, column) in columns.iter_mut().enumerate() {
            column
                .cells
                .push(row.get(col_idx).cloned().unwrap_or(CellValue::Empty));
        }
    }

    SheetTable {
        name: name.to_string(),
        columns,
        row_count: data_rows.len(),
        included: true,
    }
}
