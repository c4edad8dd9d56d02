//! Raw tabular file access for `.xlsx` workbooks and `.csv` files.

use super::columns::Column;
use crate::error::SheetError;
use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;

/// Cells of a spreadsheet as text: a header row and the data rows below it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Spreadsheet row number of the header row (1 unless leading rows are empty).
    pub header_row: usize,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Excel,
    Csv,
}

fn file_format(path: &Path) -> Result<FileKind, SheetError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "ods" => Ok(FileKind::Excel),
        "csv" => Ok(FileKind::Csv),
        _ => Err(SheetError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read the first worksheet (or the CSV file) at `path`.
pub fn read_table(path: &Path) -> Result<Table, SheetError> {
    if !path.exists() {
        return Err(SheetError::NotFound(path.display().to_string()));
    }
    log::info!("Reading spreadsheet {}", path.display());
    match file_format(path)? {
        FileKind::Excel => read_excel(path),
        FileKind::Csv => read_csv(path),
    }
}

/// Write `table` to `path`, the format chosen by extension (`.xlsx` or `.csv`).
pub fn write_table(path: &Path, table: &Table) -> Result<(), SheetError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    log::info!("Writing {} rows to {}", table.rows.len(), path.display());
    match file_format(path)? {
        FileKind::Csv => write_csv(path, table),
        FileKind::Excel => {
            let is_xlsx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
            if !is_xlsx {
                return Err(SheetError::UnsupportedFormat(path.display().to_string()));
            }
            write_xlsx(path, table)
        }
    }
}

/// Spreadsheet cell as trimmed text. Whole floats lose their fraction so
/// a VLAN ID typed as 10 reads back as "10" and not "10.0".
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string().trim().to_string(),
    }
}

/// Header cells are kept verbatim, headers match exactly.
fn header_to_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_to_string(other),
    }
}

fn read_excel(path: &Path) -> Result<Table, SheetError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SheetError::NoWorksheet(path.display().to_string()))??;

    // the range starts at the first non-empty cell
    let header_row = range.start().map(|(row, _col)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();
    let headers = rows
        .next()
        .map(|r| r.iter().map(header_to_string).collect())
        .unwrap_or_default();
    let rows = rows
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect();

    Ok(Table {
        header_row,
        headers,
        rows,
    })
}

fn read_csv(path: &Path) -> Result<Table, SheetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect(),
        None => Vec::new(),
    };
    let mut rows = Vec::new();
    for record in records {
        rows.push(record?.iter().map(|c| c.trim().to_string()).collect());
    }

    Ok(Table {
        header_row: 1,
        headers,
        rows,
    })
}

fn write_csv(path: &Path, table: &Table) -> Result<(), SheetError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(path: &Path, table: &Table) -> Result<(), SheetError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let numeric_col = table.headers.iter().position(|h| h == Column::VlanId.header());

    let worksheet = workbook.add_worksheet();
    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, &bold)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let row_num = (i + 1) as u32;
        for (col, value) in row.iter().enumerate() {
            match value.parse::<i64>() {
                Ok(n) if Some(col) == numeric_col => {
                    worksheet.write_number(row_num, col as u16, n as f64)?;
                }
                _ => {
                    worksheet.write_string(row_num, col as u16, value)?;
                }
            }
        }
    }
    worksheet.autofit();

    workbook.save(path)?;
    Ok(())
}
