// Excel import (xlsx, xls, xlsb, ods) and xlsx export

use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use rust_xlsxwriter::{Format, Workbook as XlsxWorkbook};

use spcov_coverage::{Cell, Table};

/// Sheet name used for exported tables.
pub const EXPORT_SHEET_NAME: &str = "Sheet1";

fn open(path: &Path) -> Result<(Sheets<std::io::BufReader<std::fs::File>>, Vec<String>), String> {
    let workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file {}: {}", path.display(), e))?;
    let sheet_names = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err(format!("{}: Excel file contains no sheets", path.display()));
    }
    Ok((workbook, sheet_names))
}

/// Import one sheet as a table. The first sheet is read when `sheet` is `None`.
pub fn import(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let (mut workbook, sheet_names) = open(path)?;

    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| {
                format!(
                    "{}: no sheet named '{}' (available: {})",
                    path.display(),
                    name,
                    sheet_names.join(", ")
                )
            })?,
        None => sheet_names[0].clone(),
    };

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;
    Ok(range_to_table(&range))
}

/// Import and concatenate every sheet whose name contains `fragment`.
pub fn import_matching(path: &Path, fragment: &str) -> Result<Table, String> {
    let (mut workbook, sheet_names) = open(path)?;

    let matching: Vec<&String> = sheet_names.iter().filter(|s| s.contains(fragment)).collect();
    if matching.is_empty() {
        return Err(format!(
            "{}: no sheet name contains '{}' (available: {})",
            path.display(),
            fragment,
            sheet_names.join(", ")
        ));
    }

    let mut tables = Vec::with_capacity(matching.len());
    for sheet_name in matching {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;
        tables.push(range_to_table(&range));
    }
    Ok(Table::concat(tables))
}

/// First row of the used range is the header row.
fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();
    let headers = match rows.next() {
        Some(header) => header.iter().map(|c| data_to_cell(c).as_text().trim().to_string()).collect(),
        None => return Table::default(),
    };

    let mut table = Table::new(headers);
    for row in rows {
        table.push_row(row.iter().map(data_to_cell).collect());
    }
    table
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::text(s.as_str()),
        Data::Float(n) => Cell::Number(*n),
        Data::Int(n) => Cell::Number(*n as f64),
        Data::Bool(b) => Cell::text(if *b { "TRUE" } else { "FALSE" }),
        Data::Error(e) => Cell::text(format!("#{:?}", e)),
        // Serial date number, as Excel stores it
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) => Cell::text(s.as_str()),
        Data::DurationIso(s) => Cell::text(s.as_str()),
    }
}

/// Export a table to a single-sheet xlsx file with a bold header row.
pub fn export(table: &Table, path: &Path) -> Result<(), String> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = xlsx_workbook
        .add_worksheet()
        .set_name(EXPORT_SHEET_NAME)
        .map_err(|e| format!("Failed to create sheet '{}': {}", EXPORT_SHEET_NAME, e))?;

    for (col, header) in table.headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, header, &header_format)
            .map_err(|e| format!("Failed to write header '{}': {}", header, e))?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        let row32 = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col16 = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet
                        .write_string(row32, col16, s)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col16, e))?;
                }
                Cell::Number(n) => {
                    worksheet
                        .write_number(row32, col16, *n)
                        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row32, col16, e))?;
                }
            }
        }
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut table = Table::new(vec!["ASIN".into(), "Target".into(), "Current Bid".into()]);
        table.push_row(vec![Cell::text("B0ABC123XY"), Cell::text("wireless mouse"), Cell::Number(1.5)]);
        table.push_row(vec![Cell::text("B0ABC123XY"), Cell::text("pad"), Cell::Empty]);
        table
    }

    #[test]
    fn test_export_then_import_keeps_types() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("covered_targets.xlsx");

        export(&sample(), &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 100);

        let table = import(&path, None).unwrap();
        assert_eq!(table.headers, vec!["ASIN", "Target", "Current Bid"]);
        assert_eq!(table.rows[0][2], Cell::Number(1.5));
        assert!(Table::cell(&table.rows[1], 2).is_empty());
    }

    #[test]
    fn test_import_named_sheet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bmt.xlsx");
        export(&sample(), &path).unwrap();

        assert!(import(&path, Some(EXPORT_SHEET_NAME)).is_ok());
        let err = import(&path, Some("Targets")).unwrap_err();
        assert!(err.contains("no sheet named 'Targets'"), "{err}");
    }

    #[test]
    fn test_import_matching_concatenates_sheets() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("bulk.xlsx");

        let mut workbook = XlsxWorkbook::new();
        let sheets = [
            ("Sponsored Products Campaigns", "exact-campaign-1", 20.0),
            ("Sponsored Brands Campaigns", "SB_video", 90.0),
            ("Sponsored Products Campaigns 2", "broad-campaign-1", 35.0),
        ];
        for (name, campaign, pct) in sheets {
            let ws = workbook.add_worksheet().set_name(name).unwrap();
            ws.write_string(0, 0, "Campaign Name (Informational only)").unwrap();
            ws.write_string(0, 1, "Percentage").unwrap();
            ws.write_string(1, 0, campaign).unwrap();
            ws.write_number(1, 1, pct).unwrap();
        }
        workbook.save(&path).unwrap();

        let table = import_matching(&path, "Sponsored Products Campaigns").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0][0], Cell::text("exact-campaign-1"));
        assert_eq!(table.rows[1][1], Cell::Number(35.0));

        let err = import_matching(&path, "Sponsored Display").unwrap_err();
        assert!(err.contains("no sheet name contains"), "{err}");
    }
}
