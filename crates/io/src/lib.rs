// File I/O operations: tabular files in, tables out

use std::path::Path;

use tracing::debug;

use spcov_coverage::Table;

pub mod csv;
pub mod xlsx;

/// File kinds recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
    /// xlsx, xlsm, xls, xlsb, ods
    Excel,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Excel),
            "" => Err(format!("{}: file has no extension", path.display())),
            other => Err(format!(
                "{}: unsupported file type '.{}' (expected csv, tsv, xlsx, xls, xlsb or ods)",
                path.display(),
                other
            )),
        }
    }
}

/// Read a table. `sheet` selects a workbook sheet and is ignored for
/// delimited files.
pub fn read_table(path: &Path, sheet: Option<&str>) -> Result<Table, String> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => crate::csv::import(path)?,
        TableFormat::Tsv => crate::csv::import_tsv(path)?,
        TableFormat::Excel => xlsx::import(path, sheet)?,
    };
    debug!(path = %path.display(), rows = table.len(), columns = table.headers.len(), "read table");
    Ok(table)
}

/// Read every workbook sheet whose name contains `fragment`, concatenated.
/// A delimited file is a single unnamed sheet and is read whole.
pub fn read_tables_matching(path: &Path, fragment: &str) -> Result<Table, String> {
    let table = match TableFormat::from_path(path)? {
        TableFormat::Csv => crate::csv::import(path)?,
        TableFormat::Tsv => crate::csv::import_tsv(path)?,
        TableFormat::Excel => xlsx::import_matching(path, fragment)?,
    };
    debug!(path = %path.display(), rows = table.len(), fragment, "read matching sheets");
    Ok(table)
}

/// Write a table; the format follows the extension. Only xlsx is written
/// among workbook formats.
pub fn write_table(path: &Path, table: &Table) -> Result<(), String> {
    match TableFormat::from_path(path)? {
        TableFormat::Csv => crate::csv::export(table, path)?,
        TableFormat::Tsv => crate::csv::export_tsv(table, path)?,
        TableFormat::Excel => {
            let is_xlsx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
            if !is_xlsx {
                return Err(format!("{}: only .xlsx workbooks can be written", path.display()));
            }
            xlsx::export(table, path)?
        }
    }
    debug!(path = %path.display(), rows = table.len(), "wrote table");
    Ok(())
}
