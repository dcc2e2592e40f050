// File readers: spreadsheets and delimited text into string grids

pub mod csv;
pub mod xlsx;

use std::path::Path;

use rateio_recon::{RawSheet, Workbook};

/// Extensions handed to calamine.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

/// Read every sheet of `path`. Delimited text yields a single sheet named
/// after the file stem.
pub fn read_workbook(path: &Path) -> Result<Workbook, String> {
    if !path.is_file() {
        return Err(format!("File not found: {}", path.display()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let workbook = match ext.as_str() {
        "csv" | "txt" => Workbook::new(vec![csv::import(path)?]),
        "tsv" => Workbook::new(vec![csv::import_tsv(path)?]),
        e if SPREADSHEET_EXTENSIONS.contains(&e) => xlsx::import(path)?,
        "" => return Err(format!("Cannot tell the file type of {}", path.display())),
        other => return Err(format!("Unsupported file type '.{}': {}", other, path.display())),
    };

    log::debug!("read {} sheet(s) from {}", workbook.sheets.len(), path.display());
    Ok(workbook)
}

/// Read a single-table file: the first sheet of `path`.
pub fn read_table(path: &Path) -> Result<RawSheet, String> {
    read_workbook(path)?
        .sheets
        .into_iter()
        .next()
        .ok_or_else(|| format!("{} contains no sheets", path.display()))
}
