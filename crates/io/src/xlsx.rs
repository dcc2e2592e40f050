// Excel import (xlsx, xlsm, xls, xlsb, ods)

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader, Sheets};

use rateio_recon::{RawSheet, Workbook};

/// Import every sheet in workbook order. The first non-blank row of each
/// sheet is its header; sheets with no data come back with no headers.
/// A sheet whose cells cannot be read is kept, marked unreadable.
pub fn import(path: &Path) -> Result<Workbook, String> {
    let mut workbook: Sheets<_> = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in &sheet_names {
        let range = match workbook.worksheet_range(sheet_name) {
            Ok(range) => range,
            Err(e) => {
                log::warn!("failed to read sheet '{}': {}", sheet_name, e);
                sheets.push(RawSheet::unreadable(sheet_name.clone(), e.to_string()));
                continue;
            }
        };

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|c| !c.trim().is_empty()));

        let headers = rows.next().unwrap_or_default();
        let rows: Vec<Vec<String>> = rows.collect();

        log::debug!(
            "sheet '{}': {} columns, {} rows",
            sheet_name,
            headers.len(),
            rows.len()
        );
        sheets.push(RawSheet::new(sheet_name.clone(), headers, rows));
    }

    Ok(Workbook::new(sheets))
}

/// Cell as the text a user would type: integers without decimals, blanks empty.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Serial number; no column the engine reads holds dates
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}
