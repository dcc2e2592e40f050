// CSV/TSV import

use std::path::Path;

use encoding_rs::{Encoding, WINDOWS_1252};
use rateio_recon::RawSheet;

pub fn import(path: &Path) -> Result<RawSheet, String> {
    let content = read_text(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter, &sheet_name(path))
}

pub fn import_tsv(path: &Path) -> Result<RawSheet, String> {
    let content = read_text(path)?;
    import_from_string(&content, b'\t', &sheet_name(path))
}

fn sheet_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Separators payroll and ledger exports are seen with, in tie-break order.
const DELIMITERS: [u8; 4] = [b';', b'\t', b',', b'|'];
const SNIFF_LINES: usize = 10;

/// Field separator of an export: the candidate that splits the header into
/// several fields and agrees with the most data lines. Comma when none does.
fn sniff_delimiter(content: &str) -> u8 {
    let sample: Vec<&str> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .take(SNIFF_LINES)
        .collect();

    // Reversed: on equal scores the earlier candidate wins.
    DELIMITERS
        .iter()
        .rev()
        .filter_map(|&delimiter| {
            let widths: Vec<usize> = sample.iter().map(|l| field_count(l, delimiter)).collect();
            let header = *widths.first()?;
            if header <= 1 {
                return None;
            }
            let agreeing = widths.iter().filter(|&&w| w == header).count();
            Some((agreeing * header, delimiter))
        })
        .max_by_key(|&(score, _)| score)
        .map(|(_, delimiter)| delimiter)
        .unwrap_or(b',')
}

fn field_count(line: &str, delimiter: u8) -> usize {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes())
        .records()
        .next()
        .and_then(Result::ok)
        .map_or(1, |r| r.len())
}

/// Decode an export. A byte-order mark decides the encoding; otherwise text
/// that is not UTF-8 is read as Windows-1252, the code page Excel uses for
/// Portuguese.
fn read_text(path: &Path) -> Result<String, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    if let Some((encoding, bom_len)) = Encoding::for_bom(&bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return Ok(text.into_owned());
    }
    match std::str::from_utf8(&bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => {
            log::debug!("{} is not UTF-8, decoding as Windows-1252", path.display());
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
            Ok(text.into_owned())
        }
    }
}

/// First record is the header; fully blank records are dropped.
fn import_from_string(content: &str, delimiter: u8, name: &str) -> Result<RawSheet, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| format!("Failed to parse '{}': {}", name, e))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    let mut records = records.into_iter();
    let headers = records
        .next()
        .ok_or_else(|| format!("'{}' has no header row", name))?;
    let rows: Vec<Vec<String>> = records.collect();

    log::debug!("csv '{}': {} columns, {} rows", name, headers.len(), rows.len());
    Ok(RawSheet::new(name, headers, rows))
}
