//! Recognise benefit sheets in a workbook and validate their columns.
//!
//! Loading is all-or-nothing: either every expected sheet is found and
//! validated, or the caller gets only the [`LoadLog`] explaining why not.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{LoadedTables, RawSheet, SourceTable, Workbook};
use crate::normalize::match_token;
use crate::schema::SourceKind;

// ---------------------------------------------------------------------------
// Log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SheetStatus {
    Loaded { rows: usize, columns: Vec<String> },
    NotRecognized { expected: Vec<SourceKind> },
    MissingColumns { columns: Vec<String> },
    /// A second sheet mapped to a type that was already claimed.
    Duplicate,
    LoadError { message: String },
}

impl SheetStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }

    /// One-line reason shown next to a sheet that was not loaded.
    pub fn reason(&self) -> Option<String> {
        match self {
            Self::Loaded { .. } => None,
            Self::NotRecognized { expected } => Some(format!(
                "name not recognised; expected one of: {}",
                join_kinds(expected)
            )),
            Self::MissingColumns { columns } => {
                Some(format!("missing required columns: {}", columns.join(", ")))
            }
            Self::Duplicate => Some("another sheet already provides this type".into()),
            Self::LoadError { message } => Some(format!("failed to process: {message}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetLog {
    pub sheet_name: String,
    pub standardized_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<SourceKind>,
    #[serde(flatten)]
    pub status: SheetStatus,
}

/// Per-sheet diagnostics plus the run-level summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadLog {
    pub expected: Vec<SourceKind>,
    pub sheets: Vec<SheetLog>,
    /// Expected types that no sheet matched.
    pub missing: Vec<SourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_error: Option<String>,
}

impl LoadLog {
    /// A log for a workbook that could not be opened at all.
    pub fn from_general_error(expected: Vec<SourceKind>, message: impl Into<String>) -> Self {
        Self {
            expected,
            general_error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Run-level summary line, when any expected type is missing.
    pub fn summary(&self) -> Option<String> {
        if self.missing.is_empty() {
            None
        } else {
            Some(format!("expected sheets not found: {}", join_kinds(&self.missing)))
        }
    }

    /// Whether the log describes a fully successful load.
    pub fn is_clean(&self) -> bool {
        self.general_error.is_none()
            && self.missing.is_empty()
            && self.sheets.iter().all(|s| {
                s.status.is_loaded() || matches!(s.status, SheetStatus::NotRecognized { .. })
            })
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetLog> {
        self.sheets.iter().find(|s| s.sheet_name == name)
    }
}

fn join_kinds(kinds: &[SourceKind]) -> String {
    kinds
        .iter()
        .map(|k| k.sheet_name())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(LoadedTables),
    Diagnostic(LoadLog),
}

/// Match every sheet of `workbook` against the expected types and validate
/// the recognised ones.
pub fn load_workbook(workbook: &Workbook, alternate_life_insurance: bool) -> LoadOutcome {
    let expected = SourceKind::expected(alternate_life_insurance);
    let mut log = LoadLog {
        expected: expected.clone(),
        ..Default::default()
    };
    let mut tables: BTreeMap<SourceKind, SourceTable> = BTreeMap::new();
    let mut seen: Vec<SourceKind> = Vec::new();

    for sheet in &workbook.sheets {
        let standardized_name = match_token(&sheet.name);
        let kind = recognise(&standardized_name, &expected);

        let status = match kind {
            Some(kind) if sheet.error.is_some() => {
                let message = sheet.error.clone().unwrap_or_default();
                log::warn!("sheet '{}' ({kind}) could not be read: {message}", sheet.name);
                if !seen.contains(&kind) {
                    seen.push(kind);
                }
                SheetStatus::LoadError { message }
            }
            None => {
                log::debug!("sheet '{}' not recognised", sheet.name);
                SheetStatus::NotRecognized {
                    expected: expected.clone(),
                }
            }
            Some(kind) if seen.contains(&kind) => {
                log::warn!("sheet '{}' duplicates type {kind}", sheet.name);
                tables.remove(&kind);
                SheetStatus::Duplicate
            }
            Some(kind) => {
                seen.push(kind);
                match bind_columns(sheet, kind) {
                    Ok(table) => {
                        log::debug!(
                            "sheet '{}' loaded as {kind}: {} rows",
                            sheet.name,
                            table.rows.len()
                        );
                        let status = SheetStatus::Loaded {
                            rows: table.rows.len(),
                            columns: table.columns.clone(),
                        };
                        tables.insert(kind, table);
                        status
                    }
                    Err(missing) => {
                        log::debug!("sheet '{}' missing columns {:?}", sheet.name, missing);
                        SheetStatus::MissingColumns { columns: missing }
                    }
                }
            }
        };

        log.sheets.push(SheetLog {
            sheet_name: sheet.name.clone(),
            standardized_name,
            kind,
            status,
        });
    }

    log.missing = expected
        .iter()
        .copied()
        .filter(|k| !seen.contains(k))
        .collect();

    if log.is_clean() && tables.len() == expected.len() {
        log::info!("loaded {} benefit sheets", tables.len());
        LoadOutcome::Loaded(LoadedTables { tables })
    } else {
        if let Some(summary) = log.summary() {
            log::warn!("{summary}");
        }
        LoadOutcome::Diagnostic(log)
    }
}

/// Exact comparison of normalised names.
fn recognise(standardized_name: &str, expected: &[SourceKind]) -> Option<SourceKind> {
    expected
        .iter()
        .copied()
        .find(|k| match_token(k.sheet_name()) == standardized_name)
}

/// For each required column in declared order, bind the first sheet column
/// whose normalised header contains the normalised token. When two required
/// columns bind the same sheet column the later name wins. Output columns
/// keep the sheet's order.
fn bind_columns(sheet: &RawSheet, kind: SourceKind) -> Result<SourceTable, Vec<String>> {
    let header_tokens: Vec<String> = sheet.headers.iter().map(|h| match_token(h)).collect();

    let mut binding: BTreeMap<usize, &'static str> = BTreeMap::new();
    let mut missing = Vec::new();
    for required in kind.required_columns() {
        let token = match_token(required);
        match header_tokens.iter().position(|h| h.contains(&token)) {
            Some(idx) => {
                binding.insert(idx, required);
            }
            None => missing.push(required.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(missing);
    }

    let columns = binding.values().map(|c| c.to_string()).collect();
    let rows = (0..sheet.rows.len())
        .map(|r| {
            binding
                .keys()
                .map(|&c| sheet.cell(r, c).to_string())
                .collect()
        })
        .collect();

    Ok(SourceTable {
        kind,
        sheet_name: sheet.name.clone(),
        columns,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(name: &str, headers: &[&str], rows: &[&[&str]]) -> RawSheet {
        RawSheet::new(
            name,
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn full_workbook() -> Vec<RawSheet> {
        vec![
            sheet(
                "Unimed",
                &["CPF Titular", "CPF Beneficiário", "CC Formatado", "Filial", "Valor", "Desc 406"],
                &[&["111", "11111111111", "CC1", "31 - X", "100", "10"]],
            ),
            sheet(
                "CLIN",
                &["CPFTITULAR", "CCFORMATADO", "FILIAL", "CPFBENEFICIARIO", "VALOR", "442"],
                &[&["1", "CC", "02", "22222222222", "50", "0"]],
            ),
            sheet(
                "va",
                &["CPFTITULAR", "FILIAL", "CCFORMATADO", "VALOR", "424"],
                &[&["33333333333", "02", "CC", "300", "30"], &["44444444444", "31", "CC", "300", ""]],
            ),
            sheet(
                "S.V.",
                &["CCFORMATADO", "CPFTITULAR", "FILIAL", "VALOR"],
                &[],
            ),
        ]
    }

    #[test]
    fn all_sheets_present_loads_every_type() {
        let wb = Workbook::new(full_workbook());
        let LoadOutcome::Loaded(tables) = load_workbook(&wb, false) else {
            panic!("expected tables");
        };
        assert_eq!(tables.len(), 4);
        assert_eq!(tables.get(SourceKind::Va).unwrap().rows.len(), 2);
        assert_eq!(tables.get(SourceKind::Sv).unwrap().rows.len(), 0);
        let unimed = tables.get(SourceKind::Unimed).unwrap();
        assert_eq!(
            unimed.columns,
            vec!["CPFTITULAR", "CPFBENEFICIARIO", "CCFORMATADO", "FILIAL", "VALOR", "406"]
        );
    }

    #[test]
    fn loaded_columns_keep_sheet_order() {
        let mut sheets = full_workbook();
        sheets[3] = sheet("SV", &["VALOR", "FILIAL", "X", "CPFTITULAR", "CCFORMATADO"], &[&["1", "2", "3", "4", "5"]]);
        let LoadOutcome::Loaded(tables) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected tables");
        };
        let sv = tables.get(SourceKind::Sv).unwrap();
        assert_eq!(sv.columns, vec!["VALOR", "FILIAL", "CPFTITULAR", "CCFORMATADO"]);
        assert_eq!(sv.rows[0], vec!["1", "2", "4", "5"]);
    }

    #[test]
    fn missing_column_discards_everything() {
        let mut sheets = full_workbook();
        sheets[2] = sheet("VA", &["CPFTITULAR", "FILIAL", "VALOR", "424"], &[]);
        let LoadOutcome::Diagnostic(log) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected diagnostic");
        };
        let va = log.sheet("VA").unwrap();
        assert_eq!(
            va.status,
            SheetStatus::MissingColumns {
                columns: vec!["CCFORMATADO".into()]
            }
        );
        assert!(log.missing.is_empty());
        assert!(log.summary().is_none());
        assert!(log.sheet("Unimed").unwrap().status.is_loaded());
    }

    #[test]
    fn missing_sheet_is_summarised() {
        let mut sheets = full_workbook();
        sheets.remove(1);
        let LoadOutcome::Diagnostic(log) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected diagnostic");
        };
        assert_eq!(log.missing, vec![SourceKind::Clin]);
        assert_eq!(log.summary().unwrap(), "expected sheets not found: CLIN");
    }

    #[test]
    fn alternate_mode_expects_second_life_sheet() {
        let LoadOutcome::Diagnostic(log) = load_workbook(&Workbook::new(full_workbook()), true) else {
            panic!("expected diagnostic");
        };
        assert_eq!(log.missing, vec![SourceKind::Sv2]);

        let mut sheets = full_workbook();
        sheets.push(sheet("SV 2", &["CPFTITULAR", "CCFORMATADO", "VALOR", "FILIAL"], &[]));
        assert!(matches!(load_workbook(&Workbook::new(sheets), true), LoadOutcome::Loaded(t) if t.len() == 5));
    }

    #[test]
    fn second_life_sheet_unrecognised_without_mode() {
        let mut sheets = full_workbook();
        sheets.push(sheet("SV2", &["CPFTITULAR"], &[]));
        let LoadOutcome::Loaded(tables) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("unrecognised sheets are ignored");
        };
        assert!(tables.get(SourceKind::Sv2).is_none());
    }

    #[test]
    fn duplicate_type_is_diagnostic() {
        let mut sheets = full_workbook();
        sheets.push(sheet("V A", &["CPFTITULAR", "FILIAL", "CCFORMATADO", "VALOR", "424"], &[]));
        let LoadOutcome::Diagnostic(log) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected diagnostic");
        };
        assert_eq!(log.sheet("V A").unwrap().status, SheetStatus::Duplicate);
    }

    #[test]
    fn first_match_binds_leftmost_containing_column() {
        // "VALOR" is contained in "VALORBRUTO", which comes first.
        let mut sheets = full_workbook();
        sheets[3] = sheet(
            "SV",
            &["CCFORMATADO", "CPFTITULAR", "FILIAL", "Valor Bruto", "Valor"],
            &[&["CC", "1", "02", "90", "80"]],
        );
        let LoadOutcome::Loaded(tables) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected tables");
        };
        let sv = tables.get(SourceKind::Sv).unwrap();
        assert_eq!(sv.columns, vec!["CCFORMATADO", "CPFTITULAR", "FILIAL", "VALOR"]);
        assert_eq!(sv.rows[0][3], "90");
    }

    #[test]
    fn unreadable_sheet_is_load_error() {
        let mut sheets = full_workbook();
        sheets[1] = RawSheet::unreadable("CLIN", "bad shared strings");
        let LoadOutcome::Diagnostic(log) = load_workbook(&Workbook::new(sheets), false) else {
            panic!("expected diagnostic");
        };
        let clin = log.sheet("CLIN").unwrap();
        assert_eq!(clin.kind, Some(SourceKind::Clin));
        assert_eq!(
            clin.status,
            SheetStatus::LoadError {
                message: "bad shared strings".into()
            }
        );
        assert_eq!(
            clin.status.reason().unwrap(),
            "failed to process: bad shared strings"
        );
        assert!(log.missing.is_empty());
        assert!(log.sheet("Unimed").unwrap().status.is_loaded());
        assert!(log.sheet("va").unwrap().status.is_loaded());
    }

    #[test]
    fn unreadable_unrecognised_sheet_is_ignored() {
        let mut sheets = full_workbook();
        sheets.push(RawSheet::unreadable("Resumo", "bad zip entry"));
        assert!(matches!(
            load_workbook(&Workbook::new(sheets), false),
            LoadOutcome::Loaded(_)
        ));
    }

    #[test]
    fn general_error_log() {
        let log = LoadLog::from_general_error(SourceKind::expected(false), "corrupt file");
        assert!(!log.is_clean());
        assert_eq!(log.general_error.as_deref(), Some("corrupt file"));
    }
}
