use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::ReconError;
use crate::schema::{Benefit, SourceKind};

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One sheet of a workbook as a grid of strings. Row 0 of the file is the
/// header row; `rows` holds the data rows beneath it. Blank cells are `""`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Set when the reader could list the sheet but not read its cells.
    pub error: Option<String>,
}

impl RawSheet {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
            error: None,
        }
    }

    /// A sheet whose contents could not be read.
    pub fn unreadable(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: Some(message.into()),
            ..Default::default()
        }
    }

    /// Position of the header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Position of the header matching `name` after trimming, ignoring case.
    /// Missing columns are an error: the caller's table cannot be read.
    pub fn require_column(&self, table: &str, name: &str) -> Result<usize, ReconError> {
        self.headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| ReconError::MissingColumn {
                table: table.to_string(),
                column: name.to_string(),
            })
    }

    /// Cell text, `""` when the row is shorter than the header.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// A named collection of sheets, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<RawSheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<RawSheet>) -> Self {
        Self { sheets }
    }

    /// The sheet single-table files are read from.
    pub fn first_sheet(&self) -> Option<&RawSheet> {
        self.sheets.first()
    }
}

// ---------------------------------------------------------------------------
// Per-benefit storage
// ---------------------------------------------------------------------------

/// One value per benefit type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerBenefit<T> {
    pub va: T,
    pub unimed: T,
    pub clin: T,
    pub sv: T,
}

impl<T> PerBenefit<T> {
    pub fn from_fn(mut f: impl FnMut(Benefit) -> T) -> Self {
        Self {
            va: f(Benefit::Va),
            unimed: f(Benefit::Unimed),
            clin: f(Benefit::Clin),
            sv: f(Benefit::Sv),
        }
    }

    pub fn get(&self, benefit: Benefit) -> &T {
        match benefit {
            Benefit::Va => &self.va,
            Benefit::Unimed => &self.unimed,
            Benefit::Clin => &self.clin,
            Benefit::Sv => &self.sv,
        }
    }

    pub fn get_mut(&mut self, benefit: Benefit) -> &mut T {
        match benefit {
            Benefit::Va => &mut self.va,
            Benefit::Unimed => &mut self.unimed,
            Benefit::Clin => &mut self.clin,
            Benefit::Sv => &mut self.sv,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Benefit, &T)> {
        Benefit::ALL.into_iter().map(move |b| (b, self.get(b)))
    }
}

// ---------------------------------------------------------------------------
// Loaded + processed sources
// ---------------------------------------------------------------------------

/// A recognised benefit sheet reduced to its required columns, renamed to
/// their canonical names. Columns keep the sheet's left-to-right order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTable {
    pub kind: SourceKind,
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SourceTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Every expected sheet, loaded and validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadedTables {
    pub tables: BTreeMap<SourceKind, SourceTable>,
}

impl LoadedTables {
    pub fn get(&self, kind: SourceKind) -> Option<&SourceTable> {
        self.tables.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// A source table after numeric conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedSource {
    pub kind: SourceKind,
    pub columns: Vec<String>,
    /// Position of `VALOR`; `None` leaves the table unprocessed.
    pub value_index: Option<usize>,
    pub rows: Vec<ProcessedRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedRow {
    /// Original cell text for every column.
    pub cells: Vec<String>,
    /// Parsed values for `VALOR` and every deduction column to its right.
    pub numbers: Vec<Option<f64>>,
    /// `VALOR` minus the trailing deductions; `None` when any of them failed
    /// to parse or the table has no value column.
    pub final_amount: Option<f64>,
}

impl ProcessedRow {
    pub fn cell(&self, col: usize) -> &str {
        self.cells.get(col).map(String::as_str).unwrap_or("")
    }
}

impl ProcessedSource {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

// ---------------------------------------------------------------------------
// Master, budget, reconciled
// ---------------------------------------------------------------------------

/// What one benefit source says about one person.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RealizedSlot {
    pub amount: Option<f64>,
    pub branch: Option<String>,
    pub cost_center: Option<String>,
}

/// One row per person key, realized side only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterRecord {
    pub key: String,
    pub realized: PerBenefit<RealizedSlot>,
}

/// Budget row for the analysis month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetRecord {
    pub key: String,
    pub branch: String,
    pub amounts: PerBenefit<f64>,
}

/// Realized side of a reconciled row, sentinel-filled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RealizedCell {
    pub amount: f64,
    pub branch: String,
    pub cost_center: Option<String>,
}

/// Final per-person row: master ⊕ budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledRecord {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub budgeted_branch: String,
    pub budgeted: PerBenefit<f64>,
    pub realized: PerBenefit<RealizedCell>,
}

impl ReconciledRecord {
    pub fn budgeted(&self, benefit: Benefit) -> f64 {
        *self.budgeted.get(benefit)
    }

    pub fn realized(&self, benefit: Benefit) -> f64 {
        self.realized.get(benefit).amount
    }

    pub fn realized_branch(&self, benefit: Benefit) -> &str {
        &self.realized.get(benefit).branch
    }

    pub fn realized_cost_center(&self, benefit: Benefit) -> Option<&str> {
        self.realized.get(benefit).cost_center.as_deref()
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// One line of the external accounting extract after remapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub cost_center: String,
    pub branch: String,
    pub account: String,
    pub benefit: Option<Benefit>,
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub config_name: String,
    /// `YYYYMM` the budget was filtered on.
    pub period: String,
    pub alternate_life_insurance: bool,
    pub has_budget: bool,
    pub has_ledger: bool,
    pub engine_version: String,
    pub run_at: String,
}

/// Everything a successful run produces. Owned by the caller; nothing is
/// cached between runs.
#[derive(Debug, Clone, Serialize)]
pub struct ReconReport {
    pub meta: ReconMeta,
    pub records: Vec<ReconciledRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger: Option<Vec<LedgerEntry>>,
}

impl ReconReport {
    pub fn ledger(&self) -> Option<&[LedgerEntry]> {
        self.ledger.as_deref()
    }
}

/// Result of a run: either data, or the reasons there is none.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconOutcome {
    Reconciled(ReconReport),
    Diagnostic(crate::loader::LoadLog),
}

impl ReconOutcome {
    pub fn report(&self) -> Option<&ReconReport> {
        match self {
            Self::Reconciled(report) => Some(report),
            Self::Diagnostic(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&crate::loader::LoadLog> {
        match self {
            Self::Reconciled(_) => None,
            Self::Diagnostic(log) => Some(log),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_sheet_cell_pads_short_rows() {
        let sheet = RawSheet::new(
            "S",
            vec!["A".into(), "B".into()],
            vec![vec!["1".into()]],
        );
        assert_eq!(sheet.cell(0, 0), "1");
        assert_eq!(sheet.cell(0, 1), "");
        assert_eq!(sheet.cell(5, 0), "");
        assert_eq!(sheet.column_index("B"), Some(1));
    }

    #[test]
    fn require_column_ignores_case_and_padding() {
        let sheet = RawSheet::new("S", vec![" cpf ".into(), "Nome".into()], vec![]);
        assert_eq!(sheet.require_column("roster", "CPF").unwrap(), 0);
        assert_eq!(sheet.require_column("roster", "NOME").unwrap(), 1);
        let err = sheet.require_column("roster", "FILIAL").unwrap_err();
        assert_eq!(err.to_string(), "table 'roster': missing column 'FILIAL'");
    }

    #[test]
    fn per_benefit_indexing() {
        let mut p = PerBenefit::from_fn(|b| b.code().len());
        assert_eq!(*p.get(Benefit::Unimed), 6);
        *p.get_mut(Benefit::Sv) = 99;
        let collected: Vec<_> = p.iter().map(|(b, v)| (b, *v)).collect();
        assert_eq!(collected[3], (Benefit::Sv, 99));
        assert_eq!(collected.len(), 4);
    }
}
