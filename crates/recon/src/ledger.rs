//! External accounting extract ("BI"): load, filter and remap onto the
//! branch-code and benefit vocabulary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::{LedgerEntry, RawSheet};
use crate::normalize::convert_to_float;
use crate::schema::Benefit;

const TABLE: &str = "ledger";

pub const COL_COST_CENTER: &str = "COD CENTRO CUSTO";
pub const COL_BRANCH: &str = "SINTETICO CC";
pub const COL_ACCOUNT: &str = "CONTA";
pub const COL_AMOUNT: &str = "VALOR";

/// Lookup tables applied while loading the ledger. The defaults are the
/// company's fixed chart; a run file may replace any of them.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerMapping {
    /// Accounts dropped on load.
    pub excluded_accounts: Vec<String>,
    /// Branch label → two-digit code. Other labels pass through.
    pub branches: BTreeMap<String, String>,
    /// Account label → benefit code. Other accounts keep their label.
    pub benefits: BTreeMap<String, String>,
}

impl Default for LedgerMapping {
    fn default() -> Self {
        let pairs = |items: &[(&str, &str)]| {
            items
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            excluded_accounts: ["SUBSIDIO EDUCACAO", "CURSOS E TREINAMENTOS", "VALE TRANSPORTE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            branches: pairs(&[
                ("CD3 - CABEDELO", "31"),
                ("CD7 - CABEDELO 2", "59"),
                ("CD1 - SANTA CECILIA", "02"),
                ("AST", "67"),
                ("CD4 - CAMPINA GRANDE", "41"),
                ("CD6 - IRECE", "58"),
            ]),
            benefits: pairs(&[
                ("VALE ALIMENTACAO - PAT", "VA"),
                ("ASSISTENCIA MEDICA", "UNIMED"),
                ("ASSISTENCIA ODONTOLOGICA", "CLIN"),
                ("SEGURO DE VIDA", "SV"),
            ]),
        }
    }
}

impl LedgerMapping {
    pub fn validate(&self) -> Result<(), ReconError> {
        for (label, code) in &self.branches {
            if code.trim().is_empty() {
                return Err(ReconError::ConfigValidation(format!(
                    "ledger branch '{label}' maps to an empty code"
                )));
            }
        }
        for (account, code) in &self.benefits {
            code.parse::<Benefit>().map_err(|_| {
                ReconError::ConfigValidation(format!(
                    "ledger account '{account}' maps to unknown benefit '{code}'"
                ))
            })?;
        }
        Ok(())
    }

    fn branch(&self, label: &str) -> String {
        self.branches
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }

    fn account(&self, label: &str) -> String {
        self.benefits
            .get(label)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

/// Read the ledger sheet. Excluded accounts are dropped, labels remapped,
/// and amounts sign-inverted.
pub fn load_ledger(sheet: &RawSheet, mapping: &LedgerMapping) -> Result<Vec<LedgerEntry>, ReconError> {
    let cc_col = sheet.require_column(TABLE, COL_COST_CENTER)?;
    let branch_col = sheet.require_column(TABLE, COL_BRANCH)?;
    let account_col = sheet.require_column(TABLE, COL_ACCOUNT)?;
    let amount_col = sheet.require_column(TABLE, COL_AMOUNT)?;

    let mut out = Vec::new();
    for r in 0..sheet.rows.len() {
        let raw_account = sheet.cell(r, account_col).trim();
        if mapping.excluded_accounts.iter().any(|a| a == raw_account) {
            continue;
        }
        let cost_center = sheet.cell(r, cc_col).trim().to_string();
        let raw_amount = sheet.cell(r, amount_col).trim();
        let amount = convert_to_float(raw_amount).ok_or_else(|| ReconError::AmountParse {
            table: TABLE.to_string(),
            key: cost_center.clone(),
            value: raw_amount.to_string(),
        })?;

        let account = mapping.account(raw_account);
        out.push(LedgerEntry {
            cost_center,
            branch: mapping.branch(sheet.cell(r, branch_col).trim()),
            benefit: account.parse::<Benefit>().ok(),
            account,
            amount: 0.0 - amount,
        });
    }

    log::info!("ledger: {} entries", out.len());
    Ok(out)
}
