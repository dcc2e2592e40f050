//! Budget ("recorrentes") table: load for one month and outer-join onto the
//! master table.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReconError;
use crate::model::{BudgetRecord, MasterRecord, PerBenefit, RawSheet, RealizedCell, ReconciledRecord};
use crate::normalize::{budget_person_key, convert_to_float, zero_pad, BRANCH_CODE_LEN, SENTINEL_BRANCH};
use crate::schema::Benefit;

const TABLE: &str = "budget";

pub const COL_KEY: &str = "CPF";
pub const COL_PERIOD: &str = "ANOMES";
pub const COL_BRANCH: &str = "FILIAL";

/// `YYYYMM` for the budget filter.
pub fn period(year: i32, month: &str) -> String {
    format!("{year:04}{month}")
}

/// Budget rows whose `ANOMES` equals `period`. Keys lose `.`/`-` and are
/// padded to 11, so a blank key becomes all zeros; branches are padded to 2
/// (blank stays at the sentinel).
pub fn load_budget(sheet: &RawSheet, period: &str) -> Result<Vec<BudgetRecord>, ReconError> {
    let key_col = sheet.require_column(TABLE, COL_KEY)?;
    let period_col = sheet.require_column(TABLE, COL_PERIOD)?;
    let branch_col = sheet.require_column(TABLE, COL_BRANCH)?;
    let mut amount_cols = PerBenefit::default();
    for benefit in Benefit::ALL {
        *amount_cols.get_mut(benefit) = sheet.require_column(TABLE, benefit.budget_column())?;
    }

    let mut out = Vec::new();
    let mut blank_keys = 0usize;
    for r in 0..sheet.rows.len() {
        if sheet.cell(r, period_col).trim() != period {
            continue;
        }
        let raw_key = sheet.cell(r, key_col).trim();
        if raw_key.is_empty() {
            blank_keys += 1;
        }
        let key = budget_person_key(raw_key);

        let raw_branch = sheet.cell(r, branch_col).trim();
        let branch = if raw_branch.is_empty() {
            SENTINEL_BRANCH.to_string()
        } else {
            zero_pad(raw_branch, BRANCH_CODE_LEN)
        };

        let mut amounts = PerBenefit::default();
        for benefit in Benefit::ALL {
            let raw = sheet.cell(r, *amount_cols.get(benefit)).trim();
            *amounts.get_mut(benefit) =
                convert_to_float(raw).ok_or_else(|| ReconError::AmountParse {
                    table: TABLE.to_string(),
                    key: key.clone(),
                    value: raw.to_string(),
                })?;
        }

        out.push(BudgetRecord { key, branch, amounts });
    }

    if blank_keys > 0 {
        log::warn!("budget: {blank_keys} rows for {period} without CPF, keyed as zeros");
    }
    log::info!("budget: {} rows for {period}", out.len());
    Ok(out)
}

/// Outer join on key, sorted by key. Every budget row for a key yields its
/// own record; keys on only one side get sentinel branches and zero amounts
/// on the other.
pub fn join_budget(master: Vec<MasterRecord>, budget: &[BudgetRecord]) -> Vec<ReconciledRecord> {
    let mut by_key: BTreeMap<&str, Vec<&BudgetRecord>> = BTreeMap::new();
    for row in budget {
        by_key.entry(row.key.as_str()).or_default().push(row);
    }

    let mut out = Vec::with_capacity(master.len().max(budget.len()));
    let mut matched: BTreeSet<&str> = BTreeSet::new();

    for record in &master {
        match by_key.get(record.key.as_str()) {
            Some(rows) => {
                matched.insert(record.key.as_str());
                for row in rows {
                    out.push(reconciled(&record.key, Some(record), Some(row)));
                }
            }
            None => out.push(reconciled(&record.key, Some(record), None)),
        }
    }

    for (key, rows) in &by_key {
        if matched.contains(key) {
            continue;
        }
        for row in rows {
            out.push(reconciled(key, None, Some(row)));
        }
    }

    out.sort_by(|a, b| a.key.cmp(&b.key));
    out
}

fn reconciled(key: &str, master: Option<&MasterRecord>, budget: Option<&BudgetRecord>) -> ReconciledRecord {
    ReconciledRecord {
        key: key.to_string(),
        name: None,
        budgeted_branch: budget
            .map(|b| b.branch.clone())
            .unwrap_or_else(|| SENTINEL_BRANCH.to_string()),
        budgeted: PerBenefit::from_fn(|b| budget.map(|row| *row.amounts.get(b)).unwrap_or(0.0)),
        realized: PerBenefit::from_fn(|b| {
            let slot = master.map(|m| m.realized.get(b));
            RealizedCell {
                amount: slot.and_then(|s| s.amount).unwrap_or(0.0),
                branch: slot
                    .and_then(|s| s.branch.clone())
                    .unwrap_or_else(|| SENTINEL_BRANCH.to_string()),
                cost_center: slot.and_then(|s| s.cost_center.clone()),
            }
        }),
    }
}
