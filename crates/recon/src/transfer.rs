//! Movement between branches: the budgeted × realized matrix, the people
//! behind one of its cells, and per-branch categorisation.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::ReconciledRecord;
use crate::normalize::{round_cents, SENTINEL_BRANCH};
use crate::schema::Benefit;

pub const BUDGETED_TOTAL_LABEL: &str = "Total Orçado";
pub const REALIZED_TOTAL_LABEL: &str = "Total Realizado";

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Realized amount pivoted by budgeted branch (rows) and realized branch
/// (columns). The sentinel row means "not budgeted", the sentinel column
/// "not realized".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferMatrix {
    pub benefit: Benefit,
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    pub cells: Vec<Vec<f64>>,
    /// Row sums, shown as the [`BUDGETED_TOTAL_LABEL`] column.
    pub row_totals: Vec<f64>,
    /// Column sums, shown as the [`REALIZED_TOTAL_LABEL`] row.
    pub column_totals: Vec<f64>,
    pub grand_total: f64,
}

impl TransferMatrix {
    pub fn cell(&self, row: &str, column: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.cells[r][c])
    }

    pub fn row_total(&self, row: &str) -> Option<f64> {
        let r = self.rows.iter().position(|x| x == row)?;
        Some(self.row_totals[r])
    }

    pub fn column_total(&self, column: &str) -> Option<f64> {
        let c = self.columns.iter().position(|x| x == column)?;
        Some(self.column_totals[c])
    }
}

pub fn transfer_matrix(records: &[ReconciledRecord], benefit: Benefit) -> TransferMatrix {
    let mut sums: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    let mut rows: BTreeSet<&str> = BTreeSet::new();
    let mut columns: BTreeSet<&str> = BTreeSet::new();

    for r in records {
        let from = r.budgeted_branch.as_str();
        let to = r.realized_branch(benefit);
        rows.insert(from);
        columns.insert(to);
        *sums.entry((from, to)).or_insert(0.0) += r.realized(benefit);
    }

    let cells: Vec<Vec<f64>> = rows
        .iter()
        .map(|from| {
            columns
                .iter()
                .map(|to| round_cents(sums.get(&(*from, *to)).copied().unwrap_or(0.0)))
                .collect()
        })
        .collect();

    let row_totals: Vec<f64> = cells
        .iter()
        .map(|row| round_cents(row.iter().sum()))
        .collect();
    let column_totals: Vec<f64> = (0..columns.len())
        .map(|c| round_cents(cells.iter().map(|row| row[c]).sum()))
        .collect();
    let grand_total = round_cents(row_totals.iter().sum());

    TransferMatrix {
        benefit,
        rows: rows.into_iter().map(String::from).collect(),
        columns: columns.into_iter().map(String::from).collect(),
        cells,
        row_totals,
        column_totals,
        grand_total,
    }
}

// ---------------------------------------------------------------------------
// Detail
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferDetailRow {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub budgeted: f64,
    pub realized: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferDetail {
    pub benefit: Benefit,
    pub from: String,
    pub to: String,
    pub rows: Vec<TransferDetailRow>,
    pub total_budgeted: f64,
    pub total_realized: f64,
}

/// People budgeted in `from` and realized in `to`. The same branch on both
/// sides is not a transfer and yields nothing.
pub fn transfer_detail(records: &[ReconciledRecord], benefit: Benefit, from: &str, to: &str) -> TransferDetail {
    let rows: Vec<TransferDetailRow> = if from == to {
        Vec::new()
    } else {
        records
            .iter()
            .filter(|r| r.budgeted_branch == from && r.realized_branch(benefit) == to)
            .map(|r| TransferDetailRow {
                key: r.key.clone(),
                name: r.name.clone(),
                budgeted: r.budgeted(benefit),
                realized: r.realized(benefit),
            })
            .collect()
    };

    TransferDetail {
        benefit,
        from: from.to_string(),
        to: to.to_string(),
        total_budgeted: round_cents(rows.iter().map(|r| r.budgeted).sum()),
        total_realized: round_cents(rows.iter().map(|r| r.realized).sum()),
        rows,
    }
}

// ---------------------------------------------------------------------------
// Categorisation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Budgeted here, realized nowhere.
    Terminated,
    /// Not budgeted, realized here.
    NewHire,
    /// Budgeted elsewhere, realized here. Budget shown as 0.
    TransferIn,
    /// Budgeted here, realized elsewhere. Realized shown as 0.
    TransferOut,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorizedRecord {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub category: Category,
    pub budgeted_branch: String,
    pub realized_branch: String,
    pub budgeted: f64,
    pub realized: f64,
    /// Set on transfers: where the budget was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budgeted_in: Option<String>,
    /// Set on transfers: where the money went.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transferred_to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchCategories {
    pub branch: String,
    pub benefit: Benefit,
    pub terminated: Vec<CategorizedRecord>,
    pub new_hires: Vec<CategorizedRecord>,
    /// Inbound first, then outbound.
    pub transfers: Vec<CategorizedRecord>,
}

/// The category `record` falls in for `branch`, if any. At most one.
pub fn category_of(record: &ReconciledRecord, branch: &str, benefit: Benefit) -> Option<Category> {
    let budgeted_in = record.budgeted_branch.as_str();
    let realized_in = record.realized_branch(benefit);
    let budgeted = record.budgeted(benefit);
    let realized = record.realized(benefit);

    if budgeted_in == branch && realized_in == SENTINEL_BRANCH && budgeted > 0.0 {
        Some(Category::Terminated)
    } else if budgeted_in == SENTINEL_BRANCH && realized_in == branch && realized > 0.0 {
        Some(Category::NewHire)
    } else if budgeted_in != branch && budgeted_in != SENTINEL_BRANCH && realized_in == branch && realized > 0.0 {
        Some(Category::TransferIn)
    } else if budgeted_in == branch && realized_in != branch && realized_in != SENTINEL_BRANCH && budgeted > 0.0 {
        Some(Category::TransferOut)
    } else {
        None
    }
}

pub fn categorize(records: &[ReconciledRecord], branch: &str, benefit: Benefit) -> BranchCategories {
    let mut out = BranchCategories {
        branch: branch.to_string(),
        benefit,
        terminated: Vec::new(),
        new_hires: Vec::new(),
        transfers: Vec::new(),
    };
    let mut outbound = Vec::new();

    for r in records {
        let Some(category) = category_of(r, branch, benefit) else {
            continue;
        };
        let realized_in = r.realized_branch(benefit);
        let mut row = CategorizedRecord {
            key: r.key.clone(),
            name: r.name.clone(),
            category,
            budgeted_branch: r.budgeted_branch.clone(),
            realized_branch: realized_in.to_string(),
            budgeted: r.budgeted(benefit),
            realized: r.realized(benefit),
            budgeted_in: None,
            transferred_to: None,
        };
        match category {
            Category::Terminated => out.terminated.push(row),
            Category::NewHire => out.new_hires.push(row),
            Category::TransferIn => {
                row.budgeted = 0.0;
                row.budgeted_in = Some(r.budgeted_branch.clone());
                row.transferred_to = Some(branch.to_string());
                out.transfers.push(row);
            }
            Category::TransferOut => {
                row.realized = 0.0;
                row.budgeted_in = Some(branch.to_string());
                row.transferred_to = Some(realized_in.to_string());
                outbound.push(row);
            }
        }
    }

    out.transfers.extend(outbound);
    out
}

/// [`categorize`] for every benefit.
pub fn categorize_branch(records: &[ReconciledRecord], branch: &str) -> Vec<BranchCategories> {
    Benefit::ALL
        .into_iter()
        .map(|b| categorize(records, branch, b))
        .collect()
}

/// Branches offered for categorisation: budgeted branches, sentinel excluded.
pub fn budgeted_branches(records: &[ReconciledRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.budgeted_branch.as_str())
        .filter(|b| *b != SENTINEL_BRANCH)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PerBenefit, RealizedCell};

    fn record(key: &str, budgeted_branch: &str, budgeted_va: f64, realized_branch: &str, realized_va: f64) -> ReconciledRecord {
        let mut realized: PerBenefit<RealizedCell> = PerBenefit::from_fn(|_| RealizedCell {
            amount: 0.0,
            branch: SENTINEL_BRANCH.into(),
            cost_center: None,
        });
        realized.va = RealizedCell {
            amount: realized_va,
            branch: realized_branch.into(),
            cost_center: None,
        };
        let mut budgeted: PerBenefit<f64> = PerBenefit::default();
        budgeted.va = budgeted_va;
        ReconciledRecord {
            key: key.into(),
            name: None,
            budgeted_branch: budgeted_branch.into(),
            budgeted,
            realized,
        }
    }

    fn sample() -> Vec<ReconciledRecord> {
        vec![
            record("a", "02", 100.0, "02", 110.0),
            record("b", "02", 100.0, "00", 0.0),
            record("c", "00", 0.0, "02", 70.0),
            record("d", "31", 50.0, "02", 45.0),
            record("e", "02", 80.0, "31", 75.0),
            record("f", "31", 60.0, "31", 60.0),
        ]
    }

    #[test]
    fn matrix_margins_are_sums() {
        let m = transfer_matrix(&sample(), Benefit::Va);
        assert_eq!(m.rows, vec!["00", "02", "31"]);
        assert_eq!(m.columns, vec!["00", "02", "31"]);
        assert_eq!(m.cell("02", "02"), Some(110.0));
        assert_eq!(m.cell("02", "31"), Some(75.0));
        assert_eq!(m.cell("00", "02"), Some(70.0));
        assert_eq!(m.cell("31", "00"), Some(0.0));

        for (r, row) in m.cells.iter().enumerate() {
            assert_eq!(m.row_totals[r], row.iter().sum::<f64>());
        }
        for c in 0..m.columns.len() {
            assert_eq!(m.column_totals[c], m.cells.iter().map(|row| row[c]).sum::<f64>());
        }
        assert_eq!(m.row_total("02"), Some(185.0));
        assert_eq!(m.column_total("02"), Some(225.0));
        assert_eq!(m.grand_total, 360.0);
        assert_eq!(m.column_totals.iter().sum::<f64>(), m.grand_total);
    }

    #[test]
    fn detail_lists_pair_and_totals() {
        let d = transfer_detail(&sample(), Benefit::Va, "31", "02");
        assert_eq!(d.rows.len(), 1);
        assert_eq!(d.rows[0].key, "d");
        assert_eq!(d.total_budgeted, 50.0);
        assert_eq!(d.total_realized, 45.0);

        assert!(transfer_detail(&sample(), Benefit::Va, "02", "02").rows.is_empty());
    }

    #[test]
    fn categories_for_branch() {
        let c = categorize(&sample(), "02", Benefit::Va);
        let keys = |v: &[CategorizedRecord]| v.iter().map(|r| r.key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&c.terminated), vec!["b"]);
        assert_eq!(keys(&c.new_hires), vec!["c"]);
        assert_eq!(keys(&c.transfers), vec!["d", "e"]);

        let inbound = &c.transfers[0];
        assert_eq!(inbound.category, Category::TransferIn);
        assert_eq!(inbound.budgeted, 0.0);
        assert_eq!(inbound.realized, 45.0);
        assert_eq!(inbound.budgeted_in.as_deref(), Some("31"));
        assert_eq!(inbound.transferred_to.as_deref(), Some("02"));

        let outbound = &c.transfers[1];
        assert_eq!(outbound.category, Category::TransferOut);
        assert_eq!(outbound.budgeted, 80.0);
        assert_eq!(outbound.realized, 0.0);
        assert_eq!(outbound.budgeted_in.as_deref(), Some("02"));
        assert_eq!(outbound.transferred_to.as_deref(), Some("31"));
    }

    #[test]
    fn categories_are_disjoint() {
        let records = sample();
        for branch in ["02", "31"] {
            let c = categorize(&records, branch, Benefit::Va);
            let mut seen = BTreeSet::new();
            for r in c.terminated.iter().chain(&c.new_hires).chain(&c.transfers) {
                assert!(seen.insert(r.key.clone()), "{} twice in {branch}", r.key);
            }
        }
    }

    #[test]
    fn zero_amounts_do_not_categorise() {
        let records = vec![record("z", "02", 0.0, "00", 0.0), record("y", "00", 0.0, "02", 0.0)];
        let c = categorize(&records, "02", Benefit::Va);
        assert!(c.terminated.is_empty());
        assert!(c.new_hires.is_empty());
    }

    #[test]
    fn selector_skips_sentinel() {
        assert_eq!(budgeted_branches(&sample()), vec!["02", "31"]);
        assert_eq!(categorize_branch(&sample(), "02").len(), 4);
    }
}
