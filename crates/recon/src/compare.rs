//! Budgeted vs realized vs ledger views over the reconciled table.
//!
//! Everything here is a pure function of already-validated records.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::model::{LedgerEntry, ReconciledRecord};
use crate::normalize::{round_cents, SENTINEL_BRANCH};
use crate::schema::Benefit;

pub const GRAND_TOTAL_LABEL: &str = "Total Geral";

/// `difference / budgeted × 100`, or 0 with no budget.
pub fn difference_pct(difference: f64, budgeted: f64) -> f64 {
    if budgeted == 0.0 {
        0.0
    } else {
        difference / budgeted * 100.0
    }
}

/// `realized / budgeted × 100`, or 0 with no budget.
pub fn realization_pct(realized: f64, budgeted: f64) -> f64 {
    if budgeted == 0.0 {
        0.0
    } else {
        realized / budgeted * 100.0
    }
}

// ---------------------------------------------------------------------------
// Per-benefit totals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenefitTotal {
    pub label: String,
    /// `None` on the grand-total row.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit: Option<Benefit>,
    pub budgeted: f64,
    pub realized: f64,
    pub difference: f64,
    /// [`difference_pct`].
    pub variation_pct: f64,
}

impl BenefitTotal {
    fn new(label: &str, benefit: Option<Benefit>, budgeted: f64, realized: f64) -> Self {
        let budgeted = round_cents(budgeted);
        let realized = round_cents(realized);
        let difference = round_cents(realized - budgeted);
        Self {
            label: label.to_string(),
            benefit,
            budgeted,
            realized,
            difference,
            variation_pct: difference_pct(difference, budgeted),
        }
    }
}

/// One row per benefit followed by [`GRAND_TOTAL_LABEL`].
pub fn benefit_totals(records: &[ReconciledRecord]) -> Vec<BenefitTotal> {
    let mut rows = Vec::with_capacity(Benefit::ALL.len() + 1);
    let (mut all_budgeted, mut all_realized) = (0.0, 0.0);

    for benefit in Benefit::ALL {
        let budgeted: f64 = records.iter().map(|r| r.budgeted(benefit)).sum();
        let realized: f64 = records.iter().map(|r| r.realized(benefit)).sum();
        all_budgeted += budgeted;
        all_realized += realized;
        rows.push(BenefitTotal::new(benefit.label(), Some(benefit), budgeted, realized));
    }

    rows.push(BenefitTotal::new(GRAND_TOTAL_LABEL, None, all_budgeted, all_realized));
    rows
}

// ---------------------------------------------------------------------------
// Per-branch comparative
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BranchComparison {
    pub branch: String,
    pub budgeted: f64,
    /// Records budgeted in the branch with a positive amount.
    pub budgeted_count: usize,
    pub realized: f64,
    /// Records realized in the branch with a positive amount.
    pub realized_count: usize,
    pub difference: f64,
    /// [`realization_pct`].
    pub variation_pct: f64,
}

/// Compare one benefit branch by branch. With a ledger the realized sum
/// comes from it; counts always come from the records.
pub fn branch_comparison(
    records: &[ReconciledRecord],
    benefit: Benefit,
    ledger: Option<&[LedgerEntry]>,
) -> Vec<BranchComparison> {
    let ledger_rows: Vec<&LedgerEntry> = ledger
        .unwrap_or(&[])
        .iter()
        .filter(|e| e.benefit == Some(benefit))
        .collect();

    let mut branches: BTreeSet<&str> = BTreeSet::new();
    for r in records {
        branches.insert(r.budgeted_branch.as_str());
        branches.insert(r.realized_branch(benefit));
    }
    branches.extend(ledger_rows.iter().map(|e| e.branch.as_str()));

    branches
        .into_iter()
        .map(|branch| {
            let budgeted_rows = records.iter().filter(|r| r.budgeted_branch == branch);
            let budgeted = round_cents(budgeted_rows.clone().map(|r| r.budgeted(benefit)).sum());
            let budgeted_count = budgeted_rows.filter(|r| r.budgeted(benefit) > 0.0).count();

            let realized_rows = records.iter().filter(|r| r.realized_branch(benefit) == branch);
            let realized_count = realized_rows.clone().filter(|r| r.realized(benefit) > 0.0).count();
            let realized = round_cents(match ledger {
                Some(_) => ledger_rows
                    .iter()
                    .filter(|e| e.branch == branch)
                    .map(|e| e.amount)
                    .sum(),
                None => realized_rows.map(|r| r.realized(benefit)).sum(),
            });

            BranchComparison {
                branch: branch.to_string(),
                budgeted,
                budgeted_count,
                realized,
                realized_count,
                difference: round_cents(realized - budgeted),
                variation_pct: realization_pct(realized, budgeted),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Ledger vs realized
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerComparisonRow {
    /// Branch code or cost center, depending on the view.
    pub label: String,
    pub ledger: f64,
    pub realized: f64,
    /// `ledger − realized`.
    pub difference: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerComparison {
    pub benefit: Benefit,
    pub by_branch: Vec<LedgerComparisonRow>,
    pub by_cost_center: Vec<LedgerComparisonRow>,
}

/// Ledger sums against realized sums for one benefit, by branch and by
/// cost center. Labels present on only one side get 0 on the other.
///
/// Records with no realized branch and nothing realized are left out of the
/// branch view, so the sentinel only shows when it carries money.
pub fn compare_ledger(records: &[ReconciledRecord], ledger: &[LedgerEntry], benefit: Benefit) -> LedgerComparison {
    let entries: Vec<&LedgerEntry> = ledger.iter().filter(|e| e.benefit == Some(benefit)).collect();

    let ledger_by_branch = sum_by(entries.iter().map(|e| (e.branch.as_str(), e.amount)));
    let realized_by_branch = sum_by(
        records
            .iter()
            .filter(|r| r.realized_branch(benefit) != SENTINEL_BRANCH || r.realized(benefit) != 0.0)
            .map(|r| (r.realized_branch(benefit), r.realized(benefit))),
    );

    let ledger_by_cc = sum_by(entries.iter().map(|e| (e.cost_center.as_str(), e.amount)));
    let realized_by_cc = sum_by(
        records
            .iter()
            .filter_map(|r| Some((r.realized_cost_center(benefit)?, r.realized(benefit)))),
    );

    LedgerComparison {
        benefit,
        by_branch: outer_join(ledger_by_branch, realized_by_branch),
        by_cost_center: outer_join(ledger_by_cc, realized_by_cc),
    }
}

/// [`compare_ledger`] for every benefit.
pub fn compare_ledger_all(records: &[ReconciledRecord], ledger: &[LedgerEntry]) -> Vec<LedgerComparison> {
    Benefit::ALL
        .into_iter()
        .map(|b| compare_ledger(records, ledger, b))
        .collect()
}

/// Cost-center rows of `comparison` restricted to cost centers the ledger
/// lists under `branch` or that records realized in `branch` carry.
pub fn cost_center_drilldown(
    comparison: &LedgerComparison,
    records: &[ReconciledRecord],
    ledger: &[LedgerEntry],
    branch: &str,
) -> Vec<LedgerComparisonRow> {
    let benefit = comparison.benefit;
    let mut wanted: BTreeSet<&str> = ledger
        .iter()
        .filter(|e| e.benefit == Some(benefit) && e.branch == branch)
        .map(|e| e.cost_center.as_str())
        .collect();
    wanted.extend(
        records
            .iter()
            .filter(|r| r.realized_branch(benefit) == branch)
            .filter_map(|r| r.realized_cost_center(benefit)),
    );

    comparison
        .by_cost_center
        .iter()
        .filter(|row| wanted.contains(row.label.as_str()))
        .cloned()
        .collect()
}

fn sum_by<'a>(items: impl Iterator<Item = (&'a str, f64)>) -> BTreeMap<&'a str, f64> {
    let mut out = BTreeMap::new();
    for (label, amount) in items {
        *out.entry(label).or_insert(0.0) += amount;
    }
    out
}

fn outer_join(ledger: BTreeMap<&str, f64>, realized: BTreeMap<&str, f64>) -> Vec<LedgerComparisonRow> {
    let labels: BTreeSet<&str> = ledger.keys().chain(realized.keys()).copied().collect();
    labels
        .into_iter()
        .map(|label| {
            let l = round_cents(ledger.get(label).copied().unwrap_or(0.0));
            let r = round_cents(realized.get(label).copied().unwrap_or(0.0));
            LedgerComparisonRow {
                label: label.to_string(),
                ledger: l,
                realized: r,
                difference: round_cents(l - r),
            }
        })
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
            cost_center: (realized_branch != SENTINEL_BRANCH).then(|| format!("CC{realized_branch}")),
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

    fn entry(cc: &str, branch: &str, benefit: Benefit, amount: f64) -> LedgerEntry {
        LedgerEntry {
            cost_center: cc.into(),
            branch: branch.into(),
            account: benefit.ledger_code().into(),
            benefit: Some(benefit),
            amount,
        }
    }

    fn sample() -> Vec<ReconciledRecord> {
        vec![
            record("1", "02", 100.0, "02", 120.0),
            record("2", "02", 100.0, "00", 0.0),
            record("3", "00", 0.0, "31", 80.0),
            record("4", "31", 50.0, "02", 40.0),
        ]
    }

    #[test]
    fn totals_use_difference_over_budget() {
        let totals = benefit_totals(&sample());
        assert_eq!(totals.len(), 5);
        let va = &totals[0];
        assert_eq!(va.benefit, Some(Benefit::Va));
        assert_eq!(va.budgeted, 250.0);
        assert_eq!(va.realized, 240.0);
        assert_eq!(va.difference, -10.0);
        assert_eq!(va.variation_pct, -4.0);

        let unimed = &totals[1];
        assert_eq!(unimed.budgeted, 0.0);
        assert_eq!(unimed.variation_pct, 0.0);

        let grand = totals.last().unwrap();
        assert_eq!(grand.label, GRAND_TOTAL_LABEL);
        assert_eq!(grand.benefit, None);
        assert_eq!(grand.budgeted, 250.0);
        assert_eq!(grand.realized, 240.0);
    }

    #[test]
    fn branch_comparison_uses_realized_over_budget() {
        let rows = branch_comparison(&sample(), Benefit::Va, None);
        let labels: Vec<_> = rows.iter().map(|r| r.branch.as_str()).collect();
        assert_eq!(labels, vec!["00", "02", "31"]);

        let b02 = &rows[1];
        assert_eq!(b02.budgeted, 200.0);
        assert_eq!(b02.budgeted_count, 2);
        assert_eq!(b02.realized, 160.0);
        assert_eq!(b02.realized_count, 2);
        assert_eq!(b02.difference, -40.0);
        assert_eq!(b02.variation_pct, 80.0);

        let b00 = &rows[0];
        assert_eq!(b00.budgeted, 0.0);
        assert_eq!(b00.variation_pct, 0.0);
    }

    #[test]
    fn branch_comparison_takes_realized_from_ledger() {
        let ledger = vec![
            entry("CC02", "02", Benefit::Va, 150.0),
            entry("CC59", "59", Benefit::Va, 10.0),
            entry("CC02", "02", Benefit::Unimed, 999.0),
        ];
        let rows = branch_comparison(&sample(), Benefit::Va, Some(&ledger));
        let labels: Vec<_> = rows.iter().map(|r| r.branch.as_str()).collect();
        assert_eq!(labels, vec!["00", "02", "31", "59"]);

        let b02 = &rows[1];
        assert_eq!(b02.realized, 150.0);
        assert_eq!(b02.realized_count, 2);
        let b31 = &rows[2];
        assert_eq!(b31.realized, 0.0);
        assert_eq!(b31.realized_count, 1);
        assert_eq!(rows[3].realized, 10.0);
    }

    #[test]
    fn two_percent_formulas_differ() {
        assert_eq!(difference_pct(-10.0, 200.0), -5.0);
        assert_eq!(realization_pct(190.0, 200.0), 95.0);
        assert_eq!(difference_pct(5.0, 0.0), 0.0);
        assert_eq!(realization_pct(5.0, 0.0), 0.0);
    }

    #[test]
    fn ledger_comparison_outer_joins() {
        let ledger = vec![entry("CC02", "02", Benefit::Va, 150.0), entry("CC67", "67", Benefit::Va, 5.0)];
        let cmp = compare_ledger(&sample(), &ledger, Benefit::Va);

        let branches: Vec<_> = cmp
            .by_branch
            .iter()
            .map(|r| (r.label.as_str(), r.ledger, r.realized, r.difference))
            .collect();
        assert_eq!(
            branches,
            vec![("02", 150.0, 160.0, -10.0), ("31", 0.0, 80.0, -80.0), ("67", 5.0, 0.0, 5.0)]
        );

        let ccs: Vec<_> = cmp.by_cost_center.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(ccs, vec!["CC02", "CC31", "CC67"]);
    }

    #[test]
    fn sentinel_branch_shows_only_with_money() {
        let mut records = sample();
        records.push(record("5", "02", 0.0, "00", 12.0));
        let cmp = compare_ledger(&records, &[], Benefit::Va);
        assert_eq!(cmp.by_branch[0].label, "00");
        assert_eq!(cmp.by_branch[0].realized, 12.0);

        let cmp = compare_ledger(&sample(), &[], Benefit::Va);
        assert!(cmp.by_branch.iter().all(|r| r.label != "00"));
    }

    #[test]
    fn drilldown_limits_to_branch_cost_centers() {
        let ledger = vec![entry("CC02", "02", Benefit::Va, 150.0), entry("CC67", "67", Benefit::Va, 5.0)];
        let records = sample();
        let cmp = compare_ledger(&records, &ledger, Benefit::Va);

        let rows = cost_center_drilldown(&cmp, &records, &ledger, "02");
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["CC02"]);

        let rows = cost_center_drilldown(&cmp, &records, &ledger, "67");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].ledger, 5.0);
    }
}
