//! Build the one-row-per-person master table from the processed sources.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{MasterRecord, PerBenefit, ProcessedSource, RealizedSlot};
use crate::normalize::{format_branch, round_cents, sheet_person_key};
use crate::schema::{Benefit, SourceKind, COL_BRANCH, COL_COST_CENTER};

/// Separator for branch and cost-center labels unioned across sources.
pub const LABEL_SEPARATOR: &str = ", ";

/// One source row reduced to what the master table needs.
#[derive(Debug, Clone, PartialEq)]
struct PreparedRow {
    key: String,
    amount: Option<f64>,
    branch: Option<String>,
    cost_center: Option<String>,
}

/// Left-join every source onto the key set. The result is sorted by key and
/// holds exactly one record per key.
///
/// With `alternate_life_insurance`, SV and SV2 rows are pooled and grouped
/// by key: amounts summed, branch and cost-center labels unioned.
pub fn merge_sources(
    keys: &BTreeSet<String>,
    sources: &[ProcessedSource],
    alternate_life_insurance: bool,
) -> Vec<MasterRecord> {
    let mut by_benefit: PerBenefit<BTreeMap<String, RealizedSlot>> = PerBenefit::default();

    for benefit in Benefit::ALL {
        let kinds: Vec<SourceKind> = sources
            .iter()
            .map(|s| s.kind)
            .filter(|k| k.benefit() == benefit)
            .filter(|k| alternate_life_insurance || *k != SourceKind::Sv2)
            .collect();

        let rows: Vec<PreparedRow> = sources
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .flat_map(prepare)
            .collect();

        let slots = if benefit == Benefit::Sv && kinds.contains(&SourceKind::Sv2) {
            collapse_union(rows)
        } else {
            collapse_first(rows)
        };
        *by_benefit.get_mut(benefit) = slots;
    }

    let records: Vec<MasterRecord> = keys
        .iter()
        .map(|key| MasterRecord {
            key: key.clone(),
            realized: PerBenefit::from_fn(|b| {
                by_benefit.get(b).get(key).cloned().unwrap_or_default()
            }),
        })
        .collect();

    log::info!("master table: {} records", records.len());
    records
}

/// Rows with a usable key. Sources missing the key, branch or cost-center
/// column, or without a value column, contribute nothing.
fn prepare(source: &ProcessedSource) -> Vec<PreparedRow> {
    let (Some(key_col), Some(branch_col), Some(cc_col), Some(_)) = (
        source.column_index(source.kind.key_column()),
        source.column_index(COL_BRANCH),
        source.column_index(COL_COST_CENTER),
        source.value_index,
    ) else {
        log::warn!("{}: missing join columns, skipped", source.kind);
        return Vec::new();
    };

    source
        .rows
        .iter()
        .filter_map(|row| {
            let key = sheet_person_key(row.cell(key_col))?;
            let cc = row.cell(cc_col);
            Some(PreparedRow {
                key,
                amount: row.final_amount.map(round_cents),
                branch: format_branch(row.cell(branch_col)),
                cost_center: (!cc.is_empty()).then(|| cc.to_string()),
            })
        })
        .collect()
}

/// Group by key. Amounts are summed; branch and cost center are the first
/// non-empty values seen.
fn collapse_first(rows: Vec<PreparedRow>) -> BTreeMap<String, RealizedSlot> {
    let mut out: BTreeMap<String, RealizedSlot> = BTreeMap::new();
    for row in rows {
        match out.get_mut(&row.key) {
            None => {
                out.insert(
                    row.key,
                    RealizedSlot {
                        amount: row.amount,
                        branch: row.branch,
                        cost_center: row.cost_center,
                    },
                );
            }
            Some(slot) => {
                log::debug!("duplicate source row for key {}", row.key);
                slot.amount = match (slot.amount, row.amount) {
                    (Some(a), Some(b)) => Some(round_cents(a + b)),
                    (a, b) => a.or(b),
                };
                if slot.branch.is_none() {
                    slot.branch = row.branch;
                }
                if slot.cost_center.is_none() {
                    slot.cost_center = row.cost_center;
                }
            }
        }
    }
    out
}

/// Group by key. Missing amounts count as zero; labels are the sorted,
/// deduplicated union joined with [`LABEL_SEPARATOR`]. Branches arrive as
/// codes already; cost centers are joined as read, never reduced to digits.
fn collapse_union(rows: Vec<PreparedRow>) -> BTreeMap<String, RealizedSlot> {
    #[derive(Default)]
    struct Acc {
        amount: f64,
        branches: BTreeSet<String>,
        cost_centers: BTreeSet<String>,
    }

    let mut groups: BTreeMap<String, Acc> = BTreeMap::new();
    for row in rows {
        let acc = groups.entry(row.key).or_default();
        acc.amount += row.amount.unwrap_or(0.0);
        acc.branches.extend(row.branch);
        acc.cost_centers.extend(row.cost_center);
    }

    groups
        .into_iter()
        .map(|(key, acc)| {
            let slot = RealizedSlot {
                amount: Some(round_cents(acc.amount)),
                branch: join_labels(acc.branches),
                cost_center: join_labels(acc.cost_centers),
            };
            (key, slot)
        })
        .collect()
}

fn join_labels(labels: BTreeSet<String>) -> Option<String> {
    if labels.is_empty() {
        None
    } else {
        Some(labels.into_iter().collect::<Vec<_>>().join(LABEL_SEPARATOR))
    }
}
