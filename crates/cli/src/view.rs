//! `rateio view`: one analysis view over a fresh reconciliation, as JSON.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::Serialize;

use rateio_recon::compare::{
    benefit_totals, branch_comparison, compare_ledger, compare_ledger_all, cost_center_drilldown,
};
use rateio_recon::model::LedgerEntry;
use rateio_recon::normalize::{roster_person_key, zero_pad, BRANCH_CODE_LEN};
use rateio_recon::transfer::{budgeted_branches, categorize, categorize_branch, transfer_detail, transfer_matrix};
use rateio_recon::{Benefit, ReconOutcome, ReconReport};

use crate::recon::{diagnostic_error, execute, Overrides, RunFile};
use crate::CliError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum View {
    /// Budgeted vs realized per benefit, with a grand total
    Totals,
    /// Per-branch comparison for one benefit (ledger-backed when available)
    Branches,
    /// Budgeted-branch x realized-branch matrix for one benefit
    Matrix,
    /// Branches that can be categorised
    BudgetedBranches,
    /// Terminated, new hires and transfers for one branch
    Categories,
    /// People budgeted in --branch and realized in --to
    Transfers,
    /// Ledger vs realized by branch and cost center
    Ledger,
    /// Ledger vs realized per cost center within one branch
    Drilldown,
    /// One person's reconciled record
    Person,
}

impl View {
    fn name(&self) -> &'static str {
        match self {
            Self::Totals => "totals",
            Self::Branches => "branches",
            Self::Matrix => "matrix",
            Self::BudgetedBranches => "budgeted_branches",
            Self::Categories => "categories",
            Self::Transfers => "transfers",
            Self::Ledger => "ledger",
            Self::Drilldown => "drilldown",
            Self::Person => "person",
        }
    }
}

/// Selection flags shared by the views. Each view reads what it needs.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub benefit: Option<String>,
    pub branch: Option<String>,
    pub to: Option<String>,
    pub key: Option<String>,
}

impl Selection {
    fn benefit(&self) -> Result<Option<Benefit>, CliError> {
        Ok(self.benefit.as_deref().map(str::parse::<Benefit>).transpose()?)
    }

    fn required_benefit(&self, view: View) -> Result<Benefit, CliError> {
        self.benefit()?.ok_or_else(|| {
            CliError::usage(format!("the {} view needs --benefit", view.name()))
                .with_hint("one of: va, unimed, clin, sv")
        })
    }

    fn required_branch(&self, view: View) -> Result<String, CliError> {
        self.branch
            .as_deref()
            .map(|b| zero_pad(b.trim(), BRANCH_CODE_LEN))
            .ok_or_else(|| CliError::usage(format!("the {} view needs --branch", view.name())))
    }
}

#[derive(Serialize)]
struct ViewOutput<'a, T: Serialize> {
    view: &'static str,
    config_name: &'a str,
    period: &'a str,
    data: T,
}

pub fn cmd_view(
    run_file: PathBuf,
    overrides: Overrides,
    view: View,
    selection: Selection,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let run = RunFile::load(&run_file, &overrides)?;
    let report = match execute(&run)? {
        ReconOutcome::Reconciled(report) => report,
        ReconOutcome::Diagnostic(log) => return Err(diagnostic_error(&log)),
    };

    let data = render_view(&report, view, &selection)?;
    let output = ViewOutput {
        view: view.name(),
        config_name: &report.meta.config_name,
        period: &report.meta.period,
        data,
    };
    let json_str = serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    match output_file {
        Some(path) => {
            std::fs::write(&path, &json_str)
                .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json_str}"),
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<serde_json::Value, CliError> {
    serde_json::to_value(value).map_err(|e| CliError::io(format!("JSON serialization error: {e}")))
}

/// Compute `view` over `report`.
pub fn render_view(report: &ReconReport, view: View, selection: &Selection) -> Result<serde_json::Value, CliError> {
    let records = &report.records;

    match view {
        View::Totals => to_json(&benefit_totals(records)),
        View::Branches => {
            let benefit = selection.required_benefit(view)?;
            to_json(&branch_comparison(records, benefit, report.ledger()))
        }
        View::Matrix => {
            let benefit = selection.required_benefit(view)?;
            to_json(&transfer_matrix(records, benefit))
        }
        View::BudgetedBranches => to_json(&budgeted_branches(records)),
        View::Categories => {
            let branch = selectable_branch(report, selection.required_branch(view)?)?;
            match selection.benefit()? {
                Some(benefit) => to_json(&categorize(records, &branch, benefit)),
                None => to_json(&categorize_branch(records, &branch)),
            }
        }
        View::Transfers => {
            let benefit = selection.required_benefit(view)?;
            let from = selection.required_branch(view)?;
            let to = selection
                .to
                .as_deref()
                .map(|b| zero_pad(b.trim(), BRANCH_CODE_LEN))
                .ok_or_else(|| CliError::usage("the transfers view needs --to"))?;
            to_json(&transfer_detail(records, benefit, &from, &to))
        }
        View::Ledger => {
            let ledger = required_ledger(report)?;
            match selection.benefit()? {
                Some(benefit) => to_json(&compare_ledger(records, ledger, benefit)),
                None => to_json(&compare_ledger_all(records, ledger)),
            }
        }
        View::Drilldown => {
            let ledger = required_ledger(report)?;
            let benefit = selection.required_benefit(view)?;
            let branch = selection.required_branch(view)?;
            let comparison = compare_ledger(records, ledger, benefit);
            to_json(&cost_center_drilldown(&comparison, records, ledger, &branch))
        }
        View::Person => {
            let raw = selection
                .key
                .as_deref()
                .ok_or_else(|| CliError::usage("the person view needs --key"))?;
            let key = roster_person_key(raw);
            let record = records.iter().find(|r| r.key == key).ok_or_else(|| CliError {
                code: crate::exit_codes::EXIT_ERROR,
                message: format!("no record for key {key}"),
                hint: None,
            })?;
            to_json(record)
        }
    }
}

fn required_ledger(report: &ReconReport) -> Result<&[LedgerEntry], CliError> {
    report.ledger().ok_or_else(|| {
        CliError::usage("this view needs a ledger").with_hint("set files.ledger in the run file")
    })
}

fn selectable_branch(report: &ReconReport, branch: String) -> Result<String, CliError> {
    let branches = budgeted_branches(&report.records);
    if branches.contains(&branch) {
        Ok(branch)
    } else {
        Err(CliError::usage(format!("branch {branch} has no budgeted people"))
            .with_hint(format!("budgeted branches: {}", branches.join(", "))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rateio_recon::model::{PerBenefit, RealizedCell, ReconMeta, ReconciledRecord};

    fn record(key: &str, budgeted_branch: &str, realized_branch: &str, amount: f64) -> ReconciledRecord {
        ReconciledRecord {
            key: key.into(),
            name: None,
            budgeted_branch: budgeted_branch.into(),
            budgeted: PerBenefit::from_fn(|_| amount),
            realized: PerBenefit::from_fn(|_| RealizedCell {
                amount,
                branch: realized_branch.into(),
                cost_center: None,
            }),
        }
    }

    fn report() -> ReconReport {
        ReconReport {
            meta: ReconMeta {
                config_name: "test".into(),
                period: "202503".into(),
                alternate_life_insurance: false,
                has_budget: true,
                has_ledger: false,
                engine_version: "0".into(),
                run_at: String::new(),
            },
            records: vec![
                record("11111111111", "02", "02", 100.0),
                record("22222222222", "02", "31", 50.0),
            ],
            ledger: None,
        }
    }

    fn select(benefit: Option<&str>, branch: Option<&str>) -> Selection {
        Selection {
            benefit: benefit.map(String::from),
            branch: branch.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn branch_is_zero_padded() {
        let value = render_view(&report(), View::Categories, &select(Some("va"), Some("2"))).unwrap();
        assert_eq!(value["branch"], "02");
        assert_eq!(value["transfers"][0]["key"], "22222222222");
    }

    #[test]
    fn unknown_branch_lists_choices() {
        let err = render_view(&report(), View::Categories, &select(None, Some("31"))).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
        assert_eq!(err.hint.as_deref(), Some("budgeted branches: 02"));
    }

    #[test]
    fn unknown_benefit_is_usage_error() {
        let err = render_view(&report(), View::Matrix, &select(Some("vt"), None)).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }

    #[test]
    fn ledger_views_need_a_ledger() {
        let err = render_view(&report(), View::Ledger, &Selection::default()).unwrap_err();
        assert!(err.message.contains("needs a ledger"));
    }

    #[test]
    fn person_key_is_normalised() {
        let selection = Selection {
            key: Some("111.111.111-11".into()),
            ..Default::default()
        };
        let value = render_view(&report(), View::Person, &selection).unwrap();
        assert_eq!(value["key"], "11111111111");
    }

    #[test]
    fn totals_end_with_grand_total() {
        let value = render_view(&report(), View::Totals, &Selection::default()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4]["realized"], 600.0);
    }
}
