//! Human-readable output: the run summary and the diagnostic remediation guide.
//!
//! Both render to a `String` so callers decide the stream (always stderr in
//! practice; stdout is reserved for JSON).

use rateio_recon::compare::{benefit_totals, compare_ledger_all};
use rateio_recon::loader::SheetStatus;
use rateio_recon::{LoadLog, ReconReport};

/// Totals per benefit, plus ledger agreement when a ledger was supplied.
pub fn render_summary(report: &ReconReport) -> String {
    let mut out = String::new();
    let meta = &report.meta;

    out.push_str(&format!(
        "run '{}' ({}): {} people\n",
        meta.config_name,
        meta.period,
        report.records.len()
    ));
    if !meta.has_budget {
        out.push_str("  no budget table: realized values only\n");
    }

    out.push_str(&format!(
        "  {:<26} {:>14} {:>14} {:>14} {:>9}\n",
        "benefit", "budgeted", "realized", "difference", "var %"
    ));
    for total in benefit_totals(&report.records) {
        out.push_str(&format!(
            "  {:<26} {:>14.2} {:>14.2} {:>14.2} {:>8.1}%\n",
            total.label, total.budgeted, total.realized, total.difference, total.variation_pct
        ));
    }

    if let Some(ledger) = report.ledger() {
        out.push_str(&format!("  ledger: {} entries\n", ledger.len()));
        for cmp in compare_ledger_all(&report.records, ledger) {
            let differing = cmp.by_branch.iter().filter(|r| r.difference != 0.0).count();
            if differing > 0 {
                out.push_str(&format!(
                    "    {}: {} of {} branches differ from the ledger\n",
                    cmp.benefit.label(),
                    differing,
                    cmp.by_branch.len()
                ));
            }
        }
    }

    out
}

/// What was expected, what was found, what to fix.
pub fn render_guide(log: &LoadLog) -> String {
    let mut out = String::new();

    if let Some(err) = &log.general_error {
        out.push_str(&format!("could not open the benefits workbook: {err}\n"));
    }

    let expected: Vec<_> = log.expected.iter().map(|k| k.sheet_name()).collect();
    out.push_str(&format!("expected sheets: {}\n", expected.join(", ")));

    if log.sheets.is_empty() {
        if log.general_error.is_none() {
            out.push_str("the workbook has no sheets\n");
        }
    } else {
        out.push_str("sheets found:\n");
        for sheet in &log.sheets {
            let kind = sheet.kind.map(|k| k.sheet_name()).unwrap_or("-");
            let detail = match &sheet.status {
                SheetStatus::Loaded { rows, .. } => format!("ok, {rows} rows"),
                other => other.reason().unwrap_or_default(),
            };
            out.push_str(&format!("  {:<24} {:<7} {}\n", sheet.sheet_name, kind, detail));
        }
    }

    if let Some(summary) = log.summary() {
        out.push_str(&format!("{summary}\n"));
        out.push_str("rename the sheets to the expected names (accents, case and spaces are ignored)\n");
    }
    if log
        .sheets
        .iter()
        .any(|s| matches!(s.status, SheetStatus::MissingColumns { .. }))
    {
        out.push_str("add the missing columns; a header matches when it contains the column name\n");
    }

    out
}
