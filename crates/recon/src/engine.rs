use crate::budget::{join_budget, load_budget};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::extract::extract_person_keys;
use crate::ledger::load_ledger;
use crate::loader::{load_workbook, LoadOutcome};
use crate::merge::merge_sources;
use crate::model::{RawSheet, ReconMeta, ReconOutcome, ReconReport, Workbook};
use crate::process::process_source;
use crate::progress::{notify, Milestone, ProgressSink};
use crate::roster::{attach_names, load_roster};

/// Pre-loaded tables for one run. Single-table inputs are the first sheet of
/// their file.
#[derive(Debug, Clone, Default)]
pub struct ReconInput {
    pub benefits: Workbook,
    pub budget: Option<RawSheet>,
    pub ledger: Option<RawSheet>,
    pub roster: Option<RawSheet>,
}

/// Run reconciliation per config.
///
/// Sheet recognition and column problems are not errors: they come back as
/// [`ReconOutcome::Diagnostic`]. `Err` is reserved for auxiliary tables that
/// cannot be read at all.
pub fn run(
    config: &ReconConfig,
    input: &ReconInput,
    progress: &mut dyn ProgressSink,
) -> Result<ReconOutcome, ReconError> {
    notify(progress, Milestone::Loading);

    let tables = match load_workbook(&input.benefits, config.alternate_life_insurance) {
        LoadOutcome::Loaded(tables) => tables,
        LoadOutcome::Diagnostic(log) => return Ok(ReconOutcome::Diagnostic(log)),
    };
    notify(progress, Milestone::FilesLoaded);

    let keys = extract_person_keys(&tables);
    notify(progress, Milestone::KeysExtracted);

    let period = config.period();
    let budget = match &input.budget {
        Some(sheet) => {
            let rows = load_budget(sheet, &period)?;
            notify(progress, Milestone::BudgetLoaded);
            rows
        }
        None => Vec::new(),
    };

    let processed: Vec<_> = tables.tables.values().map(process_source).collect();
    notify(progress, Milestone::SourcesProcessed);

    let master = merge_sources(&keys, &processed, config.alternate_life_insurance);
    let mut records = join_budget(master, &budget);

    let ledger = input
        .ledger
        .as_ref()
        .map(|sheet| load_ledger(sheet, &config.ledger))
        .transpose()?;

    if let Some(sheet) = &input.roster {
        let names = load_roster(sheet)?;
        let attached = attach_names(&mut records, &names);
        log::info!("names attached to {attached} of {} records", records.len());
        notify(progress, Milestone::NamesAttached);
    }

    notify(progress, Milestone::Finished);
    log::info!("run '{}' ({period}): {} records", config.name, records.len());

    Ok(ReconOutcome::Reconciled(ReconReport {
        meta: ReconMeta {
            config_name: config.name.clone(),
            period,
            alternate_life_insurance: config.alternate_life_insurance,
            has_budget: input.budget.is_some(),
            has_ledger: ledger.is_some(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        },
        records,
        ledger,
    }))
}
