//! `rateio run` / `rateio validate`: run-file driven reconciliation.

use std::path::{Path, PathBuf};

use clap::Args;
use rateio_recon::{LoadLog, RawSheet, ReconConfig, ReconError, ReconInput, ReconOutcome, SourceKind};

use crate::exit_codes::EXIT_DIAGNOSTIC;
use crate::report;
use crate::CliError;

/// Flags that take precedence over the run file.
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Analysis month, two digits (01..12)
    #[arg(long)]
    pub month: Option<String>,

    /// Analysis year (defaults to the run file's, then the current year)
    #[arg(long)]
    pub year: Option<i32>,

    /// Expect an SV2 sheet and fold it into life insurance
    #[arg(long, overrides_with = "no_alternate_life_insurance")]
    pub alternate_life_insurance: bool,

    /// Expect no SV2 sheet, whatever the run file says
    #[arg(long, overrides_with = "alternate_life_insurance")]
    pub no_alternate_life_insurance: bool,
}

impl Overrides {
    fn apply(&self, config: &mut ReconConfig) -> Result<(), ReconError> {
        if let Some(month) = &self.month {
            config.month = month.clone();
        }
        if let Some(year) = self.year {
            config.year = Some(year);
        }
        if let Some(alternate) = self.alternate_mode() {
            config.alternate_life_insurance = alternate;
        }
        config.validate()
    }

    /// The life-insurance mode asked for on the command line, if any.
    fn alternate_mode(&self) -> Option<bool> {
        match (self.alternate_life_insurance, self.no_alternate_life_insurance) {
            (true, _) => Some(true),
            (false, true) => Some(false),
            (false, false) => None,
        }
    }
}

/// A parsed run file and the directory its relative paths resolve against.
#[derive(Debug)]
pub struct RunFile {
    pub config: ReconConfig,
    pub base_dir: PathBuf,
}

impl RunFile {
    pub fn load(path: &Path, overrides: &Overrides) -> Result<Self, CliError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("cannot read run file {}: {e}", path.display())))?;

        let mut config = ReconConfig::from_toml(&text)?;
        overrides.apply(&mut config)?;

        let base_dir = path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf();
        Ok(Self { config, base_dir })
    }

    pub fn resolve(&self, file: &str) -> PathBuf {
        self.base_dir.join(file)
    }

    /// Every input the run file names, benefits first.
    pub fn inputs(&self) -> Vec<(&'static str, PathBuf)> {
        let files = &self.config.files;
        let mut inputs = vec![("benefits", self.resolve(&files.benefits))];
        for (label, file) in [("budget", &files.budget), ("ledger", &files.ledger), ("roster", &files.roster)] {
            if let Some(file) = file {
                inputs.push((label, self.resolve(file)));
            }
        }
        inputs
    }
}

/// Read the inputs and reconcile. A benefits workbook that cannot be opened
/// becomes a diagnostic; an unreadable auxiliary table is an error.
pub fn execute(run: &RunFile) -> Result<ReconOutcome, CliError> {
    let config = &run.config;

    let benefits_path = run.resolve(&config.files.benefits);
    let benefits = match rateio_io::read_workbook(&benefits_path) {
        Ok(workbook) => workbook,
        Err(e) => {
            log::warn!("benefits workbook unusable: {e}");
            let expected = SourceKind::expected(config.alternate_life_insurance);
            return Ok(ReconOutcome::Diagnostic(LoadLog::from_general_error(expected, e)));
        }
    };

    let input = ReconInput {
        benefits,
        budget: read_optional(run, config.files.budget.as_deref())?,
        ledger: read_optional(run, config.files.ledger.as_deref())?,
        roster: read_optional(run, config.files.roster.as_deref())?,
    };

    let mut progress = |percent: u8, message: &str| -> Result<(), String> {
        log::info!("[{percent:>3}%] {message}");
        Ok(())
    };

    Ok(rateio_recon::run(config, &input, &mut progress)?)
}

fn read_optional(run: &RunFile, file: Option<&str>) -> Result<Option<RawSheet>, CliError> {
    file.map(|f| {
        let path = run.resolve(f);
        rateio_io::read_table(&path).map_err(|e| CliError::from(ReconError::Io(e)))
    })
    .transpose()
}

/// Turn a diagnostic outcome into the exit-3 error after printing the guide.
pub fn diagnostic_error(log: &LoadLog) -> CliError {
    eprint!("{}", report::render_guide(log));
    CliError {
        code: EXIT_DIAGNOSTIC,
        message: "benefits workbook could not be reconciled".into(),
        hint: Some("fix the sheets listed above and run again".into()),
    }
}

pub fn cmd_run(
    run_file: PathBuf,
    overrides: Overrides,
    json_output: bool,
    output_file: Option<PathBuf>,
) -> Result<(), CliError> {
    let run = RunFile::load(&run_file, &overrides)?;
    let outcome = execute(&run)?;

    let json_str = serde_json::to_string_pretty(&outcome)
        .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;

    if let Some(ref path) = output_file {
        std::fs::write(path, &json_str)
            .map_err(|e| CliError::io(format!("cannot write output: {e}")))?;
        eprintln!("wrote {}", path.display());
    }

    if json_output {
        println!("{json_str}");
    }

    match &outcome {
        ReconOutcome::Reconciled(report) => {
            eprint!("{}", report::render_summary(report));
            Ok(())
        }
        ReconOutcome::Diagnostic(log) => Err(diagnostic_error(log)),
    }
}

pub fn cmd_validate(run_file: PathBuf, overrides: Overrides) -> Result<(), CliError> {
    let run = RunFile::load(&run_file, &overrides)?;

    let missing: Vec<String> = run
        .inputs()
        .into_iter()
        .filter(|(_, path)| !path.is_file())
        .map(|(label, path)| format!("{label}: {}", path.display()))
        .collect();

    if !missing.is_empty() {
        return Err(CliError::io(format!("input files not found: {}", missing.join("; ")))
            .with_hint("relative paths resolve against the run file's directory"));
    }

    let config = &run.config;
    eprintln!(
        "valid: run '{}' for {} with {} input(s){}",
        config.name,
        config.period(),
        run.inputs().len(),
        if config.alternate_life_insurance { ", SV2 folded into SV" } else { "" },
    );
    Ok(())
}
