// rateio CLI - benefit allocation reconciliation, headless

mod exit_codes;
mod recon;
mod report;
mod view;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rateio_recon::ReconError;

use exit_codes::{recon_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use recon::Overrides;
use view::View;

#[derive(Parser)]
#[command(name = "rateio")]
#[command(about = "Reconcile budgeted and realized benefit allocations per employee")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Log pipeline progress to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile the inputs named in a run file
    #[command(after_help = "\
Examples:
  rateio run marco.rateio.toml
  rateio run marco.rateio.toml --json
  rateio run marco.rateio.toml --month 04 --output abril.json
  rateio run marco.rateio.toml --alternate-life-insurance -v")]
    Run {
        /// Path to the .rateio.toml run file
        run_file: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// Print the JSON result to stdout
        #[arg(long)]
        json: bool,

        /// Write the JSON result to a file
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Check a run file and the inputs it names without reconciling
    #[command(after_help = "\
Examples:
  rateio validate marco.rateio.toml")]
    Validate {
        /// Path to the .rateio.toml run file
        run_file: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Reconcile, then print one analysis view as JSON
    #[command(after_help = "\
Examples:
  rateio view marco.rateio.toml totals
  rateio view marco.rateio.toml branches --benefit va
  rateio view marco.rateio.toml matrix --benefit unimed
  rateio view marco.rateio.toml categories --branch 31
  rateio view marco.rateio.toml transfers --benefit va --branch 02 --to 31
  rateio view marco.rateio.toml ledger --benefit sv
  rateio view marco.rateio.toml drilldown --benefit va --branch 31
  rateio view marco.rateio.toml person --key 111.111.111-11")]
    View {
        /// Path to the .rateio.toml run file
        run_file: PathBuf,

        /// Which view to compute
        #[arg(value_enum)]
        view: View,

        #[command(flatten)]
        overrides: Overrides,

        /// Benefit code: va, unimed, clin or sv
        #[arg(long, short = 'b')]
        benefit: Option<String>,

        /// Branch code (budgeted branch for transfers)
        #[arg(long)]
        branch: Option<String>,

        /// Realized branch for transfers
        #[arg(long)]
        to: Option<String>,

        /// Person key (CPF) for the person view
        #[arg(long)]
        key: Option<String>,

        /// Write the view to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        None => {
            eprintln!("Usage: rateio <command> [options]");
            eprintln!("       rateio --help for more information");
            Ok(())
        }
        Some(Commands::Run { run_file, overrides, json, output }) => {
            recon::cmd_run(run_file, overrides, json, output)
        }
        Some(Commands::Validate { run_file, overrides }) => recon::cmd_validate(run_file, overrides),
        Some(Commands::View { run_file, view, overrides, benefit, branch, to, key, output }) => {
            let selection = view::Selection { benefit, branch, to, key };
            view::cmd_view(run_file, overrides, view, selection, output)
        }
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        let hint = match &err {
            ReconError::MissingColumn { .. } => {
                Some("check the header row of that file; column names are matched ignoring case".to_string())
            }
            ReconError::AmountParse { .. } => {
                Some("amounts may use '.' or ',' as decimal separator; remove other text".to_string())
            }
            ReconError::ConfigParse(_) => Some("run files are TOML; see `rateio validate`".to_string()),
            _ => None,
        };
        Self { code: recon_exit_code(&err), message: err.to_string(), hint }
    }
}
