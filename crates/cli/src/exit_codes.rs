//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success, a reconciled report was produced             |
//! | 1    | General error (budget/ledger/roster table unusable)   |
//! | 2    | CLI usage error (bad arguments)                       |
//! | 3    | Benefits workbook unusable, diagnostic log produced   |
//! | 4    | Run file invalid (parse or validation)                |
//! | 5    | I/O failure (input unreadable, output unwritable)     |

use rateio_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - an auxiliary table could not be used.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unknown benefit or branch.
pub const EXIT_USAGE: u8 = 2;

/// The run produced only a diagnostic log (missing sheets, missing
/// columns, or a workbook that could not be opened).
pub const EXIT_DIAGNOSTIC: u8 = 3;

/// Run file could not be parsed or failed validation.
pub const EXIT_INVALID_RUN_FILE: u8 = 4;

/// Reading an input or writing an output failed.
pub const EXIT_IO: u8 = 5;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_RUN_FILE,
        ReconError::UnknownBenefit(_) => EXIT_USAGE,
        ReconError::Io(_) => EXIT_IO,
        ReconError::MissingColumn { .. } | ReconError::AmountParse { .. } => EXIT_ERROR,
    }
}
