//! `rateio-recon`: benefit allocation reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded workbooks, returns reconciled
//! per-person records or a diagnostic log. No CLI or IO dependencies.

pub mod budget;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod extract;
pub mod ledger;
pub mod loader;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod process;
pub mod progress;
pub mod roster;
pub mod schema;
pub mod transfer;

pub use config::ReconConfig;
pub use engine::{run, ReconInput};
pub use error::ReconError;
pub use loader::LoadLog;
pub use model::{RawSheet, ReconOutcome, ReconReport, ReconciledRecord, Workbook};
pub use progress::{NoProgress, ProgressSink};
pub use schema::{Benefit, SourceKind};
