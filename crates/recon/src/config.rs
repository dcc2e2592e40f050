use serde::Deserialize;

use crate::error::ReconError;
use crate::ledger::LedgerMapping;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// A run file: which month to analyse and where the inputs are.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconConfig {
    pub name: String,
    /// Two-digit analysis month, "01".."12".
    pub month: String,
    /// Analysis year. Defaults to the current year when absent.
    #[serde(default)]
    pub year: Option<i32>,
    /// Expect an SV2 sheet and fold it into life insurance.
    #[serde(default)]
    pub alternate_life_insurance: bool,
    pub files: FilesConfig,
    #[serde(default)]
    pub ledger: LedgerMapping,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Input paths. Relative paths are resolved by the host against the run
/// file's directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    pub benefits: String,
    #[serde(default)]
    pub budget: Option<String>,
    #[serde(default)]
    pub ledger: Option<String>,
    #[serde(default)]
    pub roster: Option<String>,
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        validate_month(&self.month)?;

        if let Some(year) = self.year {
            if !(1900..=9999).contains(&year) {
                return Err(ReconError::ConfigValidation(format!(
                    "year must have four digits, got {year}"
                )));
            }
        }

        if self.files.benefits.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "files.benefits must not be empty".into(),
            ));
        }
        for (field, path) in [
            ("budget", &self.files.budget),
            ("ledger", &self.files.ledger),
            ("roster", &self.files.roster),
        ] {
            if path.as_deref().is_some_and(|p| p.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "files.{field} must not be empty when present"
                )));
            }
        }

        self.ledger.validate()
    }

    /// The configured year, or the current local year.
    pub fn effective_year(&self) -> i32 {
        use chrono::Datelike;
        self.year.unwrap_or_else(|| chrono::Local::now().year())
    }

    /// `YYYYMM` the budget is filtered on.
    pub fn period(&self) -> String {
        crate::budget::period(self.effective_year(), &self.month)
    }
}

/// Month must be exactly two digits between 01 and 12.
pub fn validate_month(month: &str) -> Result<(), ReconError> {
    let ok = month.len() == 2
        && month.bytes().all(|b| b.is_ascii_digit())
        && matches!(month.parse::<u8>(), Ok(1..=12));
    if ok {
        Ok(())
    } else {
        Err(ReconError::ConfigValidation(format!(
            "month must be two digits 01..12, got '{month}'"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
