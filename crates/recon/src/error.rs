use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Run file validation error (bad month, empty file path, etc.).
    ConfigValidation(String),
    /// Missing required column in a budget, ledger or roster table.
    MissingColumn { table: String, column: String },
    /// A budget or ledger amount survived none of the numeric fallbacks.
    AmountParse { table: String, key: String, value: String },
    /// A benefit code that is not one of va/unimed/clin/sv.
    UnknownBenefit(String),
    /// An input file could not be read.
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "run file parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "run file validation error: {msg}"),
            Self::MissingColumn { table, column } => {
                write!(f, "table '{table}': missing column '{column}'")
            }
            Self::AmountParse { table, key, value } => {
                write!(f, "table '{table}', key '{key}': cannot parse amount '{value}'")
            }
            Self::UnknownBenefit(code) => {
                write!(f, "unknown benefit '{code}' (expected va, unimed, clin or sv)")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
