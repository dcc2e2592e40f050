//! Fixed vocabulary: the logical benefit sheets, their required columns, and
//! the four benefit types the reports are organised around.

use serde::Serialize;

use crate::error::ReconError;

// ---------------------------------------------------------------------------
// Canonical column names
// ---------------------------------------------------------------------------

pub const COL_HOLDER_KEY: &str = "CPFTITULAR";
pub const COL_BENEFICIARY_KEY: &str = "CPFBENEFICIARIO";
pub const COL_COST_CENTER: &str = "CCFORMATADO";
pub const COL_BRANCH: &str = "FILIAL";
pub const COL_VALUE: &str = "VALOR";

/// Column-name fragment that marks a person-key column for key extraction.
pub const PERSON_KEY_TERM: &str = COL_HOLDER_KEY;

// ---------------------------------------------------------------------------
// Logical sheets
// ---------------------------------------------------------------------------

/// One of the benefit sheets expected in the benefits workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SourceKind {
    /// Health insurance.
    Unimed,
    /// Dental plan.
    Clin,
    /// Meal voucher.
    Va,
    /// Life insurance.
    Sv,
    /// Life insurance paid through a second payroll mechanism.
    Sv2,
}

impl SourceKind {
    pub const PRIMARY: [SourceKind; 4] = [Self::Unimed, Self::Clin, Self::Va, Self::Sv];

    /// Sheets expected for a run, in declaration order.
    pub fn expected(alternate_life_insurance: bool) -> Vec<SourceKind> {
        let mut kinds = Self::PRIMARY.to_vec();
        if alternate_life_insurance {
            kinds.push(Self::Sv2);
        }
        kinds
    }

    /// Sheet name as users are told to spell it.
    pub fn sheet_name(&self) -> &'static str {
        match self {
            Self::Unimed => "UNIMED",
            Self::Clin => "CLIN",
            Self::Va => "VA",
            Self::Sv => "SV",
            Self::Sv2 => "SV2",
        }
    }

    /// Required semantic columns, in the order they are searched for.
    pub fn required_columns(&self) -> &'static [&'static str] {
        match self {
            Self::Unimed => &[
                COL_HOLDER_KEY,
                COL_BENEFICIARY_KEY,
                COL_COST_CENTER,
                COL_BRANCH,
                COL_VALUE,
                "406",
            ],
            Self::Clin => &[
                COL_HOLDER_KEY,
                COL_COST_CENTER,
                COL_BRANCH,
                COL_BENEFICIARY_KEY,
                COL_VALUE,
                "442",
            ],
            Self::Va => &[COL_HOLDER_KEY, COL_BRANCH, COL_COST_CENTER, COL_VALUE, "424"],
            Self::Sv => &[COL_COST_CENTER, COL_HOLDER_KEY, COL_BRANCH, COL_VALUE],
            Self::Sv2 => &[COL_HOLDER_KEY, COL_COST_CENTER, COL_VALUE, COL_BRANCH],
        }
    }

    /// Column holding the person key this sheet joins on. Health and dental
    /// bill per beneficiary; the others per holder.
    pub fn key_column(&self) -> &'static str {
        match self {
            Self::Unimed | Self::Clin => COL_BENEFICIARY_KEY,
            Self::Va | Self::Sv | Self::Sv2 => COL_HOLDER_KEY,
        }
    }

    /// Benefit whose realized columns this sheet feeds.
    pub fn benefit(&self) -> Benefit {
        match self {
            Self::Unimed => Benefit::Unimed,
            Self::Clin => Benefit::Clin,
            Self::Va => Benefit::Va,
            Self::Sv | Self::Sv2 => Benefit::Sv,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.sheet_name())
    }
}

// ---------------------------------------------------------------------------
// Benefits
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Benefit {
    Va,
    Unimed,
    Clin,
    Sv,
}

impl Benefit {
    pub const ALL: [Benefit; 4] = [Self::Va, Self::Unimed, Self::Clin, Self::Sv];

    /// Short code used in column suffixes (`realizado_va`, `previsto_va`).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Va => "va",
            Self::Unimed => "unimed",
            Self::Clin => "clin",
            Self::Sv => "sv",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Va => "Vale Alimentação",
            Self::Unimed => "Assistência Médica",
            Self::Clin => "Assistência Odontológica",
            Self::Sv => "Seguro de Vida",
        }
    }

    /// Amount column in the budget table.
    pub fn budget_column(&self) -> &'static str {
        match self {
            Self::Va => "VALE ALIMENTACAO",
            Self::Unimed => "ASSISTENCIA MEDICA",
            Self::Clin => "ASSISTENCIA ODONTOLOGICA",
            Self::Sv => "SEGURO DE VIDA",
        }
    }

    /// Canonical account code in the ledger after remapping.
    pub fn ledger_code(&self) -> &'static str {
        match self {
            Self::Va => "VA",
            Self::Unimed => "UNIMED",
            Self::Clin => "CLIN",
            Self::Sv => "SV",
        }
    }

    pub fn from_ledger_code(code: &str) -> Option<Benefit> {
        Self::ALL.into_iter().find(|b| b.ledger_code() == code)
    }
}

impl std::fmt::Display for Benefit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Benefit {
    type Err = ReconError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.code() == lower || b.ledger_code().eq_ignore_ascii_case(&lower))
            .ok_or_else(|| ReconError::UnknownBenefit(s.to_string()))
    }
}
