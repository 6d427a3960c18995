//! Referral request models.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Ordinal urgency classification of a referral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Red,
    Yellow,
    Green,
    Blue,
    /// Missing or unrecognized value
    #[default]
    Unknown,
}

impl RiskLevel {
    /// Parse a raw risk value. Accepts English and Portuguese names, any case.
    ///
    /// Never fails: anything unrecognized is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "RED" | "VERMELHO" => RiskLevel::Red,
            "YELLOW" | "AMARELO" => RiskLevel::Yellow,
            "GREEN" | "VERDE" => RiskLevel::Green,
            "BLUE" | "AZUL" => RiskLevel::Blue,
            _ => RiskLevel::Unknown,
        }
    }

    /// Ordinal encoding: RED=4, YELLOW=3, GREEN=2, BLUE=1, unknown=0.
    pub fn score(self) -> u8 {
        match self {
            RiskLevel::Red => 4,
            RiskLevel::Yellow => 3,
            RiskLevel::Green => 2,
            RiskLevel::Blue => 1,
            RiskLevel::Unknown => 0,
        }
    }

    /// Inverse of [`RiskLevel::score`]; out-of-range scores are `Unknown`.
    pub fn from_score(score: u8) -> Self {
        match score {
            4 => RiskLevel::Red,
            3 => RiskLevel::Yellow,
            2 => RiskLevel::Green,
            1 => RiskLevel::Blue,
            _ => RiskLevel::Unknown,
        }
    }

    /// RED and YELLOW referrals are treated as critical by the rule-based projection.
    pub fn is_critical(self) -> bool {
        matches!(self, RiskLevel::Red | RiskLevel::Yellow)
    }

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Red => "RED",
            RiskLevel::Yellow => "YELLOW",
            RiskLevel::Green => "GREEN",
            RiskLevel::Blue => "BLUE",
            RiskLevel::Unknown => "UNKNOWN",
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(raw: &str) -> Self {
        RiskLevel::parse(raw)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn risk_from_raw<'de, D>(deserializer: D) -> Result<RiskLevel, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().map(RiskLevel::parse).unwrap_or_default())
}

/// A patient's referral request, as loaded from the data source.
///
/// Field aliases accept the column names of the source extract
/// (`solicitacao_risco`, `procedimento_especialidade`, ...).
/// Records are read-only inputs to the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReferralRecord {
    /// Urgency classification
    #[serde(default, alias = "solicitacao_risco", deserialize_with = "risk_from_raw")]
    pub risk_level: RiskLevel,
    /// Medical specialty of the requested procedure
    #[serde(default, alias = "procedimento_especialidade")]
    pub specialty: Option<String>,
    /// Free-text age bucket (e.g. "60 a 69 anos")
    #[serde(default, alias = "paciente_faixa_etaria")]
    pub age_band: Option<String>,
    /// Free-text status, may carry urgency keywords
    #[serde(default, alias = "solicitacao_status")]
    pub status_text: Option<String>,
    /// Precomputed wait time in days
    #[serde(default, alias = "tempo_espera_dias")]
    pub wait_days: Option<i64>,
    /// Date the request was filed
    #[serde(default, alias = "data_solicitacao")]
    pub requested_on: Option<NaiveDate>,
}

impl ReferralRecord {
    /// Create a record with only a risk level set.
    pub fn new(risk_level: RiskLevel) -> Self {
        Self {
            risk_level,
            ..Default::default()
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    pub fn with_age_band(mut self, age_band: impl Into<String>) -> Self {
        self.age_band = Some(age_band.into());
        self
    }

    pub fn with_status(mut self, status_text: impl Into<String>) -> Self {
        self.status_text = Some(status_text.into());
        self
    }

    pub fn with_wait_days(mut self, wait_days: i64) -> Self {
        self.wait_days = Some(wait_days);
        self
    }

    pub fn with_requested_on(mut self, requested_on: NaiveDate) -> Self {
        self.requested_on = Some(requested_on);
        self
    }
}
