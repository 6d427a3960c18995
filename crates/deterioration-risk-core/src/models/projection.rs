//! Aggregate projection models.

use serde::{Deserialize, Serialize};

use super::prediction::ModelMetrics;

/// Which path produced a projection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectionMethod {
    /// Per-record probabilities from the random forest
    RandomForest,
    /// Fixed rates per risk level
    RuleBased,
}

/// Per-specialty risk summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyRisk {
    pub specialty: String,
    /// Records in this specialty
    pub total: u64,
    /// Mean probability (absent on the rule-based path)
    pub mean_probability: Option<f64>,
    /// High-band records (ML) or RED/YELLOW records (rule-based)
    pub high_count: u64,
}

/// Operational and financial projection over a batch of referrals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateProjection {
    pub total: u64,
    pub high_count: u64,
    pub medium_count: u64,
    pub low_count: u64,
    /// Expected deteriorations within 30 days
    pub deterioration_30d: u64,
    /// Expected deteriorations within 60 days
    pub deterioration_60d: u64,
    /// Expected deteriorations within 90 days
    pub deterioration_90d: u64,
    pub hospitalizations: u64,
    pub cost_30d: u64,
    pub cost_total: u64,
    /// Mean probability over the batch (ML path, non-empty batch only)
    pub mean_probability: Option<f64>,
    /// Top specialties, ranked
    pub top_specialties: Vec<SpecialtyRisk>,
    /// False when the rule-based fallback produced this projection
    pub used_ml: bool,
    pub method: ProjectionMethod,
    /// Why the ML path was skipped, when it was
    pub fallback_reason: Option<String>,
    /// Metrics of the model that scored the batch
    pub metrics: Option<ModelMetrics>,
}

impl AggregateProjection {
    /// Total projected deteriorations over all three horizons.
    pub fn total_deteriorations(&self) -> u64 {
        self.deterioration_30d + self.deterioration_60d + self.deterioration_90d
    }

    /// Serialize to JSON for dashboard consumers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
