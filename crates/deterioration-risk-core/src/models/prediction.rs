//! Prediction output and model evaluation models.

use serde::{Deserialize, Serialize};

use super::features::FeatureVector;
use super::referral::RiskLevel;

/// A referral scored by a trained model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredRecord {
    /// Specialty as it appeared on the referral
    pub specialty: Option<String>,
    /// Risk level as it appeared on the referral
    pub risk_level: RiskLevel,
    /// Encoded features the model saw
    pub features: FeatureVector,
    /// Probability of deterioration (0.0 - 1.0)
    pub probability: f64,
    /// Majority-vote prediction (0 or 1)
    pub predicted_label: u8,
}

impl ScoredRecord {
    /// Build a scored record without features, for callers that only carry
    /// probabilities (e.g. scores computed elsewhere).
    pub fn from_probability(specialty: Option<String>, probability: f64) -> Self {
        Self {
            specialty,
            risk_level: RiskLevel::Unknown,
            features: FeatureVector {
                risk_score: 0,
                wait_days: 0,
                age_estimate: 0,
                specialty_code: 0,
                urgent_flag: 0,
            },
            probability,
            predicted_label: u8::from(probability > 0.5),
        }
    }
}

/// Held-out evaluation of a trained model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetrics {
    /// Unique id of the trained model
    pub model_id: String,
    /// Training timestamp (RFC 3339)
    pub trained_at: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Area under the ROC curve (0.0 when the test split has one class)
    pub auc_roc: f64,
    /// Share of synthesized positive labels across the whole batch
    pub positive_rate: f64,
    pub train_size: usize,
    pub test_size: usize,
}

/// Ensemble-averaged impurity decrease attributed to one feature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}
