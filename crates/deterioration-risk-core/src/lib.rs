//! Deterioration Risk Core Library
//!
//! Estimates the probability that a patient waiting on an unscheduled
//! referral deteriorates, and projects the operational and financial impact
//! over a batch.
//!
//! # Architecture
//!
//! ```text
//! ReferralRecord batch
//!         │
//!         ▼
//!  Feature Builder ──────────────┐ (training only)
//!         │                      ▼
//!         │               Label Source
//!         │                      │
//!         ▼                      ▼
//!   TrainedModel ◄──── Stratified Split + Random Forest
//!         │
//!         ▼                 ┌──────────────────────────┐
//!   ScoredRecord batch ───► │        Aggregator        │ ◄── rule-based fallback
//!                           │ bands · horizons · costs │     (classifier unavailable)
//!                           └────────────┬─────────────┘
//!                                        ▼
//!                               AggregateProjection
//! ```
//!
//! # Core Principle
//!
//! **Bad data degrades, it never fails.** Missing or malformed referral fields
//! map to documented defaults. Only an untrainable batch (one class after
//! labelling) is an error.
//!
//! # Modules
//!
//! - [`models`]: Domain types (ReferralRecord, FeatureVector, ScoredRecord, etc.)
//! - [`config`]: Estimator configuration (JSON/TOML)
//! - [`features`]: Feature Builder
//! - [`labels`]: Training label sources (heuristic synthesizer, recorded outcomes)
//! - [`forest`]: Decision trees, random forest, classification metrics
//! - [`estimator`]: Training, scoring and the shared model handle
//! - [`projection`]: Aggregator and rule-based fallback

pub mod config;
pub mod estimator;
pub mod features;
pub mod forest;
pub mod labels;
pub mod models;
pub mod projection;

// Re-export commonly used types
pub use config::EstimatorConfig;
pub use estimator::{train, EstimatorError, ModelHandle, ModelState, TrainedModel};
pub use features::{build_features, FeatureBuilder};
pub use labels::{synthesize_labels, HeuristicLabeler, LabelSource, RecordedOutcomes};
pub use models::{
    AggregateProjection, FeatureVector, ModelMetrics, ReferralRecord, RiskLevel, ScoredRecord,
    SpecialtyMap,
};
pub use projection::{aggregate, rule_based_projection, RiskProjector};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum RiskEstimatorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Precondition failed: {0}")]
    PreconditionError(String),

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<config::ConfigError> for RiskEstimatorError {
    fn from(e: config::ConfigError) -> Self {
        RiskEstimatorError::ConfigError(e.to_string())
    }
}

impl From<EstimatorError> for RiskEstimatorError {
    fn from(e: EstimatorError) -> Self {
        if e.is_precondition() {
            RiskEstimatorError::PreconditionError(e.to_string())
        } else {
            RiskEstimatorError::ClassifierUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for RiskEstimatorError {
    fn from(e: serde_json::Error) -> Self {
        RiskEstimatorError::SerializationError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Create an estimator. `config_json` may be omitted to use defaults.
#[uniffi::export]
pub fn open_estimator(config_json: Option<String>) -> Result<Arc<RiskEstimatorCore>, RiskEstimatorError> {
    let config = match config_json {
        Some(json) => EstimatorConfig::from_json_str(&json)?,
        None => EstimatorConfig::default(),
    };
    Ok(Arc::new(RiskEstimatorCore {
        handle: Arc::new(ModelHandle::new(config)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe estimator wrapper for FFI.
#[derive(uniffi::Object)]
pub struct RiskEstimatorCore {
    handle: Arc<ModelHandle>,
}

#[uniffi::export]
impl RiskEstimatorCore {
    // =========================================================================
    // Model Lifecycle
    // =========================================================================

    /// Train on a batch with synthesized labels, replacing any current model.
    pub fn train(&self, records: Vec<FfiReferral>) -> Result<FfiModelMetrics, RiskEstimatorError> {
        let records = into_records(records);
        let metrics = self.handle.train(&records)?;
        Ok(metrics.into())
    }

    /// Whether a model is installed.
    pub fn is_trained(&self) -> Result<bool, RiskEstimatorError> {
        Ok(self.handle.state()? == ModelState::Trained)
    }

    /// Metrics of the installed model.
    pub fn metrics(&self) -> Result<Option<FfiModelMetrics>, RiskEstimatorError> {
        let model = self.handle.current()?;
        Ok(model.map(|m| m.metrics().clone().into()))
    }

    /// Feature importances of the installed model (empty when untrained).
    pub fn feature_importances(&self) -> Result<Vec<FfiFeatureImportance>, RiskEstimatorError> {
        let model = self.handle.current()?;
        Ok(model
            .map(|m| {
                m.feature_importances()
                    .iter()
                    .map(|fi| FfiFeatureImportance {
                        feature: fi.feature.clone(),
                        importance: fi.importance,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Drop the installed model.
    pub fn reset(&self) -> Result<(), RiskEstimatorError> {
        Ok(self.handle.reset()?)
    }

    // =========================================================================
    // Scoring
    // =========================================================================

    /// Score each referral.
    pub fn predict(&self, records: Vec<FfiReferral>) -> Result<Vec<FfiScoredRecord>, RiskEstimatorError> {
        let records = into_records(records);
        let scored = self.handle.predict(&records)?;
        Ok(scored.into_iter().map(|s| s.into()).collect())
    }

    /// Project a batch. Falls back to rules when the model is unavailable.
    pub fn project(&self, records: Vec<FfiReferral>) -> FfiProjection {
        let records = into_records(records);
        RiskProjector::new(&self.handle).project(&records).into()
    }

    /// Project a batch and return the projection as JSON.
    pub fn project_json(&self, records: Vec<FfiReferral>) -> Result<String, RiskEstimatorError> {
        let records = into_records(records);
        let projection = RiskProjector::new(&self.handle).project(&records);
        Ok(projection.to_json()?)
    }
}

fn into_records(records: Vec<FfiReferral>) -> Vec<ReferralRecord> {
    records.into_iter().map(|r| r.into()).collect()
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe referral.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiReferral {
    pub risk_level: Option<String>,
    pub specialty: Option<String>,
    pub age_band: Option<String>,
    pub status_text: Option<String>,
    pub wait_days: Option<i64>,
    /// ISO date (YYYY-MM-DD); unparseable dates are ignored
    pub requested_on: Option<String>,
}

impl From<FfiReferral> for ReferralRecord {
    fn from(r: FfiReferral) -> Self {
        ReferralRecord {
            risk_level: r.risk_level.as_deref().map(RiskLevel::parse).unwrap_or_default(),
            specialty: r.specialty,
            age_band: r.age_band,
            status_text: r.status_text,
            wait_days: r.wait_days,
            requested_on: r
                .requested_on
                .as_deref()
                .and_then(|d| chrono::NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok()),
        }
    }
}

/// FFI-safe scored referral.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScoredRecord {
    pub specialty: Option<String>,
    pub risk_level: String,
    pub probability: f64,
    pub predicted_label: u8,
}

impl From<ScoredRecord> for FfiScoredRecord {
    fn from(s: ScoredRecord) -> Self {
        Self {
            specialty: s.specialty,
            risk_level: s.risk_level.to_string(),
            probability: s.probability,
            predicted_label: s.predicted_label,
        }
    }
}

/// FFI-safe model metrics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiModelMetrics {
    pub model_id: String,
    pub trained_at: String,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc_roc: f64,
    pub positive_rate: f64,
    pub train_size: u64,
    pub test_size: u64,
}

impl From<ModelMetrics> for FfiModelMetrics {
    fn from(m: ModelMetrics) -> Self {
        Self {
            model_id: m.model_id,
            trained_at: m.trained_at,
            accuracy: m.accuracy,
            precision: m.precision,
            recall: m.recall,
            f1: m.f1,
            auc_roc: m.auc_roc,
            positive_rate: m.positive_rate,
            train_size: m.train_size as u64,
            test_size: m.test_size as u64,
        }
    }
}

/// FFI-safe feature importance.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiFeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// FFI-safe specialty summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSpecialtyRisk {
    pub specialty: String,
    pub total: u64,
    pub mean_probability: Option<f64>,
    pub high_count: u64,
}

/// FFI-safe projection.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiProjection {
    pub total: u64,
    pub high_count: u64,
    pub medium_count: u64,
    pub low_count: u64,
    pub deterioration_30d: u64,
    pub deterioration_60d: u64,
    pub deterioration_90d: u64,
    pub hospitalizations: u64,
    pub cost_30d: u64,
    pub cost_total: u64,
    pub mean_probability: Option<f64>,
    pub top_specialties: Vec<FfiSpecialtyRisk>,
    pub used_ml: bool,
    pub method: String,
    pub fallback_reason: Option<String>,
    pub metrics: Option<FfiModelMetrics>,
}

impl From<AggregateProjection> for FfiProjection {
    fn from(p: AggregateProjection) -> Self {
        Self {
            total: p.total,
            high_count: p.high_count,
            medium_count: p.medium_count,
            low_count: p.low_count,
            deterioration_30d: p.deterioration_30d,
            deterioration_60d: p.deterioration_60d,
            deterioration_90d: p.deterioration_90d,
            hospitalizations: p.hospitalizations,
            cost_30d: p.cost_30d,
            cost_total: p.cost_total,
            mean_probability: p.mean_probability,
            top_specialties: p
                .top_specialties
                .into_iter()
                .map(|s| FfiSpecialtyRisk {
                    specialty: s.specialty,
                    total: s.total,
                    mean_probability: s.mean_probability,
                    high_count: s.high_count,
                })
                .collect(),
            used_ml: p.used_ml,
            method: format!("{:?}", p.method),
            fallback_reason: p.fallback_reason,
            metrics: p.metrics.map(|m| m.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_referral(risk: &str, wait_days: i64) -> FfiReferral {
        FfiReferral {
            risk_level: Some(risk.into()),
            specialty: Some("CARDIOLOGIA".into()),
            age_band: Some("50 a 59".into()),
            status_text: None,
            wait_days: Some(wait_days),
            requested_on: None,
        }
    }

    #[test]
    fn test_ffi_referral_conversion() {
        let mut ffi = ffi_referral("amarelo", 12);
        ffi.requested_on = Some("2024-02-29".into());
        let record: ReferralRecord = ffi.into();
        assert_eq!(record.risk_level, RiskLevel::Yellow);
        assert_eq!(record.requested_on, chrono::NaiveDate::from_ymd_opt(2024, 2, 29));

        let mut bad_date = ffi_referral("x", 1);
        bad_date.requested_on = Some("29/02/2024".into());
        let record: ReferralRecord = bad_date.into();
        assert_eq!(record.risk_level, RiskLevel::Unknown);
        assert_eq!(record.requested_on, None);
    }

    #[test]
    fn test_open_estimator_rejects_bad_config() {
        assert!(matches!(
            open_estimator(Some("{\"split\": {\"test_fraction\": 0}}".into())),
            Err(RiskEstimatorError::ConfigError(_))
        ));
        assert!(open_estimator(None).is_ok());
    }

    #[test]
    fn test_untrained_core_projects_with_rules() {
        let core = open_estimator(None).unwrap();
        assert!(!core.is_trained().unwrap());
        assert!(core.metrics().unwrap().is_none());
        assert!(core.feature_importances().unwrap().is_empty());

        let projection = core.project(vec![ffi_referral("VERMELHO", 10), ffi_referral("AZUL", 10)]);
        assert!(!projection.used_ml);
        assert_eq!(projection.method, "RuleBased");
        assert_eq!(projection.total, 2);

        assert!(matches!(
            core.predict(vec![ffi_referral("VERMELHO", 10)]),
            Err(RiskEstimatorError::ClassifierUnavailable(_))
        ));
    }

    #[test]
    fn test_single_class_training_is_precondition_error() {
        let core = open_estimator(None).unwrap();
        let records = (0..20).map(|_| ffi_referral("VERMELHO", 1000)).collect();
        assert!(matches!(
            core.train(records),
            Err(RiskEstimatorError::PreconditionError(_))
        ));
        assert!(!core.is_trained().unwrap());
    }
}
