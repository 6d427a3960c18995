//! Deterioration classifier: training, scoring and the shared model slot.
//!
//! Pipeline: Feature Builder → Label Source → Stratified Split → Random Forest → Metrics
//!
//! [`train`] returns a plain [`TrainedModel`] value that callers pass around.
//! [`ModelHandle`] is the optional shared cache for callers that want one
//! process-wide model (UNTRAINED → TRAINED).

mod handle;
mod model;
mod split;

pub use handle::*;
pub use model::*;
pub use split::*;

use thiserror::Error;

use crate::forest::ForestError;

/// Estimator errors.
#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Stratified split needs both classes, but all {records} labels are {label}")]
    SingleClass { label: u8, records: usize },

    #[error("Stratified split needs at least 2 records per class, class {label} has {count}")]
    InsufficientClassMembers { label: u8, count: usize },

    #[error("Too few records to split: {records}")]
    InsufficientSamples { records: usize },

    #[error("Label source returned {labels} labels for {records} records")]
    LabelCountMismatch { records: usize, labels: usize },

    #[error("Classifier unavailable: {0}")]
    ClassifierUnavailable(#[from] ForestError),

    #[error("Model is not trained and auto-training is disabled")]
    NotTrained,

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl EstimatorError {
    /// True for errors caused by the training batch itself, which callers
    /// must fix rather than work around.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            EstimatorError::SingleClass { .. }
                | EstimatorError::InsufficientClassMembers { .. }
                | EstimatorError::InsufficientSamples { .. }
                | EstimatorError::LabelCountMismatch { .. }
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for EstimatorError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        EstimatorError::LockPoisoned(e.to_string())
    }
}

pub type EstimatorResult<T> = Result<T, EstimatorError>;
