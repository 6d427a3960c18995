//! Aggregator: operational and financial projections over a batch.
//!
//! Pipeline: ModelHandle → TrainedModel::predict → aggregate
//!                └── (classifier unavailable) → rule_based_projection
//!
//! Both paths return the same [`AggregateProjection`] shape; `used_ml` tells
//! them apart.

mod rules;
mod scored;

pub use rules::*;
pub use scored::{aggregate, aggregate_with, RiskBand};

use log::warn;

use crate::estimator::{EstimatorError, EstimatorResult, ModelHandle};
use crate::models::{AggregateProjection, ReferralRecord};

/// Projects referral batches through a shared [`ModelHandle`].
pub struct RiskProjector<'a> {
    handle: &'a ModelHandle,
}

impl<'a> RiskProjector<'a> {
    pub fn new(handle: &'a ModelHandle) -> Self {
        Self { handle }
    }

    /// Project a batch, falling back to rules on any estimator failure.
    ///
    /// Never fails. The fallback reason is recorded on the projection.
    pub fn project(&self, records: &[ReferralRecord]) -> AggregateProjection {
        match self.ml_projection(records) {
            Ok(projection) => projection,
            Err(e) => self.fallback(records, &e),
        }
    }

    /// Project a batch, falling back to rules only when the classifier is
    /// unavailable. Precondition failures of implicit training propagate.
    pub fn try_project(&self, records: &[ReferralRecord]) -> EstimatorResult<AggregateProjection> {
        match self.ml_projection(records) {
            Ok(projection) => Ok(projection),
            Err(e) if e.is_precondition() => Err(e),
            Err(e) => Ok(self.fallback(records, &e)),
        }
    }

    fn ml_projection(&self, records: &[ReferralRecord]) -> EstimatorResult<AggregateProjection> {
        let params = &self.handle.config().projection;

        if records.is_empty() {
            let mut projection = aggregate_with(&[], params);
            projection.metrics = self.handle.current()?.map(|m| m.metrics().clone());
            return Ok(projection);
        }

        let model = self.handle.model_for(records)?;
        let scored = model.predict(records);

        let mut projection = aggregate_with(&scored, params);
        projection.metrics = Some(model.metrics().clone());
        Ok(projection)
    }

    fn fallback(&self, records: &[ReferralRecord], reason: &EstimatorError) -> AggregateProjection {
        warn!(
            "ML projection unavailable ({}); using rule-based projection for {} records",
            reason,
            records.len()
        );
        let mut projection = rule_based_projection(records, &self.handle.config().projection);
        projection.fallback_reason = Some(reason.to_string());
        projection
    }
}
