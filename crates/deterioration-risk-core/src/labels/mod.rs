//! Training label sources.
//!
//! The referral extract carries no outcome column, so training labels come
//! from a [`LabelSource`]. [`HeuristicLabeler`] synthesizes them from risk and
//! wait time; [`RecordedOutcomes`] replays outcomes observed elsewhere.
//!
//! Synthesized labels are a stand-in. They are not clinically validated outcomes.

mod heuristic;

pub use heuristic::*;

use crate::models::FeatureVector;

/// Supplies one 0/1 "deteriorated" outcome per feature vector.
pub trait LabelSource {
    /// Outcomes in the same order as `features`.
    fn labels(&self, features: &[FeatureVector]) -> Vec<u8>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Outcomes recorded by an external system, replayed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOutcomes {
    outcomes: Vec<u8>,
}

impl RecordedOutcomes {
    /// Non-zero values are treated as deteriorated.
    pub fn new(outcomes: Vec<u8>) -> Self {
        Self {
            outcomes: outcomes.into_iter().map(|o| u8::from(o != 0)).collect(),
        }
    }
}

impl LabelSource for RecordedOutcomes {
    fn labels(&self, features: &[FeatureVector]) -> Vec<u8> {
        self.outcomes.iter().copied().take(features.len()).collect()
    }

    fn name(&self) -> &str {
        "recorded"
    }
}
