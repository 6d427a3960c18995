//! Feature Builder.
//!
//! Turns raw referrals into fixed [`FeatureVector`]s. Malformed or missing
//! fields never fail; they degrade to documented defaults:
//! - unknown risk level → score 0
//! - age band without digits → `default_age` (40)
//! - missing or unseen specialty → UNKNOWN code 0
//! - missing wait time → request date difference, else a seeded simulation

mod wait_time;

pub use wait_time::*;

use log::debug;

use crate::config::{EstimatorConfig, FeatureParams};
use crate::models::{FeatureVector, ReferralRecord, SpecialtyMap};

/// Status keywords marking a referral as urgent (matched case-insensitively).
pub const URGENCY_KEYWORDS: [&str; 6] = ["CRITICAL", "URGENT", "SEVERE", "CRITICO", "CRÍTICO", "GRAVE"];

/// Features for a batch, with the specialty map used to encode them.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBatch {
    pub features: Vec<FeatureVector>,
    pub specialty_map: SpecialtyMap,
}

/// Builds feature vectors from referral records.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    params: FeatureParams,
    seed: u64,
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new(FeatureParams::default(), 42)
    }
}

impl FeatureBuilder {
    pub fn new(params: FeatureParams, seed: u64) -> Self {
        Self { params, seed }
    }

    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(config.features.clone(), config.seed)
    }

    /// Encode a batch.
    ///
    /// When `specialty_map` is `None` a map is derived from this batch;
    /// otherwise the given map is reused and unseen specialties encode as UNKNOWN.
    pub fn build(&self, records: &[ReferralRecord], specialty_map: Option<&SpecialtyMap>) -> FeatureBatch {
        let specialty_map = match specialty_map {
            Some(map) => map.clone(),
            None => SpecialtyMap::from_specialties(records.iter().map(|r| r.specialty.as_deref())),
        };

        let mut wait_times = WaitTimeResolver::new(
            self.params.reference_date,
            self.params.simulated_wait_min,
            self.params.simulated_wait_max,
            self.seed,
        );

        let features = records
            .iter()
            .map(|record| FeatureVector {
                risk_score: record.risk_level.score(),
                wait_days: wait_times.resolve(record),
                age_estimate: extract_age(record.age_band.as_deref(), self.params.default_age),
                specialty_code: specialty_map.encode(record.specialty.as_deref()),
                urgent_flag: u8::from(is_urgent(record.status_text.as_deref())),
            })
            .collect::<Vec<_>>();

        debug!(
            "Built {} feature vectors ({} specialties, {} simulated wait times)",
            features.len(),
            specialty_map.len(),
            wait_times.simulated_count()
        );

        FeatureBatch {
            features,
            specialty_map,
        }
    }
}

/// Encode a batch with default parameters.
pub fn build_features(records: &[ReferralRecord], specialty_map: Option<&SpecialtyMap>) -> FeatureBatch {
    FeatureBuilder::default().build(records, specialty_map)
}

/// Parse the first run of ASCII digits in an age band, falling back to `default_age`.
pub fn extract_age(age_band: Option<&str>, default_age: u32) -> u32 {
    let Some(band) = age_band else {
        return default_age;
    };

    let digits: String = band
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().unwrap_or(default_age)
}

/// Whether a status text contains any of the [`URGENCY_KEYWORDS`].
pub fn is_urgent(status_text: Option<&str>) -> bool {
    status_text.is_some_and(|text| {
        let upper = text.to_uppercase();
        URGENCY_KEYWORDS.iter().any(|kw| upper.contains(kw))
    })
}
