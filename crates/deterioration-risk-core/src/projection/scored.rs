//! Projection from model probabilities.

use std::collections::BTreeMap;

use crate::config::ProjectionParams;
use crate::models::{
    AggregateProjection, ProjectionMethod, ScoredRecord, SpecialtyRisk, UNKNOWN_SPECIALTY,
};

/// Probability band of a scored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// Above `high_threshold`
    High,
    /// Above `medium_threshold`, up to and including `high_threshold`
    Medium,
    /// Up to and including `medium_threshold`
    Low,
}

impl RiskBand {
    pub fn of(probability: f64, params: &ProjectionParams) -> Self {
        if probability > params.high_threshold {
            RiskBand::High
        } else if probability > params.medium_threshold {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

/// Aggregate a scored batch with default thresholds, rates and costs.
pub fn aggregate(scored: &[ScoredRecord]) -> AggregateProjection {
    aggregate_with(scored, &ProjectionParams::default())
}

/// Aggregate a scored batch.
///
/// Horizon projections: 30 days from the high band, 60 from medium, 90 from
/// low, each a floored percentage. An empty batch projects all zeros.
pub fn aggregate_with(scored: &[ScoredRecord], params: &ProjectionParams) -> AggregateProjection {
    let mut high = 0u64;
    let mut medium = 0u64;
    let mut low = 0u64;
    let mut probability_sum = 0.0;

    let mut groups: BTreeMap<&str, SpecialtyAccumulator> = BTreeMap::new();

    for record in scored {
        let band = RiskBand::of(record.probability, params);
        match band {
            RiskBand::High => high += 1,
            RiskBand::Medium => medium += 1,
            RiskBand::Low => low += 1,
        }
        probability_sum += record.probability;

        let group = groups.entry(specialty_key(record.specialty.as_deref())).or_default();
        group.total += 1;
        group.probability_sum += record.probability;
        if band == RiskBand::High {
            group.high += 1;
        }
    }

    let mut top_specialties: Vec<SpecialtyRisk> = groups
        .into_iter()
        .map(|(specialty, acc)| SpecialtyRisk {
            specialty: specialty.to_string(),
            total: acc.total,
            mean_probability: Some(acc.probability_sum / acc.total as f64),
            high_count: acc.high,
        })
        .collect();
    top_specialties.sort_by(|a, b| {
        let (pa, pb) = (a.mean_probability.unwrap_or(0.0), b.mean_probability.unwrap_or(0.0));
        pb.total_cmp(&pa).then_with(|| a.specialty.cmp(&b.specialty))
    });
    top_specialties.truncate(params.top_n);

    let mean_probability = if scored.is_empty() {
        None
    } else {
        Some(probability_sum / scored.len() as f64)
    };

    let horizons = Horizons {
        d30: percent_of(high, params.high_30d_pct),
        d60: percent_of(medium, params.medium_60d_pct),
        d90: percent_of(low, params.low_90d_pct),
    };

    horizons.into_projection(
        BandCounts { high, medium, low },
        params,
        top_specialties,
        mean_probability,
        ProjectionMethod::RandomForest,
    )
}

#[derive(Default)]
struct SpecialtyAccumulator {
    total: u64,
    probability_sum: f64,
    high: u64,
}

/// Band sizes of a projection.
pub(super) struct BandCounts {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

/// Projected deteriorations per horizon.
pub(super) struct Horizons {
    pub d30: u64,
    pub d60: u64,
    pub d90: u64,
}

impl Horizons {
    /// Derive hospitalizations and costs and assemble the projection.
    pub(super) fn into_projection(
        self,
        bands: BandCounts,
        params: &ProjectionParams,
        top_specialties: Vec<SpecialtyRisk>,
        mean_probability: Option<f64>,
        method: ProjectionMethod,
    ) -> AggregateProjection {
        let deteriorations = self.d30 + self.d60 + self.d90;

        AggregateProjection {
            total: bands.high + bands.medium + bands.low,
            high_count: bands.high,
            medium_count: bands.medium,
            low_count: bands.low,
            deterioration_30d: self.d30,
            deterioration_60d: self.d60,
            deterioration_90d: self.d90,
            hospitalizations: percent_of(deteriorations, params.hospitalization_pct),
            cost_30d: params.unit_cost.saturating_mul(self.d30),
            cost_total: params.unit_cost.saturating_mul(deteriorations),
            mean_probability,
            top_specialties,
            used_ml: method == ProjectionMethod::RandomForest,
            method,
            fallback_reason: None,
            metrics: None,
        }
    }
}

/// floor(count * pct / 100)
pub(super) fn percent_of(count: u64, pct: u64) -> u64 {
    count.saturating_mul(pct) / 100
}

/// Grouping key: the specialty, or UNKNOWN when missing or blank.
pub(super) fn specialty_key(specialty: Option<&str>) -> &str {
    specialty
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(UNKNOWN_SPECIALTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(specialty: &str, probability: f64) -> ScoredRecord {
        ScoredRecord::from_probability(Some(specialty.to_string()), probability)
    }

    #[test]
    fn test_band_boundaries() {
        let params = ProjectionParams::default();
        assert_eq!(RiskBand::of(0.71, &params), RiskBand::High);
        assert_eq!(RiskBand::of(0.7, &params), RiskBand::Medium);
        assert_eq!(RiskBand::of(0.41, &params), RiskBand::Medium);
        assert_eq!(RiskBand::of(0.4, &params), RiskBand::Low);
        assert_eq!(RiskBand::of(0.0, &params), RiskBand::Low);
    }

    #[test]
    fn test_empty_batch() {
        let projection = aggregate(&[]);

        assert_eq!(projection.total, 0);
        assert_eq!(projection.high_count + projection.medium_count + projection.low_count, 0);
        assert_eq!(projection.total_deteriorations(), 0);
        assert_eq!(projection.hospitalizations, 0);
        assert_eq!(projection.cost_30d, 0);
        assert_eq!(projection.cost_total, 0);
        assert!(projection.top_specialties.is_empty());
        assert_eq!(projection.mean_probability, None);
        assert!(projection.used_ml);
    }

    #[test]
    fn test_projection_arithmetic() {
        // 10 high, 6 medium, 25 low
        let mut batch = Vec::new();
        batch.extend((0..10).map(|_| scored("CARDIOLOGIA", 0.9)));
        batch.extend((0..6).map(|_| scored("ORTOPEDIA", 0.5)));
        batch.extend((0..25).map(|_| scored("DERMATOLOGIA", 0.1)));

        let projection = aggregate(&batch);

        assert_eq!(projection.total, 41);
        assert_eq!(projection.high_count, 10);
        assert_eq!(projection.medium_count, 6);
        assert_eq!(projection.low_count, 25);
        assert_eq!(projection.deterioration_30d, 9);
        assert_eq!(projection.deterioration_60d, 3);
        assert_eq!(projection.deterioration_90d, 2);
        // floor(0.3 * 14)
        assert_eq!(projection.hospitalizations, 4);
        assert_eq!(projection.cost_30d, 45_000);
        assert_eq!(projection.cost_total, 70_000);
    }

    #[test]
    fn test_specialty_ranking() {
        let batch = vec![
            scored("A", 0.2),
            scored("A", 0.4),
            scored("B", 0.9),
            scored("B", 0.8),
            scored("C", 0.5),
            ScoredRecord::from_probability(None, 0.6),
        ];

        let projection = aggregate(&batch);
        let ranking: Vec<(&str, u64, u64)> = projection
            .top_specialties
            .iter()
            .map(|s| (s.specialty.as_str(), s.total, s.high_count))
            .collect();

        assert_eq!(
            ranking,
            vec![("B", 2, 2), (UNKNOWN_SPECIALTY, 1, 0), ("C", 1, 0), ("A", 2, 0)]
        );
        assert!((projection.top_specialties[3].mean_probability.unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_truncated_to_top_n() {
        let batch: Vec<_> = (0..15)
            .map(|i| scored(&format!("S{:02}", i), i as f64 / 20.0))
            .collect();

        let projection = aggregate(&batch);
        assert_eq!(projection.top_specialties.len(), 10);
        assert_eq!(projection.top_specialties[0].specialty, "S14");
    }
}
