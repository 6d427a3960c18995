//! Rule-based projection from risk levels alone.
//!
//! Used when no classifier is available. RED and YELLOW referrals count as
//! critical:
//!
//! ```text
//! 30 days = 80% of critical
//! 60 days = 50% of critical + 20% of GREEN
//! 90 days = 5% of BLUE
//! ```

use std::collections::BTreeMap;

use super::scored::{percent_of, specialty_key, BandCounts, Horizons};
use crate::config::ProjectionParams;
use crate::models::{AggregateProjection, ProjectionMethod, ReferralRecord, RiskLevel, SpecialtyRisk};

/// Project a batch without a model.
///
/// Bands follow the risk level: critical is high, GREEN is medium, the rest
/// (BLUE and unknown) is low. The specialty ranking orders by critical count.
pub fn rule_based_projection(records: &[ReferralRecord], params: &ProjectionParams) -> AggregateProjection {
    let rates = &params.fallback;

    let mut critical = 0u64;
    let mut green = 0u64;
    let mut blue = 0u64;
    let mut other = 0u64;
    let mut groups: BTreeMap<&str, (u64, u64)> = BTreeMap::new();

    for record in records {
        match record.risk_level {
            RiskLevel::Red | RiskLevel::Yellow => critical += 1,
            RiskLevel::Green => green += 1,
            RiskLevel::Blue => blue += 1,
            RiskLevel::Unknown => other += 1,
        }

        let (total, critical_count) = groups
            .entry(specialty_key(record.specialty.as_deref()))
            .or_insert((0, 0));
        *total += 1;
        if record.risk_level.is_critical() {
            *critical_count += 1;
        }
    }

    let mut top_specialties: Vec<SpecialtyRisk> = groups
        .into_iter()
        .map(|(specialty, (total, critical_count))| SpecialtyRisk {
            specialty: specialty.to_string(),
            total,
            mean_probability: None,
            high_count: critical_count,
        })
        .collect();
    top_specialties.sort_by(|a, b| {
        b.high_count
            .cmp(&a.high_count)
            .then_with(|| a.specialty.cmp(&b.specialty))
    });
    top_specialties.truncate(params.top_n);

    let horizons = Horizons {
        d30: percent_of(critical, rates.critical_30d_pct),
        d60: (critical.saturating_mul(rates.critical_60d_pct)
            + green.saturating_mul(rates.medium_60d_pct))
            / 100,
        d90: percent_of(blue, rates.low_90d_pct),
    };

    horizons.into_projection(
        BandCounts {
            high: critical,
            medium: green,
            low: blue + other,
        },
        params,
        top_specialties,
        None,
        ProjectionMethod::RuleBased,
    )
}
