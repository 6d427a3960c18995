//! Property tests for feature encoding and projection arithmetic.

use proptest::prelude::*;

use deterioration_risk_core::features::{build_features, extract_age, is_urgent};
use deterioration_risk_core::models::{
    ReferralRecord, RiskLevel, ScoredRecord, SpecialtyMap, UNKNOWN_SPECIALTY,
    UNKNOWN_SPECIALTY_CODE,
};
use deterioration_risk_core::projection::aggregate;

fn risk_level() -> impl Strategy<Value = RiskLevel> {
    prop_oneof![
        Just(RiskLevel::Red),
        Just(RiskLevel::Yellow),
        Just(RiskLevel::Green),
        Just(RiskLevel::Blue),
        Just(RiskLevel::Unknown),
    ]
}

fn referral() -> impl Strategy<Value = ReferralRecord> {
    (
        risk_level(),
        proptest::option::of("[A-Z]{3,10}"),
        proptest::option::of("[a-z ]{0,6}[0-9]{0,3}[a-z ]{0,6}"),
        proptest::option::of(-30i64..400),
    )
        .prop_map(|(risk, specialty, age_band, wait_days)| {
            let mut record = ReferralRecord::new(risk);
            record.specialty = specialty;
            record.age_band = age_band;
            record.wait_days = wait_days;
            record
        })
}

proptest! {
    #[test]
    fn prop_one_vector_per_record(records in proptest::collection::vec(referral(), 0..60)) {
        let batch = build_features(&records, None);
        prop_assert_eq!(batch.features.len(), records.len());

        for (record, fv) in records.iter().zip(&batch.features) {
            prop_assert_eq!(fv.risk_score, record.risk_level.score());
            prop_assert!(fv.urgent_flag <= 1);
            if let Some(days) = record.wait_days {
                prop_assert_eq!(i64::from(fv.wait_days), days.max(0));
            }
        }
    }

    #[test]
    fn prop_specialty_codes_round_trip(records in proptest::collection::vec(referral(), 1..60)) {
        let batch = build_features(&records, None);

        for (record, fv) in records.iter().zip(&batch.features) {
            let decoded = batch.specialty_map.decode(fv.specialty_code);
            match record.specialty.as_deref() {
                Some(name) => prop_assert_eq!(decoded, Some(name)),
                None => {
                    prop_assert_eq!(fv.specialty_code, UNKNOWN_SPECIALTY_CODE);
                    prop_assert_eq!(decoded, Some(UNKNOWN_SPECIALTY));
                }
            }
        }
    }

    #[test]
    fn prop_unseen_specialty_is_unknown(
        known in proptest::collection::vec("[A-M]{4,8}", 1..10),
        unseen in "[N-Z]{4,8}",
    ) {
        let map = SpecialtyMap::from_specialties(known.iter().map(|s| Some(s.as_str())));
        prop_assert_eq!(map.encode(Some(&unseen)), UNKNOWN_SPECIALTY_CODE);
        for name in &known {
            prop_assert_ne!(map.encode(Some(name)), UNKNOWN_SPECIALTY_CODE);
        }
    }

    #[test]
    fn prop_digitless_age_band_uses_default(band in "[a-zA-Z ]{0,20}", default_age in 0u32..120) {
        prop_assert_eq!(extract_age(Some(&band), default_age), default_age);
    }

    #[test]
    fn prop_age_band_leading_number(age in 0u32..130, suffix in "[a-z ]{0,12}") {
        let band = format!("{} {}", age, suffix);
        prop_assert_eq!(extract_age(Some(&band), 40), age);
    }

    #[test]
    fn prop_urgency_is_case_insensitive(prefix in "[a-z ]{0,8}", suffix in "[a-z ]{0,8}") {
        let text = format!("{}urgent{}", prefix, suffix);
        prop_assert!(is_urgent(Some(&text)));
    }

    #[test]
    fn prop_bands_partition_total(probabilities in proptest::collection::vec(0.0f64..=1.0, 0..200)) {
        let scored: Vec<ScoredRecord> = probabilities
            .iter()
            .map(|&p| ScoredRecord::from_probability(None, p))
            .collect();
        let projection = aggregate(&scored);

        prop_assert_eq!(projection.total, scored.len() as u64);
        prop_assert_eq!(
            projection.high_count + projection.medium_count + projection.low_count,
            projection.total
        );
        prop_assert!(projection.total_deteriorations() <= projection.total);
        prop_assert!(projection.hospitalizations <= projection.total_deteriorations());
        prop_assert!(projection.cost_30d <= projection.cost_total);
    }

    #[test]
    fn prop_all_high_projects_ninety_percent(n in 0usize..500) {
        let scored: Vec<ScoredRecord> = (0..n)
            .map(|_| ScoredRecord::from_probability(None, 0.9))
            .collect();
        let projection = aggregate(&scored);

        prop_assert_eq!(projection.high_count, n as u64);
        prop_assert_eq!(projection.deterioration_30d, (n as u64 * 9) / 10);
        prop_assert_eq!(projection.deterioration_60d, 0);
        prop_assert_eq!(projection.deterioration_90d, 0);
    }
}
