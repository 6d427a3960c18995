//! Feature vector and specialty encoding models.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Number of numeric features per record.
pub const FEATURE_COUNT: usize = 5;

/// Feature names, in column order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "risk_score",
    "wait_days",
    "age_estimate",
    "specialty_code",
    "urgent_flag",
];

/// Name of the reserved bucket for missing or unseen specialties.
pub const UNKNOWN_SPECIALTY: &str = "UNKNOWN";

/// Code of the reserved UNKNOWN bucket.
pub const UNKNOWN_SPECIALTY_CODE: u32 = 0;

/// Fixed-width numeric encoding of one referral.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeatureVector {
    /// Ordinal risk (RED=4 .. BLUE=1, unknown=0)
    pub risk_score: u8,
    /// Days waiting, never negative
    pub wait_days: u32,
    /// Age extracted from the age band (default 40)
    pub age_estimate: u32,
    /// Specialty id from the [`SpecialtyMap`]
    pub specialty_code: u32,
    /// 1 when the status text carries an urgency keyword
    pub urgent_flag: u8,
}

impl FeatureVector {
    /// Feature values in [`FEATURE_NAMES`] order.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            f64::from(self.risk_score),
            f64::from(self.wait_days),
            f64::from(self.age_estimate),
            f64::from(self.specialty_code),
            f64::from(self.urgent_flag),
        ]
    }
}

/// Specialty → integer id mapping.
///
/// Id 0 is reserved for [`UNKNOWN_SPECIALTY`]; observed specialties get ids
/// 1..=n in lexical order, so the same set of values always yields the same map.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecialtyMap {
    codes: BTreeMap<String, u32>,
}

impl SpecialtyMap {
    /// Build a map from the distinct specialty values observed.
    pub fn from_specialties<'a, I>(specialties: I) -> Self
    where
        I: IntoIterator<Item = Option<&'a str>>,
    {
        let distinct: BTreeSet<&str> = specialties
            .into_iter()
            .filter_map(known_specialty)
            .collect();

        let codes = distinct
            .into_iter()
            .zip(1u32..)
            .map(|(name, code)| (name.to_string(), code))
            .collect();

        Self { codes }
    }

    /// Encode a specialty; missing, blank, or unseen values map to the UNKNOWN code.
    pub fn encode(&self, specialty: Option<&str>) -> u32 {
        known_specialty(specialty)
            .and_then(|name| self.codes.get(name).copied())
            .unwrap_or(UNKNOWN_SPECIALTY_CODE)
    }

    /// Reverse lookup of a code.
    pub fn decode(&self, code: u32) -> Option<&str> {
        if code == UNKNOWN_SPECIALTY_CODE {
            return Some(UNKNOWN_SPECIALTY);
        }
        self.codes
            .iter()
            .find(|(_, c)| **c == code)
            .map(|(name, _)| name.as_str())
    }

    /// Whether a specialty was observed when the map was built.
    pub fn contains(&self, specialty: &str) -> bool {
        self.codes.contains_key(specialty)
    }

    /// Number of known specialties (excluding the UNKNOWN bucket).
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Iterate over `(specialty, code)` pairs in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        let mut pairs: Vec<(&str, u32)> =
            self.codes.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        pairs.sort_by_key(|&(_, code)| code);
        pairs.into_iter()
    }
}

/// A specialty counts as known when it is non-blank and not the UNKNOWN label.
fn known_specialty(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty() && *s != UNKNOWN_SPECIALTY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_reserves_unknown() {
        let map = SpecialtyMap::from_specialties(vec![
            Some("ORTOPEDIA"),
            Some("CARDIOLOGIA"),
            None,
            Some("  "),
            Some("CARDIOLOGIA"),
        ]);

        assert_eq!(map.len(), 2);
        assert_eq!(map.encode(Some("CARDIOLOGIA")), 1);
        assert_eq!(map.encode(Some("ORTOPEDIA")), 2);
        assert_eq!(map.encode(None), UNKNOWN_SPECIALTY_CODE);
        assert_eq!(map.encode(Some("")), UNKNOWN_SPECIALTY_CODE);
        assert_eq!(map.encode(Some("NEUROLOGIA")), UNKNOWN_SPECIALTY_CODE);
    }

    #[test]
    fn test_decode_reverse_lookup() {
        let map = SpecialtyMap::from_specialties(vec![Some("A"), Some("B")]);

        assert_eq!(map.decode(0), Some(UNKNOWN_SPECIALTY));
        assert_eq!(map.decode(map.encode(Some("B"))), Some("B"));
        assert_eq!(map.decode(42), None);

        let pairs: Vec<_> = map.iter().collect();
        assert_eq!(pairs, vec![("A", 1), ("B", 2)]);
    }

    #[test]
    fn test_feature_array_order() {
        let fv = FeatureVector {
            risk_score: 4,
            wait_days: 30,
            age_estimate: 65,
            specialty_code: 2,
            urgent_flag: 1,
        };
        assert_eq!(fv.to_array(), [4.0, 30.0, 65.0, 2.0, 1.0]);
    }
}
