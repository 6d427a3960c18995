//! Risk/wait-time driven label synthesis.

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::LabelSource;
use crate::config::{EstimatorConfig, LabelParams};
use crate::models::{FeatureVector, RiskLevel};

/// Synthesizes outcomes with a seeded random process:
///
/// ```text
/// RED      0.70 + (wait/100) * 0.20
/// YELLOW   0.40 + (wait/150) * 0.20
/// GREEN    0.15 + (wait/200) * 0.10
/// BLUE     0.05 + (wait/250) * 0.05
/// unknown  0.10 + (wait/300) * 0.05
/// ```
///
/// Each base probability gets N(0, noise_std) noise, is clipped to [0, 1] and
/// drives one Bernoulli draw. The stream is seeded once per call.
#[derive(Debug, Clone)]
pub struct HeuristicLabeler {
    seed: u64,
    noise_std: f64,
}

impl Default for HeuristicLabeler {
    fn default() -> Self {
        Self::new(42, LabelParams::default())
    }
}

impl HeuristicLabeler {
    pub fn new(seed: u64, params: LabelParams) -> Self {
        Self {
            seed,
            noise_std: params.noise_std,
        }
    }

    pub fn from_config(config: &EstimatorConfig) -> Self {
        Self::new(config.seed, config.labels.clone())
    }
}

impl LabelSource for HeuristicLabeler {
    fn labels(&self, features: &[FeatureVector]) -> Vec<u8> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        let labels: Vec<u8> = features
            .iter()
            .map(|fv| {
                let base = base_probability(RiskLevel::from_score(fv.risk_score), fv.wait_days);
                let noise = standard_normal(&mut rng) * self.noise_std;
                let p = (base + noise).clamp(0.0, 1.0);
                u8::from(rng.gen::<f64>() < p)
            })
            .collect();

        if !labels.is_empty() {
            let positives = labels.iter().filter(|&&l| l == 1).count();
            debug!(
                "Synthesized {} labels, {:.1}% deteriorated",
                labels.len(),
                100.0 * positives as f64 / labels.len() as f64
            );
        }

        labels
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}

/// Synthesize labels with the default noise level.
pub fn synthesize_labels(features: &[FeatureVector], seed: u64) -> Vec<u8> {
    HeuristicLabeler::new(seed, LabelParams::default()).labels(features)
}

/// Deterioration probability before noise.
pub fn base_probability(risk: RiskLevel, wait_days: u32) -> f64 {
    let wait = f64::from(wait_days);
    match risk {
        RiskLevel::Red => 0.7 + (wait / 100.0) * 0.2,
        RiskLevel::Yellow => 0.4 + (wait / 150.0) * 0.2,
        RiskLevel::Green => 0.15 + (wait / 200.0) * 0.1,
        RiskLevel::Blue => 0.05 + (wait / 250.0) * 0.05,
        RiskLevel::Unknown => 0.1 + (wait / 300.0) * 0.05,
    }
}

/// Box-Muller draw from N(0, 1).
fn standard_normal(rng: &mut impl Rng) -> f64 {
    // 1 - [0, 1) keeps u1 away from zero
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(risk_score: u8, wait_days: u32) -> FeatureVector {
        FeatureVector {
            risk_score,
            wait_days,
            age_estimate: 40,
            specialty_code: 0,
            urgent_flag: 0,
        }
    }

    #[test]
    fn test_base_probabilities() {
        assert!((base_probability(RiskLevel::Red, 0) - 0.7).abs() < 1e-12);
        assert!((base_probability(RiskLevel::Red, 50) - 0.8).abs() < 1e-12);
        assert!((base_probability(RiskLevel::Yellow, 150) - 0.6).abs() < 1e-12);
        assert!((base_probability(RiskLevel::Green, 200) - 0.25).abs() < 1e-12);
        assert!((base_probability(RiskLevel::Blue, 250) - 0.1).abs() < 1e-12);
        assert!((base_probability(RiskLevel::Unknown, 300) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let features: Vec<_> = (0..200).map(|i| fv((i % 5) as u8, i * 3 % 120)).collect();

        let first = synthesize_labels(&features, 42);
        let second = synthesize_labels(&features, 42);

        assert_eq!(first.len(), features.len());
        assert_eq!(first, second);
        assert!(first.iter().all(|&l| l <= 1));
    }

    #[test]
    fn test_extreme_probabilities_are_certain() {
        // Base probability far above 1 clips to 1 even with noise
        let certain: Vec<_> = (0..50).map(|_| fv(4, 1000)).collect();
        assert!(synthesize_labels(&certain, 7).iter().all(|&l| l == 1));

        // Without noise, a BLUE record waiting 0 days is positive ~5% of the time
        let labeler = HeuristicLabeler::new(7, LabelParams { noise_std: 0.0 });
        let low: Vec<_> = (0..1000).map(|_| fv(1, 0)).collect();
        let positives = labeler.labels(&low).iter().filter(|&&l| l == 1).count();
        assert!(positives < 150, "got {} positives", positives);
    }

    #[test]
    fn test_red_labels_dominate_blue() {
        let red: Vec<_> = (0..500).map(|_| fv(4, 60)).collect();
        let blue: Vec<_> = (0..500).map(|_| fv(1, 60)).collect();

        let red_pos = synthesize_labels(&red, 1).iter().filter(|&&l| l == 1).count();
        let blue_pos = synthesize_labels(&blue, 1).iter().filter(|&&l| l == 1).count();

        assert!(red_pos > 350);
        assert!(blue_pos < 150);
    }
}
