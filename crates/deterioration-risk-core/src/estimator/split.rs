//! Stratified train/test split.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::{EstimatorError, EstimatorResult};

/// Row indices of each side of a split, ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split row indices so both sides keep the label proportions.
///
/// Test size is `ceil(test_fraction * n)`. Requires both classes, at least
/// two records of each, and at least two records on each side.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> EstimatorResult<TrainTestSplit> {
    let n = labels.len();
    let positives: Vec<usize> = (0..n).filter(|&i| labels[i] == 1).collect();
    let negatives: Vec<usize> = (0..n).filter(|&i| labels[i] != 1).collect();

    if positives.is_empty() || negatives.is_empty() {
        let label = u8::from(negatives.is_empty());
        return Err(EstimatorError::SingleClass { label, records: n });
    }
    for (label, members) in [(0u8, &negatives), (1u8, &positives)] {
        if members.len() < 2 {
            return Err(EstimatorError::InsufficientClassMembers {
                label,
                count: members.len(),
            });
        }
    }

    // Guard against 0.2 * 10 landing a hair above 2.0
    let n_test = ((test_fraction * n as f64) - 1e-9).ceil().max(0.0) as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test < 2 || n_train < 2 {
        return Err(EstimatorError::InsufficientSamples { records: n });
    }

    let (n_pos, n_neg) = (positives.len(), negatives.len());
    let mut test_pos = ((n_test * n_pos) as f64 / n as f64).round() as usize;
    test_pos = test_pos.clamp(1, (n_pos - 1).min(n_test - 1));
    let mut test_neg = n_test - test_pos;
    if test_neg > n_neg - 1 {
        test_neg = n_neg - 1;
        test_pos = n_test - test_neg;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n_train);
    let mut test = Vec::with_capacity(n_test);

    for (mut members, take) in [(negatives, test_neg), (positives, test_pos)] {
        members.shuffle(&mut rng);
        test.extend_from_slice(&members[..take]);
        train.extend_from_slice(&members[take..]);
    }

    train.sort_unstable();
    test.sort_unstable();

    Ok(TrainTestSplit { train, test })
}
