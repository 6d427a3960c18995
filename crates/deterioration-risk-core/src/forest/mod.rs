//! Bagged decision-tree ensemble.
//!
//! Each tree is grown on a bootstrap resample with a random feature subset
//! tried at every split. Probabilities average the trees' leaf class-1
//! fractions; predictions are a hard majority vote.

mod metrics;
mod tree;

pub use metrics::*;
pub use tree::*;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::config::ForestParams;

/// Ensemble errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForestError {
    #[error("Invalid forest parameters: {0}")]
    InvalidParams(String),

    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Row {row} has {found} features, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("{rows} rows but {labels} labels")]
    LabelCountMismatch { rows: usize, labels: usize },
}

pub type ForestResult<T> = Result<T, ForestError>;

/// A fitted random forest classifier for 0/1 targets.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit `params.n_trees` trees. Fitting is deterministic for a given seed.
    pub fn fit(x: &[Vec<f64>], y: &[u8], params: &ForestParams, seed: u64) -> ForestResult<Self> {
        validate_params(params)?;

        if x.is_empty() {
            return Err(ForestError::EmptyTrainingSet);
        }
        if x.len() != y.len() {
            return Err(ForestError::LabelCountMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }

        let n_features = x[0].len();
        if n_features == 0 {
            return Err(ForestError::InvalidParams("rows have no features".into()));
        }
        if let Some((row, found)) = x
            .iter()
            .enumerate()
            .map(|(i, r)| (i, r.len()))
            .find(|&(_, len)| len != n_features)
        {
            return Err(ForestError::DimensionMismatch {
                row,
                expected: n_features,
                found,
            });
        }

        let limits = TreeLimits {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
            max_features: params
                .max_features
                .unwrap_or_else(|| default_max_features(n_features)),
        };

        let mut master = ChaCha8Rng::seed_from_u64(seed);
        let n = x.len();

        let trees: Vec<DecisionTree> = (0..params.n_trees)
            .map(|_| {
                let mut rng = ChaCha8Rng::seed_from_u64(master.gen());
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                DecisionTree::fit(x, y, bootstrap, n_features, limits, &mut rng)
            })
            .collect();

        let importances = average_importances(&trees, n_features);

        Ok(Self {
            trees,
            n_features,
            importances,
        })
    }

    /// Mean class-1 probability across trees.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Majority vote across trees; ties go to class 0.
    pub fn predict(&self, row: &[f64]) -> u8 {
        let votes = self.trees.iter().filter(|t| t.predict(row) == 1).count();
        u8::from(votes * 2 > self.trees.len())
    }

    /// Per-feature importance, averaged over trees and normalized to sum to 1.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

fn validate_params(params: &ForestParams) -> ForestResult<()> {
    if params.n_trees == 0 {
        return Err(ForestError::InvalidParams("n_trees must be at least 1".into()));
    }
    if params.max_depth == 0 {
        return Err(ForestError::InvalidParams("max_depth must be at least 1".into()));
    }
    if params.min_samples_leaf == 0 {
        return Err(ForestError::InvalidParams("min_samples_leaf must be at least 1".into()));
    }
    if params.min_samples_split < 2 {
        return Err(ForestError::InvalidParams("min_samples_split must be at least 2".into()));
    }
    if params.max_features == Some(0) {
        return Err(ForestError::InvalidParams("max_features must be at least 1".into()));
    }
    Ok(())
}

/// floor(sqrt(n_features)), at least 1.
fn default_max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt() as usize).max(1)
}

fn average_importances(trees: &[DecisionTree], n_features: usize) -> Vec<f64> {
    let mut sums = vec![0.0; n_features];
    for tree in trees {
        for (sum, value) in sums.iter_mut().zip(tree.feature_importances()) {
            *sum += value;
        }
    }

    let total: f64 = sums.iter().sum();
    if total <= 0.0 {
        return sums;
    }
    sums.iter().map(|v| v / total).collect()
}
