//! CART decision tree for binary targets (Gini impurity).

use rand::seq::index;
use rand::Rng;

/// Growth limits for a single tree.
#[derive(Debug, Clone, Copy)]
pub struct TreeLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered at each split
    pub max_features: usize,
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        /// Share of class-1 samples that reached this leaf
        positive_fraction: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A fitted decision tree stored as a flat node arena (root at index 0).
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Unnormalized weighted impurity decrease per feature
    importances: Vec<f64>,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// Weighted Gini decrease: n*G(parent) - n_l*G(left) - n_r*G(right)
    decrease: f64,
}

impl DecisionTree {
    /// Grow a tree over `samples`, indices into `x`/`y` (repeats allowed, as
    /// produced by bootstrap sampling).
    pub fn fit(
        x: &[Vec<f64>],
        y: &[u8],
        samples: Vec<usize>,
        n_features: usize,
        limits: TreeLimits,
        rng: &mut impl Rng,
    ) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            importances: vec![0.0; n_features],
        };
        tree.grow(x, y, samples, 0, n_features, &limits, rng);
        tree
    }

    fn grow(
        &mut self,
        x: &[Vec<f64>],
        y: &[u8],
        samples: Vec<usize>,
        depth: usize,
        n_features: usize,
        limits: &TreeLimits,
        rng: &mut impl Rng,
    ) -> usize {
        let n = samples.len();
        let positives = samples.iter().filter(|&&i| y[i] == 1).count();
        let node_id = self.nodes.len();

        let positive_fraction = if n == 0 { 0.0 } else { positives as f64 / n as f64 };
        self.nodes.push(Node::Leaf { positive_fraction });

        let pure = positives == 0 || positives == n;
        if pure || depth >= limits.max_depth || n < limits.min_samples_split {
            return node_id;
        }

        let Some(best) = best_split(x, y, &samples, positives, n_features, limits, rng) else {
            return node_id;
        };

        self.importances[best.feature] += best.decrease;

        let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| x[i][best.feature] <= best.threshold);

        let left = self.grow(x, y, left_samples, depth + 1, n_features, limits, rng);
        let right = self.grow(x, y, right_samples, depth + 1, n_features, limits, rng);

        self.nodes[node_id] = Node::Split {
            feature: best.feature,
            threshold: best.threshold,
            left,
            right,
        };
        node_id
    }

    /// Class-1 fraction of the leaf `row` falls into.
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive_fraction } => return *positive_fraction,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// This tree's vote: class 1 when the leaf majority is class 1.
    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.predict_proba(row) > 0.5)
    }

    /// Impurity decrease per feature, normalized to sum to 1 (all zeros for a stump).
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.importances.iter().sum();
        if total <= 0.0 {
            return vec![0.0; self.importances.len()];
        }
        self.importances.iter().map(|v| v / total).collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in edges.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

fn gini(positives: usize, n: usize) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let p = positives as f64 / n as f64;
    2.0 * p * (1.0 - p)
}

/// Best threshold over a random subset of features, honoring `min_samples_leaf`.
fn best_split(
    x: &[Vec<f64>],
    y: &[u8],
    samples: &[usize],
    positives: usize,
    n_features: usize,
    limits: &TreeLimits,
    rng: &mut impl Rng,
) -> Option<SplitCandidate> {
    let n = samples.len();
    let parent = n as f64 * gini(positives, n);
    let amount = limits.max_features.clamp(1, n_features);

    let mut best: Option<SplitCandidate> = None;
    let mut sorted = samples.to_vec();

    for feature in index::sample(rng, n_features, amount).into_iter() {
        sorted.sort_by(|&a, &b| x[a][feature].total_cmp(&x[b][feature]));

        let mut left_pos = 0usize;
        for split_at in 1..n {
            left_pos += usize::from(y[sorted[split_at - 1]] == 1);

            let left_n = split_at;
            let right_n = n - split_at;
            if left_n < limits.min_samples_leaf || right_n < limits.min_samples_leaf {
                continue;
            }

            let lo = x[sorted[split_at - 1]][feature];
            let hi = x[sorted[split_at]][feature];
            if lo == hi {
                continue;
            }

            let children = left_n as f64 * gini(left_pos, left_n)
                + right_n as f64 * gini(positives - left_pos, right_n);
            let decrease = parent - children;

            if decrease > 1e-12 && best.as_ref().map_or(true, |b| decrease > b.decrease) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: lo + (hi - lo) / 2.0,
                    decrease,
                });
            }
        }
    }

    best
}
