//! Binary classification metrics.
//!
//! Zero-division cases resolve to 0.0 instead of failing.

use serde::{Deserialize, Serialize};

/// Metrics on a held-out set.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub auc_roc: f64,
}

/// Compute metrics from true labels, predicted labels and class-1 scores.
pub fn evaluate(y_true: &[u8], y_pred: &[u8], y_score: &[f64]) -> ClassificationReport {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    let mut correct = 0usize;

    for (&t, &p) in y_true.iter().zip(y_pred) {
        match (t, p) {
            (1, 1) => tp += 1,
            (0, 1) => fp += 1,
            (1, 0) => fn_ += 1,
            _ => {}
        }
        if t == p {
            correct += 1;
        }
    }

    let n = y_true.len().min(y_pred.len());
    let accuracy = ratio(correct, n);
    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassificationReport {
        accuracy,
        precision,
        recall,
        f1,
        auc_roc: roc_auc(y_true, y_score),
    }
}

/// Area under the ROC curve via the rank-sum statistic, averaging tied ranks.
///
/// Returns 0.0 when either class is absent.
pub fn roc_auc(y_true: &[u8], y_score: &[f64]) -> f64 {
    let n = y_true.len().min(y_score.len());
    let n_pos = y_true[..n].iter().filter(|&&t| t == 1).count();
    let n_neg = n - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return 0.0;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| y_score[a].total_cmp(&y_score[b]));

    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean
        let mean_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = mean_rank;
        }
        i = j + 1;
    }

    let pos_rank_sum: f64 = (0..n).filter(|&k| y_true[k] == 1).map(|k| ranks[k]).sum();
    let n_pos_f = n_pos as f64;
    (pos_rank_sum - n_pos_f * (n_pos_f + 1.0) / 2.0) / (n_pos_f * n_neg as f64)
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
