//! Training and the trained model value.

use log::info;

use super::{stratified_split, EstimatorError, EstimatorResult};
use crate::config::EstimatorConfig;
use crate::features::FeatureBuilder;
use crate::forest::{evaluate, RandomForest};
use crate::labels::{HeuristicLabeler, LabelSource};
use crate::models::{
    FeatureImportance, ModelMetrics, ReferralRecord, ScoredRecord, SpecialtyMap, FEATURE_NAMES,
};

/// A fitted classifier together with the encoding it was fitted under.
///
/// Immutable once built; share it behind an `Arc` and replace it whole.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    forest: RandomForest,
    specialty_map: SpecialtyMap,
    features: FeatureBuilder,
    metrics: ModelMetrics,
    importances: Vec<FeatureImportance>,
}

impl TrainedModel {
    /// Score a batch, encoding specialties with the training-time map.
    pub fn predict(&self, records: &[ReferralRecord]) -> Vec<ScoredRecord> {
        let batch = self.features.build(records, Some(&self.specialty_map));

        records
            .iter()
            .zip(batch.features)
            .map(|(record, features)| {
                let row = features.to_array();
                ScoredRecord {
                    specialty: record.specialty.clone(),
                    risk_level: record.risk_level,
                    features,
                    probability: self.forest.predict_proba(&row),
                    predicted_label: self.forest.predict(&row),
                }
            })
            .collect()
    }

    pub fn metrics(&self) -> &ModelMetrics {
        &self.metrics
    }

    /// Specialty encoding captured at training time.
    pub fn specialty_map(&self) -> &SpecialtyMap {
        &self.specialty_map
    }

    pub fn feature_importances(&self) -> &[FeatureImportance] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.forest.n_trees()
    }
}

/// Train with synthesized labels.
pub fn train(records: &[ReferralRecord], config: &EstimatorConfig) -> EstimatorResult<TrainedModel> {
    train_with_labels(records, config, &HeuristicLabeler::from_config(config))
}

/// Train with labels from any [`LabelSource`].
///
/// Fails with a precondition error when the labels cannot be split with
/// stratification (a single class, or too few records), and with
/// `ClassifierUnavailable` when the ensemble cannot be fitted.
pub fn train_with_labels(
    records: &[ReferralRecord],
    config: &EstimatorConfig,
    label_source: &dyn LabelSource,
) -> EstimatorResult<TrainedModel> {
    let features = FeatureBuilder::from_config(config);
    let batch = features.build(records, None);

    let labels = label_source.labels(&batch.features);
    if labels.len() != batch.features.len() {
        return Err(EstimatorError::LabelCountMismatch {
            records: batch.features.len(),
            labels: labels.len(),
        });
    }

    let positives = labels.iter().filter(|&&l| l == 1).count();
    let positive_rate = if labels.is_empty() {
        0.0
    } else {
        positives as f64 / labels.len() as f64
    };
    info!(
        "Training on {} records ({} labels, {:.1}% deteriorated)",
        records.len(),
        label_source.name(),
        positive_rate * 100.0
    );

    let split = stratified_split(&labels, config.split.test_fraction, config.seed)?;

    let rows: Vec<Vec<f64>> = batch.features.iter().map(|f| f.to_array().to_vec()).collect();
    let select = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<u8>) {
        (
            idx.iter().map(|&i| rows[i].clone()).collect(),
            idx.iter().map(|&i| labels[i]).collect(),
        )
    };
    let (x_train, y_train) = select(&split.train);
    let (x_test, y_test) = select(&split.test);

    let forest = RandomForest::fit(&x_train, &y_train, &config.forest, config.seed)?;

    let y_pred: Vec<u8> = x_test.iter().map(|row| forest.predict(row)).collect();
    let y_score: Vec<f64> = x_test.iter().map(|row| forest.predict_proba(row)).collect();
    let report = evaluate(&y_test, &y_pred, &y_score);

    let metrics = ModelMetrics {
        model_id: uuid::Uuid::new_v4().to_string(),
        trained_at: chrono::Utc::now().to_rfc3339(),
        accuracy: report.accuracy,
        precision: report.precision,
        recall: report.recall,
        f1: report.f1,
        auc_roc: report.auc_roc,
        positive_rate,
        train_size: x_train.len(),
        test_size: x_test.len(),
    };

    let importances: Vec<FeatureImportance> = FEATURE_NAMES
        .iter()
        .zip(forest.feature_importances())
        .map(|(name, &importance)| FeatureImportance {
            feature: (*name).to_string(),
            importance,
        })
        .collect();

    info!(
        "Trained {} trees on {} records, tested on {}: accuracy {:.3}, precision {:.3}, recall {:.3}, f1 {:.3}, auc {:.3}",
        forest.n_trees(),
        metrics.train_size,
        metrics.test_size,
        metrics.accuracy,
        metrics.precision,
        metrics.recall,
        metrics.f1,
        metrics.auc_roc
    );
    for fi in &importances {
        info!("  importance {}: {:.3}", fi.feature, fi.importance);
    }

    Ok(TrainedModel {
        forest,
        specialty_map: batch.specialty_map,
        features,
        metrics,
        importances,
    })
}
