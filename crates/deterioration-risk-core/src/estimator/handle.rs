//! Shared, guarded model slot.

use std::sync::{Arc, Mutex, RwLock};

use log::{info, warn};

use super::{train, train_with_labels, EstimatorError, EstimatorResult, TrainedModel};
use crate::config::EstimatorConfig;
use crate::labels::LabelSource;
use crate::models::{ModelMetrics, ReferralRecord, ScoredRecord};

/// Lifecycle of a [`ModelHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Untrained,
    Trained,
}

/// Holds at most one [`TrainedModel`] for concurrent readers.
///
/// Readers clone an `Arc` snapshot, so they always see a complete model.
/// Training happens outside the read lock and the new model is swapped in
/// whole. Trainers are serialized by a separate mutex.
pub struct ModelHandle {
    config: EstimatorConfig,
    slot: RwLock<Option<Arc<TrainedModel>>>,
    training: Mutex<()>,
}

impl ModelHandle {
    pub fn new(config: EstimatorConfig) -> Self {
        Self {
            config,
            slot: RwLock::new(None),
            training: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    pub fn state(&self) -> EstimatorResult<ModelState> {
        Ok(match self.current()? {
            Some(_) => ModelState::Trained,
            None => ModelState::Untrained,
        })
    }

    /// Snapshot of the installed model, if any.
    pub fn current(&self) -> EstimatorResult<Option<Arc<TrainedModel>>> {
        let slot = self.slot.read()?;
        Ok(slot.clone())
    }

    /// Train with synthesized labels and install the result.
    pub fn train(&self, records: &[ReferralRecord]) -> EstimatorResult<ModelMetrics> {
        let _guard = self.training.lock()?;
        let model = train(records, &self.config)?;
        self.install(model)
    }

    /// Train with labels from `label_source` and install the result.
    pub fn train_with_labels(
        &self,
        records: &[ReferralRecord],
        label_source: &dyn LabelSource,
    ) -> EstimatorResult<ModelMetrics> {
        let _guard = self.training.lock()?;
        let model = train_with_labels(records, &self.config, label_source)?;
        self.install(model)
    }

    /// Replace the installed model.
    pub fn install(&self, model: TrainedModel) -> EstimatorResult<ModelMetrics> {
        let metrics = model.metrics().clone();
        let mut slot = self.slot.write()?;
        *slot = Some(Arc::new(model));
        Ok(metrics)
    }

    /// Drop the installed model, returning to `Untrained`.
    pub fn reset(&self) -> EstimatorResult<()> {
        let _guard = self.training.lock()?;
        *self.slot.write()? = None;
        Ok(())
    }

    /// The model to score `records` with.
    ///
    /// When untrained, either trains on `records` themselves (if
    /// `auto_train_on_predict` is set) or fails with `NotTrained`.
    pub fn model_for(&self, records: &[ReferralRecord]) -> EstimatorResult<Arc<TrainedModel>> {
        if let Some(model) = self.current()? {
            return Ok(model);
        }
        if !self.config.auto_train_on_predict {
            return Err(EstimatorError::NotTrained);
        }

        let _guard = self.training.lock()?;
        // Another caller may have finished training while we waited
        if let Some(model) = self.current()? {
            return Ok(model);
        }

        warn!(
            "No trained model; training on the {} records being scored",
            records.len()
        );
        let model = Arc::new(train(records, &self.config)?);
        *self.slot.write()? = Some(Arc::clone(&model));
        info!("Auto-trained model {}", model.metrics().model_id);
        Ok(model)
    }

    /// Score a batch with the installed (or auto-trained) model.
    pub fn predict(&self, records: &[ReferralRecord]) -> EstimatorResult<Vec<ScoredRecord>> {
        Ok(self.model_for(records)?.predict(records))
    }
}
