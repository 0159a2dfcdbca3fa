//! Serving pipeline: normalize → derive → align → predict → decide.

use super::{DecisionEngine, Prediction, PredictionTable};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::FeatureDeriver;
use crate::logging::QualitySink;
use crate::model::ChurnModel;
use crate::normalize::{Mode, Normalizer};
use crate::reconcile::SchemaReconciler;
use crate::table::RawTable;
use chrono::Utc;
use uuid::Uuid;

pub struct BatchScorer {
    normalizer: Normalizer,
    deriver: FeatureDeriver,
    decisions: DecisionEngine,
}

impl BatchScorer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.input.clone(), config.serving.clone()),
            deriver: FeatureDeriver::new(config.serving.clone()),
            decisions: DecisionEngine::new(config.decision.clone()),
        }
    }

    /// Score a whole batch. Any structural error aborts before a result
    /// exists; there is no partial output.
    pub fn score(
        &self,
        raw: &RawTable,
        model: &dyn ChurnModel,
        sink: &dyn QualitySink,
    ) -> Result<PredictionTable> {
        let batch_id = Uuid::new_v4();

        let normalized = self
            .normalizer
            .for_fitted(model.target_schema())
            .normalize(raw, Mode::Serving, sink)?;
        let features = self.deriver.derive(&normalized, Mode::Serving, sink)?;
        let aligned = SchemaReconciler::new(model.target_schema()).align(&features, sink)?;
        let probabilities = model.predict_probability(&aligned)?;

        if probabilities.len() != raw.len() {
            return Err(PipelineError::Model(format!(
                "{} returned {} probabilities for {} rows",
                model.name(),
                probabilities.len(),
                raw.len()
            )));
        }
        if let Some((row, p)) = probabilities
            .iter()
            .enumerate()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(PipelineError::Model(format!(
                "{} returned probability {} at row {}",
                model.name(),
                p,
                row
            )));
        }

        let rows = raw
            .rows
            .iter()
            .zip(&probabilities)
            .map(|(values, p)| {
                let decision = self.decisions.decide(*p);
                Prediction {
                    values: values.clone(),
                    churn_probability: decision.probability,
                    churn_prediction: decision.prediction,
                }
            })
            .collect();

        Ok(PredictionTable {
            batch_id,
            scored_at: Utc::now(),
            model: model.name().to_string(),
            columns: raw.columns.clone(),
            rows,
        })
    }
}
