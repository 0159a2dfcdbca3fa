//! Training-side preparation: label encoding and the fitted layout an
//! external trainer needs. No model is fitted here.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::features::FeatureDeriver;
use crate::logging::QualitySink;
use crate::normalize::{Mode, NormalizedTable, Normalizer};
use crate::reconcile::{AlignedTable, SchemaReconciler, TargetSchema};
use crate::table::{ColumnValues, RawTable};

/// Design matrix, labels and the layout to ship with the fitted model.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub schema: TargetSchema,
    pub features: AlignedTable,
    pub labels: Vec<u8>,
}

/// Split the label column off a normalized table, mapping `Yes`/`No` to 1/0.
pub fn encode_target(table: NormalizedTable, target: &str) -> Result<(NormalizedTable, Vec<u8>)> {
    let (mut frame, ids) = table.into_parts();
    let column = frame
        .remove(target)
        .ok_or_else(|| PipelineError::MissingTarget(target.to_string()))?;

    let labels = match &column.values {
        ColumnValues::Categorical(values) => values
            .iter()
            .enumerate()
            .map(|(row, v)| match v.as_deref() {
                Some("Yes") => Ok(1),
                Some("No") => Ok(0),
                other => Err(PipelineError::InvalidTarget {
                    row,
                    value: other.unwrap_or_default().to_string(),
                }),
            })
            .collect::<Result<Vec<u8>>>()?,
        other => {
            return Err(PipelineError::InvalidTarget {
                row: 0,
                value: format!("{} column", other.dtype()),
            })
        }
    };

    Ok((NormalizedTable::new(frame, ids), labels))
}

pub struct TrainingPipeline {
    normalizer: Normalizer,
    deriver: FeatureDeriver,
}

impl TrainingPipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            normalizer: Normalizer::new(config.input.clone(), config.serving.clone()),
            deriver: FeatureDeriver::new(config.serving.clone()),
        }
    }

    /// normalize(training) → encode target → derive(training) → fit layout →
    /// align. Imputation and the high-charges flag use this batch's
    /// statistics, so the result depends on the whole batch.
    pub fn prepare(&self, raw: &RawTable, sink: &dyn QualitySink) -> Result<TrainingSet> {
        let normalized = self.normalizer.normalize(raw, Mode::Training, sink)?;
        let target = self.normalizer.schema().target_column.clone();
        let (normalized, labels) = encode_target(normalized, &target)?;
        let features = self.deriver.derive(&normalized, Mode::Training, sink)?;
        let schema = TargetSchema::fit(&features);
        let features = SchemaReconciler::new(&schema).align(&features, sink)?;
        Ok(TrainingSet {
            schema,
            features,
            labels,
        })
    }
}
