//! ONNX Runtime adapter. Input: [rows, features] f32. Output: the
//! probability tensor, either [rows, 2] (positive class in column 1) or
//! [rows] / [rows, 1].

use super::ChurnModel;
use crate::error::{PipelineError, Result};
use crate::reconcile::{AlignedTable, TargetSchema};
use ndarray::{Array2, CowArray};
use std::path::Path;
use std::sync::Arc;

fn ort_err(e: ort::OrtError) -> PipelineError {
    PipelineError::Model(e.to_string())
}

pub struct OnnxChurnModel {
    name: String,
    schema: TargetSchema,
    session: ort::Session,
    probability_output: usize,
    _env: Arc<ort::Environment>,
}

impl OnnxChurnModel {
    /// Load an exported classifier. The target schema is supplied separately
    /// because the ONNX graph starts after one-hot expansion.
    pub fn load(path: &Path, schema: TargetSchema) -> Result<Self> {
        if !path.exists() {
            return Err(PipelineError::Model(format!(
                "ONNX model not found: {}",
                path.display()
            )));
        }
        let env = ort::Environment::builder()
            .with_name("churn-pipeline")
            .build()
            .map_err(ort_err)?
            .into_arc();
        let session = ort::SessionBuilder::new(&env)
            .map_err(ort_err)?
            .with_model_from_file(path)
            .map_err(ort_err)?;

        let probability_output = session
            .outputs
            .iter()
            .position(|o| o.name.contains("prob"))
            .unwrap_or_else(|| session.outputs.len().saturating_sub(1));

        tracing::info!(path = %path.display(), outputs = session.outputs.len(), "ONNX model loaded");
        Ok(Self {
            name: path.display().to_string(),
            schema,
            session,
            probability_output,
            _env: env,
        })
    }
}

impl ChurnModel for OnnxChurnModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_schema(&self) -> &TargetSchema {
        &self.schema
    }

    fn predict_probability(&self, features: &AlignedTable) -> Result<Vec<f64>> {
        let rows = features.nrows();
        let input: Array2<f32> = features.matrix.mapv(|v| v as f32);
        let input = CowArray::from(input.into_dyn());
        let value =
            ort::Value::from_array(self.session.allocator(), &input).map_err(ort_err)?;

        let outputs = self.session.run(vec![value]).map_err(ort_err)?;
        let output = outputs.get(self.probability_output).ok_or_else(|| {
            PipelineError::Model("probability output missing from ONNX session".to_string())
        })?;
        let tensor = output.try_extract::<f32>().map_err(ort_err)?;
        let view = tensor.view();

        let probs: Vec<f64> = match view.shape() {
            [n, 2] if *n == rows => view.iter().skip(1).step_by(2).map(|p| *p as f64).collect(),
            [n] | [n, 1] if *n == rows => view.iter().map(|p| *p as f64).collect(),
            shape => {
                return Err(PipelineError::Model(format!(
                    "unexpected probability shape {:?} for {} rows",
                    shape, rows
                )))
            }
        };
        Ok(probs)
    }
}
