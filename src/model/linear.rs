//! Logistic-regression classifier stored as plain JSON.

use super::ChurnModel;
use crate::error::{PipelineError, Result, SchemaError, Stage};
use crate::reconcile::{AlignedTable, TargetSchema};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearChurnModel {
    #[serde(default = "default_name")]
    pub name: String,
    pub schema: TargetSchema,
    pub intercept: f64,
    /// One weight per expanded feature, in `schema.feature_names()` order
    pub coefficients: Vec<f64>,
}

fn default_name() -> String {
    "logistic".to_string()
}

impl LinearChurnModel {
    pub fn new(schema: TargetSchema, intercept: f64, coefficients: Vec<f64>) -> Result<Self> {
        let model = Self {
            name: default_name(),
            schema,
            intercept,
            coefficients,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(data)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let width = self.schema.width();
        if self.coefficients.len() != width {
            return Err(PipelineError::Model(format!(
                "{} coefficients for {} features",
                self.coefficients.len(),
                width
            )));
        }
        Ok(())
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl ChurnModel for LinearChurnModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn target_schema(&self) -> &TargetSchema {
        &self.schema
    }

    fn predict_probability(&self, features: &AlignedTable) -> Result<Vec<f64>> {
        let expected = self.schema.feature_names();
        if features.feature_names != expected {
            let missing = expected
                .into_iter()
                .filter(|n| !features.feature_names.contains(n))
                .collect::<Vec<_>>();
            if missing.is_empty() {
                return Err(PipelineError::Model(
                    "feature order differs from the fitted layout".to_string(),
                ));
            }
            return Err(SchemaError::MissingColumns {
                stage: Stage::Reconcile,
                columns: missing,
            }
            .into());
        }
        let weights = Array1::from_vec(self.coefficients.clone());
        let logits = features.matrix.dot(&weights);
        Ok(logits.iter().map(|z| sigmoid(z + self.intercept)).collect())
    }
}
