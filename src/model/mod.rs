//! Classifier handles. The pipeline only needs a fitted target schema and a
//! probability per aligned row; how a model is stored is up to the adapter.

mod linear;
#[cfg(feature = "onnx")]
mod onnx;

pub use linear::LinearChurnModel;
#[cfg(feature = "onnx")]
pub use onnx::OnnxChurnModel;

use crate::error::Result;
use crate::reconcile::{AlignedTable, TargetSchema};

/// A fitted churn classifier. Read-only after load, so one handle can serve
/// concurrent scoring calls.
pub trait ChurnModel: Send + Sync {
    fn name(&self) -> &str;

    /// Layout the classifier was fitted on.
    fn target_schema(&self) -> &TargetSchema;

    /// Positive-class probability for each row of `features`.
    fn predict_probability(&self, features: &AlignedTable) -> Result<Vec<f64>>;
}
