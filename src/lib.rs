//! Churn pipeline: train/serve-consistent feature derivation and batch
//! scoring for customer churn classifiers.
//!
//! Modular structure:
//! - [`normalize`] - Column trimming, numeric coercion, imputation
//! - [`features`] - Engineered churn features per mode
//! - [`reconcile`] - Alignment to the fit-time feature layout
//! - [`model`] - Classifier handles
//! - [`scoring`] - Serving pipeline and decisions
//! - [`training`] - Label encoding and layout fitting
//! - [`table`] - Raw and typed tables, CSV adapters
//! - [`logging`] - Data-quality sink and subscriber setup

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod reconcile;
pub mod scoring;
pub mod table;
pub mod training;

pub use config::PipelineConfig;
pub use error::{PipelineError, SchemaError};
pub use features::{FeatureDeriver, FeatureTable};
pub use logging::{QualitySink, StructuredLogger, TracingSink};
pub use model::{ChurnModel, LinearChurnModel};
pub use normalize::{Mode, NormalizedTable, Normalizer};
pub use reconcile::{AlignedTable, SchemaReconciler, TargetSchema};
pub use scoring::{BatchScorer, PredictionTable};
pub use table::{RawTable, RawValue};
pub use training::{encode_target, TrainingPipeline, TrainingSet};
