//! Error types. Structural contract violations are fatal; data-quality
//! anomalies never reach this module (they go to the quality sink).

use std::fmt;
use thiserror::Error;

/// Pipeline stage that detected a structural problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Normalize,
    Derive,
    Reconcile,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Normalize => "normalize",
            Stage::Derive => "derive",
            Stage::Reconcile => "reconcile",
        })
    }
}

/// Input or target schema does not satisfy the pipeline's column contract.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("{stage}: missing required column(s): {}", .columns.join(", "))]
    MissingColumns { stage: Stage, columns: Vec<String> },

    #[error("column '{column}' has dtype {found}, expected {expected}")]
    DtypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    #[error("duplicate column '{0}' after trimming names")]
    DuplicateColumn(String),

    #[error("row {row} has {found} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("expected '{0}' column in data")]
    MissingTarget(String),

    #[error("invalid target value '{value}' at row {row} (expected Yes/No)")]
    InvalidTarget { row: usize, value: String },

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    pub fn is_schema(&self) -> bool {
        matches!(self, PipelineError::Schema(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
