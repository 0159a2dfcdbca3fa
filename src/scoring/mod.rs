//! Batch scoring: raw table → prediction table.

mod batch;
mod engine;

pub use batch::BatchScorer;
pub use engine::{round_to, Decision, DecisionEngine};

use crate::table::{RawTable, RawValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const CHURN_PROBABILITY: &str = "churn_probability";
pub const CHURN_PREDICTION: &str = "churn_prediction";

/// One scored input row: its original values plus the decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub values: Vec<RawValue>,
    pub churn_probability: f64,
    pub churn_prediction: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionTable {
    pub batch_id: Uuid,
    pub scored_at: DateTime<Utc>,
    pub model: String,
    /// Original input column names, untrimmed
    pub columns: Vec<String>,
    pub rows: Vec<Prediction>,
}

impl PredictionTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn probabilities(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.churn_probability).collect()
    }

    pub fn predictions(&self) -> Vec<u8> {
        self.rows.iter().map(|r| r.churn_prediction).collect()
    }

    pub fn predicted_churners(&self) -> usize {
        self.rows.iter().filter(|r| r.churn_prediction == 1).count()
    }

    /// Original columns followed by `churn_probability` and `churn_prediction`.
    pub fn to_raw_table(&self) -> RawTable {
        let mut columns = self.columns.clone();
        columns.push(CHURN_PROBABILITY.to_string());
        columns.push(CHURN_PREDICTION.to_string());
        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut values = r.values.clone();
                values.push(RawValue::Number(r.churn_probability));
                values.push(RawValue::Number(r.churn_prediction as f64));
                values
            })
            .collect();
        RawTable::new(columns, rows)
    }
}
