#![allow(dead_code)]

use churn_pipeline::error::Result;
use churn_pipeline::logging::NullSink;
use churn_pipeline::model::ChurnModel;
use churn_pipeline::reconcile::{AlignedTable, TargetSchema};
use churn_pipeline::table::{RawTable, RawValue};
use churn_pipeline::{PipelineConfig, TrainingPipeline};

pub const COLUMNS: &[&str] = &[
    "customerID",
    "gender",
    "SeniorCitizen",
    "tenure",
    "MonthlyCharges",
    "TotalCharges",
    "PaymentMethod",
    "Contract",
    "Churn",
];

fn row(
    id: &str,
    gender: &str,
    senior: i64,
    tenure: f64,
    monthly: f64,
    total: RawValue,
    payment: &str,
    contract: &str,
    churn: &str,
) -> Vec<RawValue> {
    vec![
        id.into(),
        gender.into(),
        senior.into(),
        tenure.into(),
        monthly.into(),
        total,
        payment.into(),
        contract.into(),
        churn.into(),
    ]
}

/// Six labelled customers; C6 has a blank TotalCharges like new accounts in
/// the public Telco extract.
pub fn training_table() -> RawTable {
    RawTable::from_rows(
        COLUMNS,
        vec![
            row("C1", "Female", 0, 1.0, 29.85, 29.85.into(), "Electronic check", "Month-to-month", "No"),
            row("C2", "Male", 0, 34.0, 56.95, 1889.5.into(), "Mailed check", "One year", "No"),
            row("C3", "Male", 0, 2.0, 53.85, 108.15.into(), "Mailed check", "Month-to-month", "Yes"),
            row("C4", "Male", 0, 45.0, 42.30, 1840.75.into(), "Bank transfer (automatic)", "One year", "No"),
            row("C5", "Female", 0, 2.0, 70.70, 151.65.into(), "Electronic check", "Month-to-month", "Yes"),
            row("C6", "Female", 1, 0.0, 99.65, " ".into(), "Credit card (automatic)", "Two year", "Yes"),
        ],
    )
}

/// Serving columns: everything but the label.
pub const SERVING_COLUMNS: &[&str] = &[
    "customerID",
    "gender",
    "SeniorCitizen",
    "tenure",
    "MonthlyCharges",
    "TotalCharges",
    "PaymentMethod",
    "Contract",
];

pub fn serving_row(
    id: &str,
    tenure: f64,
    monthly: f64,
    total: RawValue,
    payment: &str,
    contract: &str,
) -> Vec<RawValue> {
    vec![
        id.into(),
        "Female".into(),
        0i64.into(),
        tenure.into(),
        monthly.into(),
        total,
        payment.into(),
        contract.into(),
    ]
}

pub fn serving_table(rows: Vec<Vec<RawValue>>) -> RawTable {
    RawTable::from_rows(SERVING_COLUMNS, rows)
}

/// The row used throughout the docs: a new, expensive month-to-month
/// customer paying by electronic check.
pub fn example_serving_table() -> RawTable {
    serving_table(vec![serving_row(
        "C9",
        5.0,
        90.0,
        450.0.into(),
        "Electronic check",
        "Month-to-month",
    )])
}

pub fn fitted_schema() -> TargetSchema {
    TrainingPipeline::new(&PipelineConfig::default())
        .prepare(&training_table(), &NullSink)
        .expect("training table prepares")
        .schema
}

/// Returns the same probability for every row.
pub struct ConstantModel {
    pub schema: TargetSchema,
    pub probability: f64,
}

impl ConstantModel {
    pub fn new(probability: f64) -> Self {
        Self {
            schema: fitted_schema(),
            probability,
        }
    }
}

impl ChurnModel for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn target_schema(&self) -> &TargetSchema {
        &self.schema
    }

    fn predict_probability(&self, features: &AlignedTable) -> Result<Vec<f64>> {
        Ok(vec![self.probability; features.nrows()])
    }
}
