//! Declared input schema. Column kinds come from here rather than from
//! inspecting values, except for columns the schema does not mention.

use crate::reconcile::TargetSchema;
use serde::{Deserialize, Serialize};

/// Well-known input field names.
pub mod fields {
    pub const CUSTOMER_ID: &str = "customerID";
    pub const CHURN: &str = "Churn";
    pub const SENIOR_CITIZEN: &str = "SeniorCitizen";
    pub const TENURE: &str = "tenure";
    pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
    pub const TOTAL_CHARGES: &str = "TotalCharges";
    pub const PAYMENT_METHOD: &str = "PaymentMethod";
    pub const CONTRACT: &str = "Contract";
}

/// Source fields every serving request must carry, because a derived feature
/// depends on each of them.
pub const SERVING_REQUIRED: &[&str] = &[
    fields::TENURE,
    fields::MONTHLY_CHARGES,
    fields::TOTAL_CHARGES,
    fields::PAYMENT_METHOD,
    fields::CONTRACT,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSchema {
    /// Identifier column, stripped before modelling
    pub id_column: Option<String>,
    /// Label column (training only)
    pub target_column: String,
    /// Fields coerced to numbers; unparsable text becomes missing
    pub numeric: Vec<String>,
    /// Fields kept as categories
    pub categorical: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        let categorical = [
            "gender",
            "Partner",
            "Dependents",
            "PhoneService",
            "MultipleLines",
            "InternetService",
            "OnlineSecurity",
            "OnlineBackup",
            "DeviceProtection",
            "TechSupport",
            "StreamingTV",
            "StreamingMovies",
            fields::CONTRACT,
            "PaperlessBilling",
            fields::PAYMENT_METHOD,
        ];
        Self {
            id_column: Some(fields::CUSTOMER_ID.to_string()),
            target_column: fields::CHURN.to_string(),
            numeric: [
                fields::SENIOR_CITIZEN,
                fields::TENURE,
                fields::MONTHLY_CHARGES,
                fields::TOTAL_CHARGES,
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            categorical: categorical.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InputSchema {
    /// Declared kind of a field; the target is always categorical.
    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        if self.numeric.iter().any(|n| n == name) {
            Some(FieldKind::Numeric)
        } else if name == self.target_column || self.categorical.iter().any(|n| n == name) {
            Some(FieldKind::Categorical)
        } else {
            None
        }
    }

    pub fn is_id(&self, name: &str) -> bool {
        self.id_column.as_deref() == Some(name)
    }

    /// Declare `name` unless it already has a kind or is the identifier.
    pub fn declare(&mut self, name: &str, kind: FieldKind) {
        if self.is_id(name) || self.kind_of(name).is_some() {
            return;
        }
        match kind {
            FieldKind::Numeric => self.numeric.push(name.to_string()),
            FieldKind::Categorical => self.categorical.push(name.to_string()),
        }
    }

    /// This schema plus every input column a fitted layout knows about, so
    /// serving batches never have to guess a kind from their own rows.
    pub fn with_fitted(&self, fitted: &TargetSchema) -> Self {
        let mut schema = self.clone();
        for (name, kind) in fitted.input_kinds() {
            schema.declare(name, kind);
        }
        schema
    }
}
