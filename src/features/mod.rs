//! Engineered churn features derived from normalized fields.

mod pipeline;
mod rules;

pub use pipeline::FeatureDeriver;
pub use rules::{
    contract_type_risk, payment_method_risk, TenureBuckets, RISKY_PAYMENT_METHODS,
    SERVING_CONTRACT_RISK, SERVING_PAYMENT_RISK, TENURE_LABEL_ALIASES,
};

use crate::normalize::NormalizedTable;
use crate::table::{Frame, RawValue};

pub const TENURE_BUCKET: &str = "tenure_bucket";
pub const MONTHLY_TO_TOTAL_RATIO: &str = "monthly_to_total_ratio";
pub const HIGH_MONTHLY_CHARGES_FLAG: &str = "high_monthly_charges_flag";
pub const PAYMENT_METHOD_RISK: &str = "payment_method_risk";
pub const CONTRACT_TYPE_RISK: &str = "contract_type_risk";

/// All engineered column names, in the order they are derived.
pub const ENGINEERED: &[&str] = &[
    TENURE_BUCKET,
    MONTHLY_TO_TOTAL_RATIO,
    HIGH_MONTHLY_CHARGES_FLAG,
    PAYMENT_METHOD_RISK,
    CONTRACT_TYPE_RISK,
];

pub fn is_engineered(name: &str) -> bool {
    ENGINEERED.contains(&name)
}

/// Normalized columns plus whichever engineered columns could be derived.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    frame: Frame,
    ids: Option<Vec<RawValue>>,
}

impl FeatureTable {
    pub fn new(frame: Frame, ids: Option<Vec<RawValue>>) -> Self {
        Self { frame, ids }
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn ids(&self) -> Option<&[RawValue]> {
        self.ids.as_deref()
    }

    pub fn len(&self) -> usize {
        self.frame.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }

    /// Engineered columns present in this table.
    pub fn engineered(&self) -> Vec<&str> {
        self.frame.names().filter(|n| is_engineered(n)).collect()
    }

    /// View the table as normalized input again, engineered columns included.
    pub fn to_normalized(&self) -> NormalizedTable {
        NormalizedTable::new(self.frame.clone(), self.ids.clone())
    }
}
