//! Pipeline configuration: declared input schema, serving-mode literals,
//! decision threshold and logging.

use crate::error::{PipelineError, Result};
use crate::normalize::InputSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Declared identifier, target, numeric and categorical fields
    pub input: InputSchema,
    /// Literal defaults and thresholds used in serving mode
    pub serving: ServingPolicy,
    /// Probability threshold and reporting precision
    pub decision: DecisionConfig,
    /// Logging
    pub log: LogConfig,
}

/// Fixed literals for serving mode. Training mode uses batch statistics for
/// the same features instead; see DESIGN.md on train/serve skew.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServingPolicy {
    /// Replacement for missing numeric values
    pub numeric_default: f64,
    /// Replacement for missing categorical values
    pub categorical_default: String,
    /// `high_monthly_charges_flag` is set above this MonthlyCharges value
    pub high_monthly_charges_threshold: f64,
    /// Risk level for payment methods outside the known set
    pub unknown_payment_method_risk: i64,
    /// Risk level for contract types outside the known set
    pub unknown_contract_risk: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Rows with probability >= threshold are predicted to churn (0.0–1.0)
    pub threshold: f64,
    /// Decimal places kept in the reported probability
    pub probability_decimals: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServingPolicy {
    fn default() -> Self {
        Self {
            numeric_default: 0.0,
            categorical_default: "Unknown".to_string(),
            high_monthly_charges_threshold: 80.0,
            unknown_payment_method_risk: 1,
            unknown_contract_risk: 2,
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            probability_decimals: 4,
        }
    }
}

/// Beyond this, rounding no longer changes an f64 probability.
const MAX_PROBABILITY_DECIMALS: u32 = 15;

impl DecisionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(PipelineError::Config(format!(
                "decision.threshold {} is outside [0, 1]",
                self.threshold
            )));
        }
        if self.probability_decimals > MAX_PROBABILITY_DECIMALS {
            return Err(PipelineError::Config(format!(
                "decision.probability_decimals {} exceeds {}",
                self.probability_decimals, MAX_PROBABILITY_DECIMALS
            )));
        }
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file. A missing file yields the defaults; a file that
    /// exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.decision.validate()?;
        Ok(config)
    }
}
