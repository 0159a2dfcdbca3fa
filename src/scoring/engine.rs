//! Turns a model probability into the reported probability and a 0/1 label.

use crate::config::DecisionConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Rounded for reporting only
    pub probability: f64,
    pub prediction: u8,
}

pub struct DecisionEngine {
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self { config }
    }

    /// The label is decided on the unrounded probability so rounding can
    /// never move a row across the threshold.
    pub fn decide(&self, probability: f64) -> Decision {
        let prediction = (probability >= self.config.threshold) as u8;
        Decision {
            probability: round_to(probability, self.config.probability_decimals),
            prediction,
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }
}

pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_uses_unrounded_probability() {
        let engine = DecisionEngine::new(DecisionConfig::default());
        let d = engine.decide(0.49996);
        assert_eq!(d.probability, 0.5);
        assert_eq!(d.prediction, 0);
        assert_eq!(engine.decide(0.5).prediction, 1);
        assert_eq!(engine.decide(0.73).probability, 0.73);
    }
}
