//! Per-mode feature rules.
//!
//! Training and serving deliberately use different definitions for the same
//! feature names (binary vs ordinal risk, 4 vs 5 tenure buckets). Both are
//! kept as-is; DESIGN.md records the skew.

use crate::config::ServingPolicy;
use crate::normalize::Mode;

/// Right-closed bins with an inclusive lowest edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenureBuckets {
    pub edges: &'static [f64],
    pub labels: &'static [&'static str],
    /// Values above the last edge fall into the last label
    pub open_top: bool,
}

impl TenureBuckets {
    pub const TRAINING: TenureBuckets = TenureBuckets {
        edges: &[0.0, 12.0, 24.0, 48.0, 72.0],
        labels: &["0-1 yr", "1-2 yrs", "2-4 yrs", "4-6 yrs"],
        open_top: false,
    };

    pub const SERVING: TenureBuckets = TenureBuckets {
        edges: &[0.0, 12.0, 24.0, 48.0, 72.0, 999.0],
        labels: &["0-1", "1-2", "2-4", "4-6", "6+"],
        open_top: true,
    };

    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Training => Self::TRAINING,
            Mode::Serving => Self::SERVING,
        }
    }

    /// Bucket label for `tenure`, or `None` when it falls outside every bin.
    pub fn label(&self, tenure: f64) -> Option<&'static str> {
        let first = *self.edges.first()?;
        if tenure.is_nan() || tenure < first {
            return None;
        }
        for (i, upper) in self.edges.iter().skip(1).enumerate() {
            if tenure <= *upper {
                return self.labels.get(i).copied();
            }
        }
        if self.open_top {
            self.labels.last().copied()
        } else {
            None
        }
    }
}

/// Serving-mode tenure labels mapped onto the training vocabulary. `6+` has
/// no training counterpart.
pub const TENURE_LABEL_ALIASES: &[(&str, &str)] = &[
    ("0-1", "0-1 yr"),
    ("1-2", "1-2 yrs"),
    ("2-4", "2-4 yrs"),
    ("4-6", "4-6 yrs"),
];

pub const RISKY_PAYMENT_METHODS: &[&str] = &["Mailed check", "Electronic check"];

pub const SERVING_PAYMENT_RISK: &[(&str, i64)] = &[
    ("Electronic check", 2),
    ("Mailed check", 1),
    ("Bank transfer (automatic)", 0),
    ("Credit card (automatic)", 0),
];

pub const SERVING_CONTRACT_RISK: &[(&str, i64)] =
    &[("Month-to-month", 2), ("One year", 1), ("Two year", 0)];

const MONTH_TO_MONTH: &str = "Month-to-month";

fn lookup(table: &[(&str, i64)], key: &str) -> Option<i64> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Training: 1 for a risky method, else 0. Serving: 0–2 with a policy
/// fallback for unknown methods.
pub fn payment_method_risk(method: Option<&str>, mode: Mode, policy: &ServingPolicy) -> i64 {
    match mode {
        Mode::Training => method.map_or(0, |m| RISKY_PAYMENT_METHODS.contains(&m) as i64),
        Mode::Serving => method
            .and_then(|m| lookup(SERVING_PAYMENT_RISK, m))
            .unwrap_or(policy.unknown_payment_method_risk),
    }
}

/// Training: 1 for month-to-month, else 0. Serving: 0–2 by contract length;
/// unknown contracts take the policy level (highest by default).
pub fn contract_type_risk(contract: Option<&str>, mode: Mode, policy: &ServingPolicy) -> i64 {
    match mode {
        Mode::Training => (contract == Some(MONTH_TO_MONTH)) as i64,
        Mode::Serving => contract
            .and_then(|c| lookup(SERVING_CONTRACT_RISK, c))
            .unwrap_or(policy.unknown_contract_risk),
    }
}
