//! Schema reconciliation: a feature table is standardised, one-hot expanded
//! and reordered to exactly the layout recorded when the model was fitted.

mod align;
mod fit;

pub use align::SchemaReconciler;

use crate::normalize::FieldKind;
use crate::table::{DType, RawValue};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a target column comes from. Engineered columns may be absent from a
/// batch and are then zero-filled; input columns may not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOrigin {
    Input,
    Engineered,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Encoding {
    /// `(x - mean) / std` with fit-time statistics
    Scaled { dtype: DType, mean: f64, std: f64 },
    /// One slot per vocabulary entry; `aliases` rewrite a value before lookup
    OneHot {
        vocabulary: Vec<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        aliases: BTreeMap<String, String>,
    },
}

impl Encoding {
    pub fn width(&self) -> usize {
        match self {
            Encoding::Scaled { .. } => 1,
            Encoding::OneHot { vocabulary, .. } => vocabulary.len(),
        }
    }

    pub fn accepts(&self, dtype: DType) -> bool {
        match self {
            Encoding::Scaled { .. } => dtype.is_numeric(),
            Encoding::OneHot { .. } => dtype == DType::Categorical,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Encoding::Scaled { .. } => "numeric",
            Encoding::OneHot { .. } => "categorical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetColumn {
    pub name: String,
    pub origin: ColumnOrigin,
    pub encoding: Encoding,
}

/// Ordered column layout captured at fit time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetSchema {
    pub columns: Vec<TargetColumn>,
}

impl TargetSchema {
    pub fn new(columns: Vec<TargetColumn>) -> Self {
        Self { columns }
    }

    /// Total number of output features after one-hot expansion.
    pub fn width(&self) -> usize {
        self.columns.iter().map(|c| c.encoding.width()).sum()
    }

    /// Expanded feature names in output order: `name` for scaled columns,
    /// `name=value` for each one-hot slot.
    pub fn feature_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.width());
        for column in &self.columns {
            match &column.encoding {
                Encoding::Scaled { .. } => names.push(column.name.clone()),
                Encoding::OneHot { vocabulary, .. } => {
                    names.extend(vocabulary.iter().map(|v| format!("{}={}", column.name, v)))
                }
            }
        }
        names
    }

    pub fn column(&self, name: &str) -> Option<&TargetColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Field kind of every input-origin column, as seen at fit time.
    pub fn input_kinds(&self) -> impl Iterator<Item = (&str, FieldKind)> + '_ {
        self.columns
            .iter()
            .filter(|c| c.origin == ColumnOrigin::Input)
            .map(|c| {
                let kind = match c.encoding {
                    Encoding::Scaled { .. } => FieldKind::Numeric,
                    Encoding::OneHot { .. } => FieldKind::Categorical,
                };
                (c.name.as_str(), kind)
            })
    }
}

/// Model-ready matrix: one row per record, columns in target-schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedTable {
    pub feature_names: Vec<String>,
    pub matrix: Array2<f64>,
    pub ids: Option<Vec<RawValue>>,
}

impl AlignedTable {
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }
}
