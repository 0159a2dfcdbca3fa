use super::{ColumnOrigin, Encoding, TargetColumn, TargetSchema};
use crate::features::{is_engineered, FeatureTable, TENURE_BUCKET, TENURE_LABEL_ALIASES};
use crate::table::{Column, ColumnValues};
use std::collections::{BTreeMap, BTreeSet};

impl TargetSchema {
    /// Capture the layout of a training feature table: numeric and ordinal
    /// columns first, then categorical columns, each group in table order.
    /// Scaling uses the population mean/std; a zero std is stored as 1.
    /// Vocabularies are sorted and exclude missing categories.
    pub fn fit(table: &FeatureTable) -> Self {
        let columns = table.frame().columns();
        let numeric = columns.iter().filter(|c| c.dtype().is_numeric()).map(fit_scaled);
        let categorical = columns
            .iter()
            .filter(|c| !c.dtype().is_numeric())
            .map(fit_one_hot);
        Self::new(numeric.chain(categorical).collect())
    }
}

fn origin_of(name: &str) -> ColumnOrigin {
    if is_engineered(name) {
        ColumnOrigin::Engineered
    } else {
        ColumnOrigin::Input
    }
}

fn fit_scaled(column: &Column) -> TargetColumn {
    let values: Vec<f64> = (0..column.values.len())
        .filter_map(|row| column.values.number_at(row))
        .collect();
    let (mean, std) = if values.is_empty() {
        (0.0, 1.0)
    } else {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        (mean, if std > 0.0 { std } else { 1.0 })
    };
    TargetColumn {
        name: column.name.clone(),
        origin: origin_of(&column.name),
        encoding: Encoding::Scaled {
            dtype: column.dtype(),
            mean,
            std,
        },
    }
}

fn fit_one_hot(column: &Column) -> TargetColumn {
    let vocabulary: Vec<String> = match &column.values {
        ColumnValues::Categorical(values) => values
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        _ => Vec::new(),
    };
    let aliases: BTreeMap<String, String> = if column.name == TENURE_BUCKET {
        TENURE_LABEL_ALIASES
            .iter()
            .map(|(serving, training)| (serving.to_string(), training.to_string()))
            .collect()
    } else {
        BTreeMap::new()
    };
    TargetColumn {
        name: column.name.clone(),
        origin: origin_of(&column.name),
        encoding: Encoding::OneHot { vocabulary, aliases },
    }
}
