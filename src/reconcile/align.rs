use super::{AlignedTable, ColumnOrigin, Encoding, TargetSchema};
use crate::error::{Result, SchemaError, Stage};
use crate::features::FeatureTable;
use crate::logging::{QualityEvent, QualitySink};
use crate::table::{Column, ColumnValues};
use ndarray::{Array2, ArrayViewMut2, Axis};
use std::collections::{BTreeMap, HashMap};

/// Applies a fitted [`TargetSchema`] to feature tables. Statistics are never
/// recomputed from the incoming batch.
pub struct SchemaReconciler<'a> {
    schema: &'a TargetSchema,
}

impl<'a> SchemaReconciler<'a> {
    pub fn new(schema: &'a TargetSchema) -> Self {
        Self { schema }
    }

    /// Produce the model matrix.
    ///
    /// Missing input-origin columns and dtype mismatches are fatal and are
    /// checked before any output is built. Missing engineered columns are
    /// zero-filled; unseen categories encode to an all-zero block.
    pub fn align(&self, table: &FeatureTable, sink: &dyn QualitySink) -> Result<AlignedTable> {
        let frame = table.frame();

        let mut missing = Vec::new();
        for target in &self.schema.columns {
            match frame.column(&target.name) {
                Some(column) if !target.encoding.accepts(column.dtype()) => {
                    return Err(SchemaError::DtypeMismatch {
                        column: target.name.clone(),
                        expected: target.encoding.expected().to_string(),
                        found: column.dtype().to_string(),
                    }
                    .into());
                }
                Some(_) => {}
                None if target.origin == ColumnOrigin::Input => missing.push(target.name.clone()),
                None => {}
            }
        }
        if !missing.is_empty() {
            return Err(SchemaError::MissingColumns {
                stage: Stage::Reconcile,
                columns: missing,
            }
            .into());
        }

        let mut matrix = Array2::<f64>::zeros((frame.len(), self.schema.width()));
        let mut offset = 0;
        for target in &self.schema.columns {
            let width = target.encoding.width();
            let block = matrix.slice_mut(ndarray::s![.., offset..offset + width]);
            offset += width;

            let Some(column) = frame.column(&target.name) else {
                sink.record(QualityEvent::ZeroFilled {
                    column: target.name.clone(),
                });
                continue;
            };
            match &target.encoding {
                Encoding::Scaled { mean, std, .. } => scale_into(column, *mean, *std, block),
                Encoding::OneHot {
                    vocabulary,
                    aliases,
                } => one_hot_into(column, vocabulary, aliases, block, sink),
            }
        }

        Ok(AlignedTable {
            feature_names: self.schema.feature_names(),
            matrix,
            ids: table.ids().map(<[_]>::to_vec),
        })
    }
}

fn scale_into(column: &Column, mean: f64, std: f64, mut block: ArrayViewMut2<'_, f64>) {
    for (row, mut out) in block.axis_iter_mut(Axis(0)).enumerate() {
        if let Some(v) = column.values.number_at(row) {
            out[0] = (v - mean) / std;
        }
    }
}

fn one_hot_into(
    column: &Column,
    vocabulary: &[String],
    aliases: &BTreeMap<String, String>,
    mut block: ArrayViewMut2<'_, f64>,
    sink: &dyn QualitySink,
) {
    let ColumnValues::Categorical(values) = &column.values else {
        return;
    };
    let slots: HashMap<&str, usize> = vocabulary
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();

    let mut unseen: BTreeMap<Option<&str>, usize> = BTreeMap::new();
    for (row, value) in values.iter().enumerate() {
        let value = value.as_deref();
        let resolved = value.map(|v| aliases.get(v).map(String::as_str).unwrap_or(v));
        match resolved.and_then(|v| slots.get(v)) {
            Some(slot) => block[[row, *slot]] = 1.0,
            None => *unseen.entry(value).or_default() += 1,
        }
    }

    for (value, count) in unseen {
        sink.record(QualityEvent::UnseenCategory {
            column: column.name.clone(),
            value: value.map(str::to_string),
            count,
        });
    }
}
