//! Field normalization: raw table → typed, fully imputed table.
//!
//! Training mode imputes from batch statistics (median / mode), so its output
//! depends on which rows are processed together. Serving mode imputes fixed
//! literals because a single-row request has no meaningful median. The two
//! modes are intentionally asymmetric.

mod impute;
mod schema;

pub use impute::{median, mode};
pub use schema::{fields, FieldKind, InputSchema, SERVING_REQUIRED};

use crate::config::ServingPolicy;
use crate::error::{Result, SchemaError, Stage};
use crate::logging::{ImputeStrategy, QualityEvent, QualitySink};
use crate::reconcile::TargetSchema;
use crate::table::{Column, Frame, RawTable, RawValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which pipeline a stage is running for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Offline batch used to fit a model
    Training,
    /// Scoring of uploaded or online batches
    Serving,
}

/// Output of [`Normalizer::normalize`]: typed columns with no missing values,
/// plus the identifier column carried aside for attribution.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    frame: Frame,
    ids: Option<Vec<RawValue>>,
}

impl NormalizedTable {
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

    pub fn into_parts(self) -> (Frame, Option<Vec<RawValue>>) {
        (self.frame, self.ids)
    }
}

const COERCION_SAMPLE: usize = 3;

pub struct Normalizer {
    schema: InputSchema,
    serving: ServingPolicy,
}

impl Normalizer {
    pub fn new(schema: InputSchema, serving: ServingPolicy) -> Self {
        Self { schema, serving }
    }

    pub fn schema(&self) -> &InputSchema {
        &self.schema
    }

    /// Normalizer whose declared kinds also cover the fitted layout's inputs.
    pub fn for_fitted(&self, fitted: &TargetSchema) -> Self {
        Self::new(self.schema.with_fitted(fitted), self.serving.clone())
    }

    pub fn normalize(
        &self,
        raw: &RawTable,
        mode: Mode,
        sink: &dyn QualitySink,
    ) -> Result<NormalizedTable> {
        raw.validate_shape()?;

        let names: Vec<String> = raw.columns.iter().map(|c| c.trim().to_string()).collect();
        let mut seen = HashSet::new();
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::DuplicateColumn(name.clone()).into());
            }
        }

        if mode == Mode::Serving {
            let missing: Vec<String> = SERVING_REQUIRED
                .iter()
                .filter(|req| !seen.contains(**req))
                .map(|req| req.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(SchemaError::MissingColumns {
                    stage: Stage::Normalize,
                    columns: missing,
                }
                .into());
            }
        }

        let mut frame = Frame::new(raw.len());
        let mut ids = None;

        for (idx, name) in names.iter().enumerate() {
            let cells = raw.rows.iter().map(|row| &row[idx]);
            if self.schema.is_id(name) {
                ids = Some(cells.cloned().collect());
                continue;
            }
            let kind = self
                .schema
                .kind_of(name)
                .unwrap_or_else(|| infer_kind(raw.rows.iter().map(|row| &row[idx])));
            let column = match kind {
                FieldKind::Numeric => {
                    let values = coerce_numeric(name, cells, sink);
                    Column::numeric(name.clone(), self.impute_numeric(name, values, mode, sink))
                }
                FieldKind::Categorical => {
                    let values = cells.map(RawValue::to_category).collect();
                    Column::categorical(
                        name.clone(),
                        self.impute_categorical(name, values, mode, sink),
                    )
                }
            };
            frame.upsert(column);
        }

        Ok(NormalizedTable::new(frame, ids))
    }

    fn impute_numeric(
        &self,
        column: &str,
        values: Vec<Option<f64>>,
        mode: Mode,
        sink: &dyn QualitySink,
    ) -> Vec<f64> {
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            return values.into_iter().flatten().collect();
        }

        let batch_median = match mode {
            Mode::Training => median(values.iter().flatten().copied()),
            Mode::Serving => None,
        };
        let (fill, strategy) = match batch_median {
            Some(m) => (m, ImputeStrategy::BatchMedian),
            None => (self.serving.numeric_default, ImputeStrategy::Default),
        };

        sink.record(QualityEvent::Imputed {
            column: column.to_string(),
            count: missing,
            strategy,
            value: fill.to_string(),
        });
        values.into_iter().map(|v| v.unwrap_or(fill)).collect()
    }

    fn impute_categorical(
        &self,
        column: &str,
        values: Vec<Option<String>>,
        mode: Mode,
        sink: &dyn QualitySink,
    ) -> Vec<Option<String>> {
        let missing = values.iter().filter(|v| v.is_none()).count();
        if missing == 0 {
            return values;
        }

        let batch_mode = match mode {
            Mode::Training => impute::mode(values.iter().flatten().map(String::as_str)),
            Mode::Serving => None,
        };
        let (fill, strategy) = match batch_mode {
            Some(m) => (m, ImputeStrategy::BatchMode),
            None => (self.serving.categorical_default.clone(), ImputeStrategy::Default),
        };

        sink.record(QualityEvent::Imputed {
            column: column.to_string(),
            count: missing,
            strategy,
            value: fill.clone(),
        });
        values
            .into_iter()
            .map(|v| Some(v.unwrap_or_else(|| fill.clone())))
            .collect()
    }
}

/// Kind of a column neither declared nor fitted: numeric only when every
/// present value already is a number.
fn infer_kind<'a>(mut cells: impl Iterator<Item = &'a RawValue>) -> FieldKind {
    if cells.all(|v| matches!(v, RawValue::Null | RawValue::Number(_))) {
        FieldKind::Numeric
    } else {
        FieldKind::Categorical
    }
}

fn coerce_numeric<'a>(
    column: &str,
    cells: impl Iterator<Item = &'a RawValue>,
    sink: &dyn QualitySink,
) -> Vec<Option<f64>> {
    let mut failed = 0;
    let mut sample = Vec::new();
    let values = cells
        .map(|cell| {
            let parsed = cell.to_number();
            if parsed.is_none() && !cell.is_null() {
                failed += 1;
                if sample.len() < COERCION_SAMPLE {
                    sample.push(cell.to_string());
                }
            }
            parsed
        })
        .collect();

    if failed > 0 {
        sink.record(QualityEvent::CoercionFailed {
            column: column.to_string(),
            count: failed,
            sample,
        });
    }
    values
}
