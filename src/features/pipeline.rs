//! Feature derivation: normalized table → engineered columns.
//! Deterministic; identical input and mode always give identical output.

use super::rules::{contract_type_risk, payment_method_risk, TenureBuckets};
use super::{
    FeatureTable, CONTRACT_TYPE_RISK, HIGH_MONTHLY_CHARGES_FLAG, MONTHLY_TO_TOTAL_RATIO,
    PAYMENT_METHOD_RISK, TENURE_BUCKET,
};
use crate::config::ServingPolicy;
use crate::error::{Result, SchemaError, Stage};
use crate::logging::{QualityEvent, QualitySink};
use crate::normalize::{fields, median, Mode, NormalizedTable, SERVING_REQUIRED};
use crate::table::{Column, Frame};

pub struct FeatureDeriver {
    policy: ServingPolicy,
}

impl FeatureDeriver {
    pub fn new(policy: ServingPolicy) -> Self {
        Self { policy }
    }

    /// Derive every engineered feature whose source columns are present.
    ///
    /// In training mode a feature with a missing source is skipped; in
    /// serving mode any missing source is a [`SchemaError::MissingColumns`].
    /// Engineered columns already in the input are recomputed in place.
    pub fn derive(
        &self,
        table: &NormalizedTable,
        mode: Mode,
        sink: &dyn QualitySink,
    ) -> Result<FeatureTable> {
        let mut frame = table.frame().clone();

        if mode == Mode::Serving {
            let missing: Vec<String> = SERVING_REQUIRED
                .iter()
                .filter(|c| !frame.contains(c))
                .map(|c| c.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(SchemaError::MissingColumns {
                    stage: Stage::Derive,
                    columns: missing,
                }
                .into());
            }
        }

        let derived = [
            tenure_bucket(&frame, mode, sink)?,
            monthly_to_total_ratio(&frame)?,
            self.high_monthly_charges_flag(&frame, mode)?,
            self.payment_method_risk(&frame, mode)?,
            self.contract_type_risk(&frame, mode)?,
        ];
        for column in derived.into_iter().flatten() {
            frame.upsert(column);
        }

        Ok(FeatureTable::new(frame, table.ids().map(<[_]>::to_vec)))
    }

    fn high_monthly_charges_flag(&self, frame: &Frame, mode: Mode) -> Result<Option<Column>> {
        let (Some(monthly), true) = (
            frame.column(fields::MONTHLY_CHARGES),
            frame.contains(fields::TOTAL_CHARGES),
        ) else {
            return Ok(None);
        };
        let monthly = monthly.as_numeric()?;
        let threshold = match mode {
            // Batch-relative: depends on every row in this batch
            Mode::Training => median(monthly.iter().copied()).unwrap_or(f64::INFINITY),
            Mode::Serving => self.policy.high_monthly_charges_threshold,
        };
        let flags = monthly.iter().map(|m| (*m > threshold) as i64).collect();
        Ok(Some(Column::ordinal(HIGH_MONTHLY_CHARGES_FLAG, flags)))
    }

    fn payment_method_risk(&self, frame: &Frame, mode: Mode) -> Result<Option<Column>> {
        let Some(column) = frame.column(fields::PAYMENT_METHOD) else {
            return Ok(None);
        };
        let risk = column
            .as_categorical()?
            .iter()
            .map(|m| payment_method_risk(m.as_deref(), mode, &self.policy))
            .collect();
        Ok(Some(Column::ordinal(PAYMENT_METHOD_RISK, risk)))
    }

    fn contract_type_risk(&self, frame: &Frame, mode: Mode) -> Result<Option<Column>> {
        let Some(column) = frame.column(fields::CONTRACT) else {
            return Ok(None);
        };
        let risk = column
            .as_categorical()?
            .iter()
            .map(|c| contract_type_risk(c.as_deref(), mode, &self.policy))
            .collect();
        Ok(Some(Column::ordinal(CONTRACT_TYPE_RISK, risk)))
    }
}

fn tenure_bucket(frame: &Frame, mode: Mode, sink: &dyn QualitySink) -> Result<Option<Column>> {
    let Some(tenure) = frame.column(fields::TENURE) else {
        return Ok(None);
    };
    let buckets = TenureBuckets::for_mode(mode);
    let labels: Vec<Option<String>> = tenure
        .as_numeric()?
        .iter()
        .map(|t| buckets.label(*t).map(str::to_string))
        .collect();

    let out_of_range = labels.iter().filter(|l| l.is_none()).count();
    if out_of_range > 0 {
        sink.record(QualityEvent::OutOfRange {
            column: TENURE_BUCKET.to_string(),
            count: out_of_range,
        });
    }
    Ok(Some(Column::categorical(TENURE_BUCKET, labels)))
}

/// MonthlyCharges / TotalCharges, with a zero total replaced by 1 so the
/// ratio equals MonthlyCharges for those rows.
fn monthly_to_total_ratio(frame: &Frame) -> Result<Option<Column>> {
    let (Some(monthly), Some(total)) = (
        frame.column(fields::MONTHLY_CHARGES),
        frame.column(fields::TOTAL_CHARGES),
    ) else {
        return Ok(None);
    };
    let ratio = monthly
        .as_numeric()?
        .iter()
        .zip(total.as_numeric()?)
        .map(|(m, t)| m / if *t == 0.0 { 1.0 } else { *t })
        .collect();
    Ok(Some(Column::numeric(MONTHLY_TO_TOTAL_RATIO, ratio)))
}
