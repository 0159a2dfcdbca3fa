//! Data-quality reporting. Recoverable anomalies (coercion failures,
//! imputations, unseen categories) are recorded here instead of raised.

use serde::Serialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    BatchMedian,
    BatchMode,
    /// Literal serving default, or the fallback for an all-null training column
    Default,
}

/// One aggregated data-quality observation for a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QualityEvent {
    /// Text in a numeric column that did not parse; the cells became missing.
    CoercionFailed {
        column: String,
        count: usize,
        sample: Vec<String>,
    },
    Imputed {
        column: String,
        count: usize,
        strategy: ImputeStrategy,
        value: String,
    },
    /// Values that fell outside every bucket and became a missing category.
    OutOfRange { column: String, count: usize },
    /// A category (or a missing category when `value` is `None`) outside the
    /// fit-time vocabulary; encoded as all zeros.
    UnseenCategory {
        column: String,
        value: Option<String>,
        count: usize,
    },
    /// An engineered column absent from the batch, reconstructed as zeros.
    ZeroFilled { column: String },
}

impl QualityEvent {
    pub fn column(&self) -> &str {
        match self {
            QualityEvent::CoercionFailed { column, .. }
            | QualityEvent::Imputed { column, .. }
            | QualityEvent::OutOfRange { column, .. }
            | QualityEvent::UnseenCategory { column, .. }
            | QualityEvent::ZeroFilled { column } => column,
        }
    }
}

/// Receiver for data-quality events. Passed into each stage explicitly.
pub trait QualitySink: Send + Sync {
    fn record(&self, event: QualityEvent);
}

/// Forwards events to `tracing` as structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl QualitySink for TracingSink {
    fn record(&self, event: QualityEvent) {
        match &event {
            QualityEvent::CoercionFailed { column, count, sample } => {
                tracing::warn!(column = %column, count, sample = ?sample, "numeric coercion failed");
            }
            QualityEvent::Imputed { column, count, strategy, value } => {
                tracing::info!(column = %column, count, strategy = ?strategy, value = %value, "imputed missing values");
            }
            QualityEvent::OutOfRange { column, count } => {
                tracing::warn!(column = %column, count, "values outside bucket range");
            }
            QualityEvent::UnseenCategory { column, value, count } => {
                tracing::warn!(column = %column, value = ?value, count, "category outside fitted vocabulary");
            }
            QualityEvent::ZeroFilled { column } => {
                tracing::warn!(column = %column, "engineered column absent; zero-filled");
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl QualitySink for NullSink {
    fn record(&self, _event: QualityEvent) {}
}

/// Keeps events in memory, for reports and tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<QualityEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<QualityEvent> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn take(&self) -> Vec<QualityEvent> {
        self.events
            .lock()
            .map(|mut e| std::mem::take(&mut *e))
            .unwrap_or_default()
    }
}

impl QualitySink for CollectingSink {
    fn record(&self, event: QualityEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
