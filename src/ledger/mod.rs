//! Exposure and outcome event ledger
//!
//! Append-only, at-least-once record of what each user saw and did.
//! Ingestion never blocks the assignment path: the production wiring puts
//! a [`BufferedLedger`] (bounded queue + background writer) in front of a
//! [`MemoryLedger`] or an external sink. Duplicate delivery is tolerated;
//! aggregation deduplicates by user and, for outcome events, by an
//! optional idempotency key.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use cohort::ledger::{Event, EventSink, MemoryLedger};
//!
//! # fn main() -> cohort::Result<()> {
//! let ledger = MemoryLedger::new();
//!
//! ledger.record(Event::exposure("user-1", "exp-001", "control", Utc::now()))?;
//! ledger.record(
//!     Event::new("user-1", "exp-001", "control", "signup", Utc::now())
//!         .with_dedup_key("order-77"),
//! )?;
//!
//! assert_eq!(ledger.len(), 2);
//! # Ok(())
//! # }
//! ```

mod buffered;
mod memory;

pub use buffered::BufferedLedger;
pub use memory::MemoryLedger;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::experiment::MetricDef;
use crate::stats::{MetricKind, MetricSample};

/// Event name recorded when a user is bucketed into a variant.
pub const EXPOSURE_EVENT: &str = "exposure";

/// A single exposure or outcome observation. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    user_id: String,
    experiment_id: String,
    variant_id: String,
    name: String,
    value: Option<f64>,
    payload: serde_json::Value,
    timestamp: DateTime<Utc>,
    dedup_key: Option<String>,
}

impl Event {
    /// Create an outcome event.
    ///
    /// # Arguments
    ///
    /// * `user_id` - User the event belongs to
    /// * `experiment_id` - Experiment it correlates with
    /// * `variant_id` - Variant the user was assigned
    /// * `name` - Event name (matched against [`MetricDef::event`])
    /// * `timestamp` - Instant supplied by the caller's clock
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        name: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            experiment_id: experiment_id.into(),
            variant_id: variant_id.into(),
            name: name.into(),
            value: None,
            payload: serde_json::Value::Null,
            timestamp,
            dedup_key: None,
        }
    }

    /// Create an exposure event.
    #[must_use]
    pub fn exposure(
        user_id: impl Into<String>,
        experiment_id: impl Into<String>,
        variant_id: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(user_id, experiment_id, variant_id, EXPOSURE_EVENT, timestamp)
    }

    /// Attach a numeric outcome (continuous metrics).
    #[must_use]
    pub const fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Attach an opaque payload.
    #[must_use]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Attach an idempotency key; redelivered events sharing a key are
    /// collapsed at aggregation time.
    #[must_use]
    pub fn with_dedup_key(mut self, key: impl Into<String>) -> Self {
        self.dedup_key = Some(key.into());
        self
    }

    /// Get the user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Get the experiment id.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the variant id.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the event name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the numeric outcome, if any.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        self.value
    }

    /// Get the opaque payload.
    #[must_use]
    pub const fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Get the event timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the idempotency key, if any.
    #[must_use]
    pub fn dedup_key(&self) -> Option<&str> {
        self.dedup_key.as_deref()
    }
}

/// Destination for events.
///
/// `record` must be non-blocking and cheap: it runs on the assignment
/// path. Implementations are append-only and at-least-once.
pub trait EventSink: Send + Sync {
    /// Append an event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Ingestion`](crate::Error::Ingestion) when the
    /// event could not be accepted (queue saturation, writer stopped).
    /// Assignment-path callers log and swallow this.
    fn record(&self, event: Event) -> Result<()>;
}

/// Per-variant aggregate for one metric.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VariantAggregate {
    sample_size: u64,
    observed_value: f64,
    variance: f64,
}

impl VariantAggregate {
    pub(crate) const fn new(sample_size: u64, observed_value: f64, variance: f64) -> Self {
        Self {
            sample_size,
            observed_value,
            variance,
        }
    }

    /// Number of observations (distinct exposed users for proportion
    /// metrics, deduplicated outcome events for continuous ones).
    #[must_use]
    pub const fn sample_size(&self) -> u64 {
        self.sample_size
    }

    /// Observed rate (proportion) or mean (continuous).
    #[must_use]
    pub const fn observed_value(&self) -> f64 {
        self.observed_value
    }

    /// Sample variance of the observations.
    #[must_use]
    pub const fn variance(&self) -> f64 {
        self.variance
    }
}

/// Aggregation result for one (experiment, metric) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Aggregate {
    experiment_id: String,
    metric_key: String,
    kind: MetricKind,
    per_variant: BTreeMap<String, VariantAggregate>,
}

impl Aggregate {
    pub(crate) fn new(
        experiment_id: impl Into<String>,
        metric: &MetricDef,
        per_variant: BTreeMap<String, VariantAggregate>,
    ) -> Self {
        Self {
            experiment_id: experiment_id.into(),
            metric_key: metric.key().to_string(),
            kind: metric.kind(),
            per_variant,
        }
    }

    /// Get the experiment id.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the metric key.
    #[must_use]
    pub fn metric_key(&self) -> &str {
        &self.metric_key
    }

    /// Get the metric kind.
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Get the per-variant aggregates, ordered by variant id.
    #[must_use]
    pub const fn per_variant(&self) -> &BTreeMap<String, VariantAggregate> {
        &self.per_variant
    }

    /// Get one variant's aggregate.
    #[must_use]
    pub fn variant(&self, variant_id: &str) -> Option<&VariantAggregate> {
        self.per_variant.get(variant_id)
    }

    /// Convert one variant's aggregate into an analyzer input sample.
    #[must_use]
    pub fn sample(&self, variant_id: &str) -> Option<MetricSample> {
        self.per_variant.get(variant_id).map(|agg| match self.kind {
            MetricKind::Proportion => {
                MetricSample::proportion(agg.sample_size(), agg.observed_value())
            }
            MetricKind::Continuous => {
                MetricSample::continuous(agg.sample_size(), agg.observed_value(), agg.variance())
            }
        })
    }
}
