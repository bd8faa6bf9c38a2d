//! In-memory ledger implementation using `DashMap`.
//!
//! This is the default backend - events are lost on process restart.
//! Durable ledgers live behind the same [`EventSink`] contract outside
//! the crate.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::Result;
use crate::experiment::MetricDef;
use crate::stats::MetricKind;

use super::{Aggregate, Event, EventSink, VariantAggregate, EXPOSURE_EVENT};

/// In-memory append-only event store with windowed aggregation.
///
/// Events are partitioned by experiment id in a lock-free concurrent map,
/// so writers from many assignment calls append without contending with
/// readers aggregating another experiment.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    events: DashMap<String, Vec<Event>>,
}

impl MemoryLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of recorded events across all experiments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    /// Check if the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get all events recorded for an experiment, in arrival order.
    #[must_use]
    pub fn events_for(&self, experiment_id: &str) -> Vec<Event> {
        self.events
            .get(experiment_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Aggregate one metric over an experiment's events.
    ///
    /// `window` is a half-open `[start, end)` interval; `None` aggregates
    /// everything recorded so far.
    ///
    /// For proportion metrics the sample size is the count of distinct
    /// exposed users per variant and the observed value is the fraction of
    /// them that produced the metric's outcome event; distinct-user
    /// counting makes redelivered events harmless. For continuous metrics
    /// each outcome event is one observation, deduplicated by
    /// `(user, dedup_key)` when an idempotency key is present, and the
    /// aggregate carries the sample mean and variance.
    #[must_use]
    pub fn aggregate(
        &self,
        experiment_id: &str,
        metric: &MetricDef,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Aggregate {
        let per_variant = self.events.get(experiment_id).map_or_else(
            BTreeMap::new,
            |entry| match metric.kind() {
                MetricKind::Proportion => aggregate_proportion(entry.value(), metric, window),
                MetricKind::Continuous => aggregate_continuous(entry.value(), metric, window),
            },
        );
        Aggregate::new(experiment_id, metric, per_variant)
    }
}

impl EventSink for MemoryLedger {
    fn record(&self, event: Event) -> Result<()> {
        self.events
            .entry(event.experiment_id().to_string())
            .or_default()
            .push(event);
        Ok(())
    }
}

fn in_window(event: &Event, window: Option<(DateTime<Utc>, DateTime<Utc>)>) -> bool {
    window.map_or(true, |(start, end)| {
        event.timestamp() >= start && event.timestamp() < end
    })
}

fn aggregate_proportion(
    events: &[Event],
    metric: &MetricDef,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> BTreeMap<String, VariantAggregate> {
    let mut exposed: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    let mut converted: HashMap<&str, HashSet<&str>> = HashMap::new();

    for event in events.iter().filter(|e| in_window(e, window)) {
        if event.name() == EXPOSURE_EVENT {
            exposed
                .entry(event.variant_id())
                .or_default()
                .insert(event.user_id());
        } else if event.name() == metric.event() {
            converted
                .entry(event.variant_id())
                .or_default()
                .insert(event.user_id());
        }
    }

    exposed
        .into_iter()
        .map(|(variant, users)| {
            let conversions = converted.get(variant).map_or(0, |converters| {
                // Only conversions from users we saw exposed count.
                converters.intersection(&users).count()
            });
            let sample_size = users.len() as u64;
            #[allow(clippy::cast_precision_loss)]
            let rate = if sample_size == 0 {
                0.0
            } else {
                conversions as f64 / sample_size as f64
            };
            let aggregate = VariantAggregate::new(sample_size, rate, rate * (1.0 - rate));
            (variant.to_string(), aggregate)
        })
        .collect()
}

fn aggregate_continuous(
    events: &[Event],
    metric: &MetricDef,
    window: Option<(DateTime<Utc>, DateTime<Utc>)>,
) -> BTreeMap<String, VariantAggregate> {
    let mut observations: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();

    for event in events.iter().filter(|e| in_window(e, window)) {
        if event.name() != metric.event() {
            continue;
        }
        let Some(value) = event.value() else {
            continue;
        };
        if let Some(key) = event.dedup_key() {
            if !seen.insert((event.variant_id(), event.user_id(), key)) {
                continue;
            }
        }
        observations.entry(event.variant_id()).or_default().push(value);
    }

    observations
        .into_iter()
        .map(|(variant, values)| {
            #[allow(clippy::cast_precision_loss)]
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            // Sample variance with Bessel's correction; zero for n < 2.
            let variance = if values.len() < 2 {
                0.0
            } else {
                values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0)
            };
            let aggregate = VariantAggregate::new(values.len() as u64, mean, variance);
            (variant.to_string(), aggregate)
        })
        .collect()
}
