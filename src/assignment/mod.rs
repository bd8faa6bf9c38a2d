//! Deterministic user-to-variant assignment
//!
//! The engine is a pure computation over (experiment definition, user id,
//! context) apart from emitting an exposure event: no locks, safe under
//! arbitrary concurrency, and recomputing an assignment against an
//! unchanged definition always yields the same variant.
//!
//! ## Algorithm
//!
//! 1. Look up the experiment; anything but Active is a silent `None`.
//! 2. Traffic gate: hash the user id alone to [0, 1) and require the
//!    position to fall below the experiment's traffic allocation.
//! 3. Targeting gate: segment/platform allow-lists, applied only when a
//!    context is supplied.
//! 4. Variant bucketing: hash (user, experiment) to a fixed-precision
//!    bucket point and walk the variants' integer widths in stored order.
//!    The final variant absorbs rounding remainder, so cumulative widths
//!    always cover the span and a variant always matches.
//! 5. Emit an exposure event through the sink; a full queue is counted
//!    and logged, never surfaced to the caller.

mod hashing;
mod overrides;

pub use hashing::{bucket_point, fnv1a, traffic_position, unit_interval, BUCKET_BITS, BUCKET_SPAN};
pub use overrides::merge_overrides;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::experiment::{ExperimentStatus, ExperimentStore, Variant};
use crate::ledger::{Event, EventSink};

/// Request-scoped attributes evaluated by targeting rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssignmentContext {
    user_segment: Option<String>,
    platform: Option<String>,
}

impl AssignmentContext {
    /// Context with no attributes set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the user segment.
    #[must_use]
    pub fn user_segment(mut self, segment: impl Into<String>) -> Self {
        self.user_segment = Some(segment.into());
        self
    }

    /// Set the platform.
    #[must_use]
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    /// Get the user segment, if set.
    #[must_use]
    pub fn segment_value(&self) -> Option<&str> {
        self.user_segment.as_deref()
    }

    /// Get the platform, if set.
    #[must_use]
    pub fn platform_value(&self) -> Option<&str> {
        self.platform.as_deref()
    }
}

/// Outcome of bucketing a user into an experiment.
///
/// Handed to the caller, not persisted by the engine; the exposure event
/// is the durable trace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    user_id: String,
    experiment_id: String,
    variant_id: String,
    overrides: serde_json::Value,
    assigned_at: DateTime<Utc>,
}

impl Assignment {
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

    /// Get the selected variant id.
    #[must_use]
    pub fn variant_id(&self) -> &str {
        &self.variant_id
    }

    /// Get the variant's configuration payload, to be merged into the
    /// consumer's baseline via [`merge_overrides`].
    #[must_use]
    pub const fn overrides(&self) -> &serde_json::Value {
        &self.overrides
    }

    /// Get the assignment timestamp.
    #[must_use]
    pub const fn assigned_at(&self) -> DateTime<Utc> {
        self.assigned_at
    }
}

/// Deterministic assignment engine.
///
/// Reads experiment definitions from an injected [`ExperimentStore`]
/// snapshot and emits exposure events through an injected
/// [`EventSink`]; both are shared handles, so one engine serves
/// arbitrarily many concurrent callers.
pub struct AssignmentEngine {
    store: Arc<ExperimentStore>,
    exposures: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl AssignmentEngine {
    /// Create an engine over the given store, exposure sink, and clock.
    #[must_use]
    pub fn new(
        store: Arc<ExperimentStore>,
        exposures: Arc<dyn EventSink>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            exposures,
            clock,
        }
    }

    /// Assign `user_id` to a variant of `experiment_id`.
    ///
    /// Returns `None` when the experiment is missing or not Active, when
    /// the user falls outside the traffic allocation, or when the supplied
    /// context fails targeting. All of these are normal outcomes, not
    /// failures; nothing on this path raises an error.
    #[must_use]
    pub fn assign(
        &self,
        user_id: &str,
        experiment_id: &str,
        context: Option<&AssignmentContext>,
    ) -> Option<Assignment> {
        let experiment = self.store.get(experiment_id)?;
        if experiment.status() != ExperimentStatus::Active {
            return None;
        }

        if traffic_position(user_id) >= experiment.traffic_allocation() {
            debug!(user_id, experiment_id, "outside traffic allocation");
            return None;
        }

        if let Some(ctx) = context {
            if !experiment
                .targeting()
                .permits(ctx.segment_value(), ctx.platform_value())
            {
                debug!(user_id, experiment_id, "excluded by targeting");
                return None;
            }
        }

        let point = bucket_point(user_id, experiment_id);
        let variant = variant_for_point(experiment.variants(), point)?;

        let assignment = Assignment {
            user_id: user_id.to_string(),
            experiment_id: experiment_id.to_string(),
            variant_id: variant.id().to_string(),
            overrides: variant.overrides().clone(),
            assigned_at: self.clock.now(),
        };

        self.emit_exposure(&assignment);
        Some(assignment)
    }

    /// Exposure logging is best-effort relative to returning the
    /// assignment: a sink failure is logged and swallowed.
    fn emit_exposure(&self, assignment: &Assignment) {
        let event = Event::exposure(
            assignment.user_id(),
            assignment.experiment_id(),
            assignment.variant_id(),
            assignment.assigned_at(),
        );
        if let Err(err) = self.exposures.record(event) {
            warn!(
                user_id = assignment.user_id(),
                experiment_id = assignment.experiment_id(),
                %err,
                "dropped exposure event"
            );
        }
    }
}

/// Select the variant whose bucket interval contains `point`.
///
/// Each variant's allocation becomes an integer width over
/// [`BUCKET_SPAN`]; the final variant's boundary is the full span, so
/// every point lands in some interval and no fallback path exists.
fn variant_for_point(variants: &[Variant], point: u64) -> Option<&Variant> {
    let (last, head) = variants.split_last()?;
    let mut boundary = 0u64;
    for variant in head {
        boundary += hashing::allocation_width(variant.allocation());
        if point < boundary {
            return Some(variant);
        }
    }
    Some(last)
}
