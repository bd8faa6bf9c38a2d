//! Experiment definition - variants, targeting, metrics, lifecycle status

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::MetricKind;

/// Lifecycle status of an experiment.
///
/// Transitions are explicit operator actions performed through
/// [`ExperimentStore::transition`](super::ExperimentStore::transition),
/// never implicit side effects of store writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperimentStatus {
    /// Created but not yet serving assignments.
    Draft,
    /// Serving assignments.
    Active,
    /// Temporarily not serving; can return to Active.
    Paused,
    /// Finished normally. Terminal.
    Completed,
    /// Abandoned. Terminal.
    Cancelled,
}

impl ExperimentStatus {
    /// Whether no further transitions are permitted.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the lifecycle permits moving to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Active | Self::Cancelled)
                | (Self::Active, Self::Paused | Self::Completed | Self::Cancelled)
                | (Self::Paused, Self::Active | Self::Completed | Self::Cancelled)
        )
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Role of a variant within its experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantRole {
    /// Baseline the treatments are measured against.
    Control,
    /// Candidate behavior under test.
    Treatment,
}

/// Which direction of movement on a metric counts as an improvement.
///
/// The analyzer reports raw effect sizes; callers label direction using
/// this, e.g. completion time improves by decreasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementDirection {
    /// Larger observed values are better (conversion, score).
    Increase,
    /// Smaller observed values are better (completion time, error rate).
    Decrease,
}

/// One arm of an experiment.
///
/// The ordered list of variant ids within an experiment is frozen once the
/// experiment leaves Draft: reordering would change bucketing outcomes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Variant {
    id: String,
    role: VariantRole,
    allocation: f64,
    overrides: serde_json::Value,
}

impl Variant {
    /// Create a variant with no configuration overrides.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier, unique within the experiment
    /// * `role` - Control or Treatment
    /// * `allocation` - Relative share of bucketed users, in (0, 1]
    #[must_use]
    pub fn new(id: impl Into<String>, role: VariantRole, allocation: f64) -> Self {
        Self {
            id: id.into(),
            role,
            allocation,
            overrides: serde_json::Value::Null,
        }
    }

    /// Attach the opaque configuration payload the consuming flow merges
    /// into its own baseline (see [`merge_overrides`](crate::assignment::merge_overrides)).
    #[must_use]
    pub fn with_overrides(mut self, overrides: serde_json::Value) -> Self {
        self.overrides = overrides;
        self
    }

    /// Get the variant id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the variant role.
    #[must_use]
    pub const fn role(&self) -> VariantRole {
        self.role
    }

    /// Get the relative allocation in (0, 1].
    #[must_use]
    pub const fn allocation(&self) -> f64 {
        self.allocation
    }

    /// Get the configuration overrides payload.
    #[must_use]
    pub const fn overrides(&self) -> &serde_json::Value {
        &self.overrides
    }

    /// Whether this variant is the control arm.
    #[must_use]
    pub fn is_control(&self) -> bool {
        self.role == VariantRole::Control
    }
}

/// Metric tracked by an experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetricDef {
    key: String,
    kind: MetricKind,
    event: String,
    primary: bool,
    improvement: ImprovementDirection,
}

impl MetricDef {
    /// Create the primary decision metric. Exactly one per experiment.
    #[must_use]
    pub fn primary(key: impl Into<String>, kind: MetricKind, event: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            event: event.into(),
            primary: true,
            improvement: ImprovementDirection::Increase,
        }
    }

    /// Create a secondary (guardrail/diagnostic) metric.
    #[must_use]
    pub fn secondary(key: impl Into<String>, kind: MetricKind, event: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            kind,
            event: event.into(),
            primary: false,
            improvement: ImprovementDirection::Increase,
        }
    }

    /// Set the improvement direction (default: Increase).
    #[must_use]
    pub const fn with_improvement(mut self, improvement: ImprovementDirection) -> Self {
        self.improvement = improvement;
        self
    }

    /// Get the metric key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Get the metric kind (proportion or continuous).
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Get the outcome event name that feeds this metric.
    #[must_use]
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Whether this is the primary decision metric.
    #[must_use]
    pub const fn is_primary(&self) -> bool {
        self.primary
    }

    /// Get the improvement direction.
    #[must_use]
    pub const fn improvement(&self) -> ImprovementDirection {
        self.improvement
    }
}

/// Eligibility filters applied before bucketing.
///
/// A dimension with an empty filter list is undeclared and passes
/// everything; a list containing the literal `"all"` wildcard also passes
/// everything; otherwise the observed context value must appear in the
/// allow-list. A specific filter with no observed value blocks inclusion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Targeting {
    user_segments: Vec<String>,
    platforms: Vec<String>,
}

impl Targeting {
    /// Literal wildcard value that passes any observed context.
    pub const WILDCARD: &'static str = "all";

    /// Targeting with no declared dimensions (everyone eligible).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to the given user segments.
    #[must_use]
    pub fn allow_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.user_segments = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict to the given platforms.
    #[must_use]
    pub fn allow_platforms<I, S>(mut self, platforms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.platforms = platforms.into_iter().map(Into::into).collect();
        self
    }

    /// Get the user-segment allow-list.
    #[must_use]
    pub fn user_segments(&self) -> &[String] {
        &self.user_segments
    }

    /// Get the platform allow-list.
    #[must_use]
    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    /// Whether a user with the observed segment/platform is eligible.
    #[must_use]
    pub fn permits(&self, segment: Option<&str>, platform: Option<&str>) -> bool {
        Self::dimension_permits(&self.user_segments, segment)
            && Self::dimension_permits(&self.platforms, platform)
    }

    fn dimension_permits(filter: &[String], observed: Option<&str>) -> bool {
        if filter.is_empty() || filter.iter().any(|f| f == Self::WILDCARD) {
            return true;
        }
        observed.is_some_and(|value| filter.iter().any(|f| f == value))
    }
}

/// Experiment definition: variants, traffic allocation, targeting, metrics.
///
/// Construct through [`Experiment::builder`]; authoring rules are enforced
/// when the definition is written to an
/// [`ExperimentStore`](super::ExperimentStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Experiment {
    id: String,
    name: String,
    status: ExperimentStatus,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    traffic_allocation: f64,
    variants: Vec<Variant>,
    targeting: Targeting,
    metrics: Vec<MetricDef>,
}

impl Experiment {
    /// Create a builder for an experiment definition.
    #[must_use]
    pub fn builder(id: impl Into<String>, name: impl Into<String>) -> ExperimentBuilder {
        ExperimentBuilder::new(id, name)
    }

    /// Get the experiment id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> ExperimentStatus {
        self.status
    }

    pub(crate) fn set_status(&mut self, status: ExperimentStatus) {
        self.status = status;
    }

    /// Get the scheduled start, if any.
    #[must_use]
    pub const fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    /// Get the scheduled end, if any.
    #[must_use]
    pub const fn ends_at(&self) -> Option<DateTime<Utc>> {
        self.ends_at
    }

    /// Get the fraction of all users participating at all, in (0, 1].
    #[must_use]
    pub const fn traffic_allocation(&self) -> f64 {
        self.traffic_allocation
    }

    /// Get the variants in their stable bucketing order.
    #[must_use]
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Look up a variant by id.
    #[must_use]
    pub fn variant(&self, id: &str) -> Option<&Variant> {
        self.variants.iter().find(|v| v.id() == id)
    }

    /// Get the targeting rules.
    #[must_use]
    pub const fn targeting(&self) -> &Targeting {
        &self.targeting
    }

    /// Get the metric definitions.
    #[must_use]
    pub fn metrics(&self) -> &[MetricDef] {
        &self.metrics
    }

    /// Get the primary decision metric, if declared.
    #[must_use]
    pub fn primary_metric(&self) -> Option<&MetricDef> {
        self.metrics.iter().find(|m| m.is_primary())
    }

    /// Check the definition against every authoring rule.
    ///
    /// Returns all violations, not just the first, so a caller fixing an
    /// invalid definition sees the complete list in one round trip.
    #[must_use]
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push("name must not be empty".to_string());
        }

        if self.variants.len() < 2 {
            violations.push("experiment requires at least two variants".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for variant in &self.variants {
            if !seen.insert(variant.id()) {
                violations.push(format!("duplicate variant id '{}'", variant.id()));
            }
            if variant.allocation() <= 0.0 || variant.allocation() > 1.0 {
                violations.push(format!(
                    "variant '{}' allocation must be in (0, 1], got {}",
                    variant.id(),
                    variant.allocation()
                ));
            }
        }

        if !self.variants.is_empty() {
            let sum: f64 = self.variants.iter().map(Variant::allocation).sum();
            if (sum - 1.0).abs() > 0.01 {
                violations.push(format!(
                    "variant allocations must sum to 1.0, got {sum:.3}"
                ));
            }
            if !self.variants.iter().any(Variant::is_control) {
                violations.push("at least one variant must have the control role".to_string());
            }
        }

        if self.traffic_allocation <= 0.0 || self.traffic_allocation > 1.0 {
            violations.push(format!(
                "traffic allocation must be in (0, 1], got {}",
                self.traffic_allocation
            ));
        }

        if self.metrics.is_empty() {
            violations.push("experiment requires at least one metric".to_string());
        } else {
            let primaries = self.metrics.iter().filter(|m| m.is_primary()).count();
            if primaries != 1 {
                violations.push(format!(
                    "exactly one metric must be primary, got {primaries}"
                ));
            }
        }

        violations
    }

    /// Ordered variant ids, for the frozen-order check on updates.
    #[must_use]
    pub fn variant_ids(&self) -> Vec<&str> {
        self.variants.iter().map(Variant::id).collect()
    }
}

/// Builder for [`Experiment`].
#[derive(Debug)]
pub struct ExperimentBuilder {
    id: String,
    name: String,
    status: ExperimentStatus,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    traffic_allocation: f64,
    variants: Vec<Variant>,
    targeting: Targeting,
    metrics: Vec<MetricDef>,
}

impl ExperimentBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: ExperimentStatus::Draft,
            starts_at: None,
            ends_at: None,
            traffic_allocation: 1.0,
            variants: Vec::new(),
            targeting: Targeting::default(),
            metrics: Vec::new(),
        }
    }

    /// Append a variant. Order is significant: it becomes the stable
    /// bucketing order.
    #[must_use]
    pub fn variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Set the traffic allocation fraction (default 1.0).
    #[must_use]
    pub const fn traffic_allocation(mut self, fraction: f64) -> Self {
        self.traffic_allocation = fraction;
        self
    }

    /// Set the targeting rules (default: everyone eligible).
    #[must_use]
    pub fn targeting(mut self, targeting: Targeting) -> Self {
        self.targeting = targeting;
        self
    }

    /// Append a metric definition.
    #[must_use]
    pub fn metric(mut self, metric: MetricDef) -> Self {
        self.metrics.push(metric);
        self
    }

    /// Set the scheduled start.
    #[must_use]
    pub const fn starts_at(mut self, at: DateTime<Utc>) -> Self {
        self.starts_at = Some(at);
        self
    }

    /// Set the scheduled end.
    #[must_use]
    pub const fn ends_at(mut self, at: DateTime<Utc>) -> Self {
        self.ends_at = Some(at);
        self
    }

    /// Set the initial status.
    ///
    /// [`ExperimentStore::put`](super::ExperimentStore::put) resets new
    /// experiments to Draft regardless; this is for seeding a store from a
    /// durable snapshot via
    /// [`ExperimentStore::replace_all`](super::ExperimentStore::replace_all).
    #[must_use]
    pub const fn status(mut self, status: ExperimentStatus) -> Self {
        self.status = status;
        self
    }

    /// Build the [`Experiment`].
    #[must_use]
    pub fn build(self) -> Experiment {
        Experiment {
            id: self.id,
            name: self.name,
            status: self.status,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            traffic_allocation: self.traffic_allocation,
            variants: self.variants,
            targeting: self.targeting,
            metrics: self.metrics,
        }
    }
}
