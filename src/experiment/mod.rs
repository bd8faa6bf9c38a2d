//! Experiment definitions and their in-memory store
//!
//! This module provides the data model for A/B experiments and the
//! validated registry the assignment engine reads from.
//!
//! ## Schema Overview
//!
//! ```text
//! Experiment (1) ──< Variant (N, ordered: bucketing order is frozen
//!     │                        once the experiment leaves Draft)
//!     ├──  Targeting   [segment/platform allow-lists]
//!     └──< MetricDef   [one primary, zero or more secondary]
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use cohort::experiment::{
//!     Experiment, ExperimentStatus, ExperimentStore, MetricDef, Variant, VariantRole,
//! };
//! use cohort::stats::MetricKind;
//!
//! # fn main() -> cohort::Result<()> {
//! let store = ExperimentStore::new();
//!
//! let experiment = Experiment::builder("exp-001", "Onboarding CTA")
//!     .variant(Variant::new("control", VariantRole::Control, 0.5))
//!     .variant(Variant::new("blue-button", VariantRole::Treatment, 0.5))
//!     .metric(MetricDef::primary("signup_rate", MetricKind::Proportion, "signup"))
//!     .build();
//!
//! store.put(experiment)?;
//! store.transition("exp-001", ExperimentStatus::Active)?;
//! # Ok(())
//! # }
//! ```

mod definition;
mod store;

pub use definition::{
    Experiment, ExperimentBuilder, ExperimentStatus, ImprovementDirection, MetricDef, Targeting,
    Variant, VariantRole,
};
pub use store::ExperimentStore;
