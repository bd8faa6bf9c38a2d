//! # Cohort: Deterministic A/B Experimentation Engine
//!
//! Cohort assigns users to experiment variants deterministically and
//! evaluates experiment outcomes with real two-sample statistics.
//!
//! ## Design
//!
//! - **Determinism**: traffic gating hashes the user id alone; variant
//!   bucketing hashes (user, experiment). Both use FNV-1a, which is fully
//!   specified and replayable from any implementation.
//! - **Exact bucketing**: variant allocations become integer widths over a
//!   fixed 2^32 span, so every hash point lands in a variant and no
//!   floating-point fallback path exists.
//! - **Non-blocking ingestion**: exposure/outcome events go through a
//!   bounded queue that sheds load rather than stalling assignment.
//! - **Out-of-band analysis**: significance, power, and decision reports
//!   run over aggregated samples, never inline with assignment.
//!
//! ## Example Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use cohort::assignment::AssignmentEngine;
//! use cohort::clock::SystemClock;
//! use cohort::experiment::{
//!     Experiment, ExperimentStatus, ExperimentStore, MetricDef, Variant, VariantRole,
//! };
//! use cohort::ledger::MemoryLedger;
//! use cohort::stats::MetricKind;
//!
//! # fn main() -> cohort::Result<()> {
//! let store = Arc::new(ExperimentStore::new());
//! store.put(
//!     Experiment::builder("exp-001", "Onboarding CTA")
//!         .variant(Variant::new("control", VariantRole::Control, 0.5))
//!         .variant(Variant::new("blue-button", VariantRole::Treatment, 0.5))
//!         .metric(MetricDef::primary("signup_rate", MetricKind::Proportion, "signup"))
//!         .build(),
//! )?;
//! store.transition("exp-001", ExperimentStatus::Active)?;
//!
//! let ledger = Arc::new(MemoryLedger::new());
//! let engine = AssignmentEngine::new(store, ledger, Arc::new(SystemClock));
//!
//! let assignment = engine.assign("user-42", "exp-001", None);
//! assert!(assignment.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod assignment;
pub mod clock;
pub mod error;
pub mod experiment;
pub mod ledger;
pub mod report;
pub mod stats;

pub use error::{Error, Result};
