//! Error types for cohort
//!
//! The taxonomy keeps the assignment path silent: lookup misses and
//! traffic/targeting exclusions are `None`, never errors. Typed errors are
//! reserved for experiment authoring, lifecycle operations, event
//! ingestion drops, and the analysis path.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Cohort error types
#[derive(Error, Debug)]
pub enum Error {
    /// Experiment definition violates one or more authoring rules
    #[error("invalid experiment definition: {}", .violations.join("; "))]
    Validation {
        /// Every violated rule, not just the first
        violations: Vec<String>,
    },

    /// Experiment absent where lookup failure is exceptional
    /// (lifecycle operations; the assignment path returns `None` instead)
    #[error("experiment not found: {0}")]
    NotFound(String),

    /// Lifecycle transition not permitted from the current status
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        /// Status the experiment is currently in
        from: String,
        /// Status the caller requested
        to: String,
    },

    /// Event could not be queued (ledger backpressure or writer stopped)
    #[error("event ingestion failed: {0}")]
    Ingestion(String),

    /// Analyzer input was insufficient or malformed
    #[error("analysis error: {0}")]
    Analysis(String),
}
