//! Experiment Store - validated in-memory registry of experiment definitions
//!
//! The store is the read-mostly snapshot the assignment hot path runs
//! against. Durable persistence lives outside the crate; callers refresh
//! this cache with [`ExperimentStore::replace_all`] on an interval or
//! invalidate single entries with [`ExperimentStore::remove`].

use dashmap::DashMap;

use crate::error::{Error, Result};

use super::{Experiment, ExperimentStatus};

/// In-memory store for experiment definitions.
///
/// ## Design
///
/// A lock-free concurrent map keyed by experiment id. Writes validate the
/// full authoring rule set and collect every violation; reads clone the
/// definition so no lock outlives a call. Status changes go through
/// [`transition`](Self::transition), never through writes.
#[derive(Debug, Default)]
pub struct ExperimentStore {
    experiments: DashMap<String, Experiment>,
}

impl ExperimentStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of experiments in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Insert or update an experiment definition.
    ///
    /// New experiments always enter as Draft, whatever status the passed
    /// value carries; lifecycle changes are a separate explicit operation.
    /// Updating an experiment that has left Draft must preserve the stored
    /// ordered variant-id list, since reordering would silently rebucket
    /// users.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] listing every violated authoring rule.
    pub fn put(&self, mut experiment: Experiment) -> Result<()> {
        let mut violations = experiment.violations();

        let preserved_status = match self.experiments.get(experiment.id()) {
            Some(existing) => {
                if existing.status() != ExperimentStatus::Draft
                    && existing.variant_ids() != experiment.variant_ids()
                {
                    violations.push(
                        "variant order is frozen once an experiment leaves draft".to_string(),
                    );
                }
                existing.status()
            }
            None => ExperimentStatus::Draft,
        };

        if !violations.is_empty() {
            return Err(Error::Validation { violations });
        }

        experiment.set_status(preserved_status);
        self.experiments
            .insert(experiment.id().to_string(), experiment);
        Ok(())
    }

    /// Get an experiment by id.
    #[must_use]
    pub fn get(&self, experiment_id: &str) -> Option<Experiment> {
        self.experiments.get(experiment_id).map(|e| e.clone())
    }

    /// Get all experiments, ordered by id.
    #[must_use]
    pub fn list(&self) -> Vec<Experiment> {
        let mut experiments: Vec<Experiment> =
            self.experiments.iter().map(|e| e.value().clone()).collect();
        experiments.sort_by(|a, b| a.id().cmp(b.id()));
        experiments
    }

    /// Get all experiments currently serving assignments.
    #[must_use]
    pub fn list_active(&self) -> Vec<Experiment> {
        let mut experiments: Vec<Experiment> = self
            .experiments
            .iter()
            .filter(|e| e.status() == ExperimentStatus::Active)
            .map(|e| e.value().clone())
            .collect();
        experiments.sort_by(|a, b| a.id().cmp(b.id()));
        experiments
    }

    /// Move an experiment to a new lifecycle status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id and
    /// [`Error::InvalidTransition`] when the lifecycle forbids the move.
    pub fn transition(&self, experiment_id: &str, next: ExperimentStatus) -> Result<Experiment> {
        let mut entry = self
            .experiments
            .get_mut(experiment_id)
            .ok_or_else(|| Error::NotFound(experiment_id.to_string()))?;

        if !entry.status().can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: entry.status().to_string(),
                to: next.to_string(),
            });
        }

        entry.set_status(next);
        Ok(entry.clone())
    }

    /// Invalidate a single cached definition.
    pub fn remove(&self, experiment_id: &str) -> Option<Experiment> {
        self.experiments.remove(experiment_id).map(|(_, e)| e)
    }

    /// Refresh the whole cache from a durable snapshot.
    ///
    /// Statuses are taken as given: the durable source is authoritative
    /// for experiments that were activated in an earlier process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for the first invalid definition in
    /// the snapshot; the cache is left untouched on error.
    pub fn replace_all(&self, experiments: Vec<Experiment>) -> Result<()> {
        for experiment in &experiments {
            let violations = experiment.violations();
            if !violations.is_empty() {
                return Err(Error::Validation { violations });
            }
        }

        self.experiments.clear();
        for experiment in experiments {
            self.experiments
                .insert(experiment.id().to_string(), experiment);
        }
        Ok(())
    }
}
