//! Decision reports and business-impact projection
//!
//! The generator is a pure function of its inputs: the same metric
//! outcomes and impact configuration always produce the same report, so
//! re-running an analysis is idempotent. Reports carry no wall-clock
//! timestamp for the same reason; callers stamp them externally if needed.
//!
//! # Example
//!
//! ```rust
//! use cohort::experiment::ImprovementDirection;
//! use cohort::report::{ImpactConfig, MetricOutcome, Recommendation, ReportGenerator};
//! use cohort::stats::{compare, AnalysisConfig, MetricKind, MetricSample};
//!
//! # fn main() -> cohort::Result<()> {
//! let result = compare(
//!     &MetricSample::proportion(1250, 0.72),
//!     &MetricSample::proportion(1280, 0.78),
//!     MetricKind::Proportion,
//!     &AnalysisConfig::default(),
//! )?;
//!
//! let generator = ReportGenerator::new(ImpactConfig::new(4.0, 120_000));
//! let report = generator.generate(
//!     "exp-001",
//!     &[MetricOutcome::primary("signup_rate", ImprovementDirection::Increase, result)],
//! )?;
//!
//! assert_eq!(report.recommendation(), Recommendation::ImplementTreatment);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::experiment::ImprovementDirection;
use crate::stats::SignificanceResult;

/// What to do with the experiment, derived from the primary metric alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Primary metric is significant and the effect favors treatment.
    ImplementTreatment,
    /// Primary metric is significant and the effect favors control.
    KeepControl,
    /// No significant primary result yet; keep collecting.
    ContinueMonitoring,
}

/// Business inputs for the impact projection. External configuration,
/// never hardcoded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactConfig {
    value_per_conversion: f64,
    traffic_volume: u64,
}

impl ImpactConfig {
    /// Create an impact configuration.
    ///
    /// # Arguments
    ///
    /// * `value_per_conversion` - Average value of one converted user
    /// * `traffic_volume` - Eligible users per projection period
    #[must_use]
    pub const fn new(value_per_conversion: f64, traffic_volume: u64) -> Self {
        Self {
            value_per_conversion,
            traffic_volume,
        }
    }

    /// Get the average value per conversion.
    #[must_use]
    pub const fn value_per_conversion(&self) -> f64 {
        self.value_per_conversion
    }

    /// Get the projection-period traffic volume.
    #[must_use]
    pub const fn traffic_volume(&self) -> u64 {
        self.traffic_volume
    }
}

/// Projected business impact of shipping the treatment, derived from the
/// primary metric's relative lift over the configured traffic volume.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactProjection {
    relative_lift: f64,
    additional_conversions: f64,
    projected_value: f64,
}

impl ImpactProjection {
    /// Get the primary metric's relative lift.
    #[must_use]
    pub const fn relative_lift(&self) -> f64 {
        self.relative_lift
    }

    /// Additional conversions per projection period
    /// (`traffic * control_rate * lift`).
    #[must_use]
    pub const fn additional_conversions(&self) -> f64 {
        self.additional_conversions
    }

    /// Additional conversions priced at the configured value each.
    #[must_use]
    pub const fn projected_value(&self) -> f64 {
        self.projected_value
    }
}

/// One metric's significance result, labeled the way the analyzer cannot
/// label it itself: with its key, whether it is the primary decision
/// metric, and which direction counts as an improvement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricOutcome {
    metric: String,
    primary: bool,
    improvement: ImprovementDirection,
    result: SignificanceResult,
}

impl MetricOutcome {
    /// Label a primary metric's result.
    #[must_use]
    pub fn primary(
        metric: impl Into<String>,
        improvement: ImprovementDirection,
        result: SignificanceResult,
    ) -> Self {
        Self {
            metric: metric.into(),
            primary: true,
            improvement,
            result,
        }
    }

    /// Label a secondary metric's result.
    #[must_use]
    pub fn secondary(
        metric: impl Into<String>,
        improvement: ImprovementDirection,
        result: SignificanceResult,
    ) -> Self {
        Self {
            metric: metric.into(),
            primary: false,
            improvement,
            result,
        }
    }

    /// Get the metric key.
    #[must_use]
    pub fn metric(&self) -> &str {
        &self.metric
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

    /// Get the significance result.
    #[must_use]
    pub const fn result(&self) -> &SignificanceResult {
        &self.result
    }

    /// Whether the observed effect moves the metric in its improving
    /// direction.
    #[must_use]
    pub fn favors_treatment(&self) -> bool {
        match self.improvement {
            ImprovementDirection::Increase => self.result.effect_size() > 0.0,
            ImprovementDirection::Decrease => self.result.effect_size() < 0.0,
        }
    }
}

/// Decision report for an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    experiment_id: String,
    recommendation: Recommendation,
    primary_metric: String,
    outcomes: Vec<MetricOutcome>,
    impact: Option<ImpactProjection>,
}

impl Report {
    /// Get the experiment id.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the recommendation.
    #[must_use]
    pub const fn recommendation(&self) -> Recommendation {
        self.recommendation
    }

    /// Get the primary metric's key.
    #[must_use]
    pub fn primary_metric(&self) -> &str {
        &self.primary_metric
    }

    /// Get every supporting metric outcome.
    #[must_use]
    pub fn outcomes(&self) -> &[MetricOutcome] {
        &self.outcomes
    }

    /// Get the impact projection; `None` when the control value was zero
    /// and no lift is defined.
    #[must_use]
    pub const fn impact(&self) -> Option<ImpactProjection> {
        self.impact
    }
}

/// Combines significance results into a decision recommendation and an
/// impact projection.
#[derive(Debug, Clone)]
pub struct ReportGenerator {
    impact: ImpactConfig,
}

impl ReportGenerator {
    /// Create a generator with the given business inputs.
    #[must_use]
    pub const fn new(impact: ImpactConfig) -> Self {
        Self { impact }
    }

    /// Generate a decision report from labeled metric outcomes.
    ///
    /// Decision rule, reproducible from inputs alone:
    /// - primary significant, effect in the improving direction →
    ///   [`Recommendation::ImplementTreatment`];
    /// - primary significant, effect against it →
    ///   [`Recommendation::KeepControl`];
    /// - otherwise → [`Recommendation::ContinueMonitoring`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Analysis`] unless exactly one outcome is labeled
    /// primary.
    pub fn generate(&self, experiment_id: &str, outcomes: &[MetricOutcome]) -> Result<Report> {
        let mut primaries = outcomes.iter().filter(|o| o.is_primary());
        let primary = primaries
            .next()
            .ok_or_else(|| Error::Analysis("a report requires a primary metric outcome".into()))?;
        if primaries.next().is_some() {
            return Err(Error::Analysis(
                "a report requires exactly one primary metric outcome".into(),
            ));
        }

        let recommendation = if primary.result().significant() {
            if primary.favors_treatment() {
                Recommendation::ImplementTreatment
            } else {
                Recommendation::KeepControl
            }
        } else {
            Recommendation::ContinueMonitoring
        };

        let impact = primary.result().relative_lift().map(|lift| {
            #[allow(clippy::cast_precision_loss)]
            let traffic = self.impact.traffic_volume() as f64;
            let additional = traffic * primary.result().control().mean() * lift;
            ImpactProjection {
                relative_lift: lift,
                additional_conversions: additional,
                projected_value: additional * self.impact.value_per_conversion(),
            }
        });

        Ok(Report {
            experiment_id: experiment_id.to_string(),
            recommendation,
            primary_metric: primary.metric().to_string(),
            outcomes: outcomes.to_vec(),
            impact,
        })
    }
}
