//! Significance analysis over aggregated per-variant metrics
//!
//! The analyzer consumes sample summaries (sizes plus observed
//! rates/means), never raw events, so it runs out-of-band from assignment
//! and ingestion. Proportion metrics get a pooled two-proportion z-test;
//! continuous metrics get Welch's t-test. Every result carries statistical
//! power at the observed effect and the minimum detectable effect at the
//! configured target power, both monotonic in sample size.
//!
//! # Example
//!
//! ```rust
//! use cohort::stats::{compare, AnalysisConfig, MetricKind, MetricSample};
//!
//! # fn main() -> cohort::Result<()> {
//! let control = MetricSample::proportion(1250, 0.72);
//! let treatment = MetricSample::proportion(1280, 0.78);
//!
//! let result = compare(&control, &treatment, MetricKind::Proportion, &AnalysisConfig::default())?;
//! assert!(result.significant());
//! # Ok(())
//! # }
//! ```

mod continuous;
mod normal;
mod power;
mod proportion;

pub use normal::{cdf as normal_cdf, quantile as normal_quantile};
pub use power::required_sample_size;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape of a metric's observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Conversion-style: each user either did or did not produce the
    /// outcome; the observed value is a rate.
    Proportion,
    /// Time/score-style: each observation is a real number; the observed
    /// value is a mean.
    Continuous,
}

/// Aggregated summary of one variant's observations for one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    sample_size: u64,
    mean: f64,
    variance: f64,
}

impl MetricSample {
    /// Summary of a proportion metric: `rate` is the fraction of the
    /// sample that converted. Variance follows as `rate * (1 - rate)`.
    #[must_use]
    pub fn proportion(sample_size: u64, rate: f64) -> Self {
        Self {
            sample_size,
            mean: rate,
            variance: rate * (1.0 - rate),
        }
    }

    /// Summary of a continuous metric.
    #[must_use]
    pub const fn continuous(sample_size: u64, mean: f64, variance: f64) -> Self {
        Self {
            sample_size,
            mean,
            variance,
        }
    }

    /// Number of observations.
    #[must_use]
    pub const fn sample_size(&self) -> u64 {
        self.sample_size
    }

    /// Observed rate (proportion) or mean (continuous).
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Observation variance.
    #[must_use]
    pub const fn variance(&self) -> f64 {
        self.variance
    }
}

/// Analyzer configuration. External input, never hardcoded at call sites;
/// the defaults reproduce the conventional 95% confidence / 80% power
/// setup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Confidence level for significance, in (0, 1). Default 0.95.
    pub confidence: f64,
    /// Target power for minimum-detectable-effect and sizing, in (0, 1).
    /// Default 0.80.
    pub power_target: f64,
    /// Smallest per-variant sample the analyzer accepts. Default 30,
    /// below which the normal approximations are not trustworthy.
    pub min_sample_size: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            confidence: 0.95,
            power_target: 0.80,
            min_sample_size: 30,
        }
    }
}

impl AnalysisConfig {
    /// Significance threshold: `1 - confidence`.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(Error::Analysis(format!(
                "confidence must be in (0, 1), got {}",
                self.confidence
            )));
        }
        if !(self.power_target > 0.0 && self.power_target < 1.0) {
            return Err(Error::Analysis(format!(
                "power target must be in (0, 1), got {}",
                self.power_target
            )));
        }
        Ok(())
    }
}

/// Internal two-sample test output shared by the z- and t-tests.
pub(crate) struct TwoSampleTest {
    pub effect: f64,
    /// Unpooled standard error of the difference, the input to power and
    /// minimum-detectable-effect calculations.
    pub std_error: f64,
    pub statistic: f64,
    pub p_value: f64,
}

/// Outcome of comparing treatment against control on one metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificanceResult {
    kind: MetricKind,
    control: MetricSample,
    treatment: MetricSample,
    effect_size: f64,
    relative_lift: Option<f64>,
    confidence_interval: (f64, f64),
    statistic: f64,
    p_value: f64,
    confidence: f64,
    significant: bool,
    power: f64,
    minimum_detectable_effect: f64,
}

impl SignificanceResult {
    /// Get the metric kind the comparison ran under.
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.kind
    }

    /// Get the control sample.
    #[must_use]
    pub const fn control(&self) -> MetricSample {
        self.control
    }

    /// Get the treatment sample.
    #[must_use]
    pub const fn treatment(&self) -> MetricSample {
        self.treatment
    }

    /// Treatment minus control, in the metric's own units.
    #[must_use]
    pub const fn effect_size(&self) -> f64 {
        self.effect_size
    }

    /// Effect size relative to the control value; `None` when the control
    /// value is zero.
    #[must_use]
    pub const fn relative_lift(&self) -> Option<f64> {
        self.relative_lift
    }

    /// Two-sided confidence interval around the effect size, at the
    /// configured confidence level.
    #[must_use]
    pub const fn confidence_interval(&self) -> (f64, f64) {
        self.confidence_interval
    }

    /// The z (proportion) or t (continuous) statistic.
    #[must_use]
    pub const fn statistic(&self) -> f64 {
        self.statistic
    }

    /// Two-sided p-value.
    #[must_use]
    pub const fn p_value(&self) -> f64 {
        self.p_value
    }

    /// Confidence level the significance flag was computed at.
    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Whether `p_value < 1 - confidence`.
    #[must_use]
    pub const fn significant(&self) -> bool {
        self.significant
    }

    /// Probability of detecting a true effect of the observed size at the
    /// current sample sizes.
    #[must_use]
    pub const fn power(&self) -> f64 {
        self.power
    }

    /// Smallest effect the current sample sizes could reliably detect at
    /// the target power.
    #[must_use]
    pub const fn minimum_detectable_effect(&self) -> f64 {
        self.minimum_detectable_effect
    }
}

/// Compare a treatment sample against a control sample.
///
/// # Errors
///
/// Returns [`Error::Analysis`] for samples below the configured minimum
/// size, non-finite or out-of-range inputs, or degenerate samples with no
/// variation. A valid-but-inconclusive comparison is not an error; it
/// comes back with `significant() == false`.
pub fn compare(
    control: &MetricSample,
    treatment: &MetricSample,
    kind: MetricKind,
    config: &AnalysisConfig,
) -> Result<SignificanceResult> {
    config.validate()?;
    validate_sample(control, "control", kind, config)?;
    validate_sample(treatment, "treatment", kind, config)?;

    let test = match kind {
        MetricKind::Proportion => proportion::z_test(control, treatment)?,
        MetricKind::Continuous => continuous::welch_t_test(control, treatment)?,
    };

    let alpha = config.alpha();
    let relative_lift = if control.mean() == 0.0 {
        None
    } else {
        Some(test.effect / control.mean())
    };
    let half_width = normal::quantile(1.0 - alpha / 2.0) * test.std_error;

    Ok(SignificanceResult {
        kind,
        control: *control,
        treatment: *treatment,
        effect_size: test.effect,
        relative_lift,
        confidence_interval: (test.effect - half_width, test.effect + half_width),
        statistic: test.statistic,
        p_value: test.p_value,
        confidence: config.confidence,
        significant: test.p_value < alpha,
        power: power::power_at(test.effect, test.std_error, alpha),
        minimum_detectable_effect: power::minimum_detectable_effect(
            test.std_error,
            alpha,
            config.power_target,
        ),
    })
}

fn validate_sample(
    sample: &MetricSample,
    label: &str,
    kind: MetricKind,
    config: &AnalysisConfig,
) -> Result<()> {
    if sample.sample_size() < config.min_sample_size {
        return Err(Error::Analysis(format!(
            "{label} sample size {} below minimum {}",
            sample.sample_size(),
            config.min_sample_size
        )));
    }
    if !sample.mean().is_finite() || !sample.variance().is_finite() || sample.variance() < 0.0 {
        return Err(Error::Analysis(format!(
            "{label} sample has non-finite or negative moments"
        )));
    }
    if kind == MetricKind::Proportion && !(0.0..=1.0).contains(&sample.mean()) {
        return Err(Error::Analysis(format!(
            "{label} rate {} outside [0, 1]",
            sample.mean()
        )));
    }
    Ok(())
}
