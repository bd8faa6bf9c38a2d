//! Welch's two-sample t-test (time/score-style metrics).

use crate::error::{Error, Result};

use super::{normal, MetricSample, TwoSampleTest};

/// Welch's unequal-variances t-test of `treatment` against `control`.
///
/// The p-value uses the normal approximation to the t distribution, which
/// is adequate at the sample sizes admitted by
/// [`AnalysisConfig::min_sample_size`](super::AnalysisConfig).
///
/// A negative effect on a reduction-is-improvement metric (completion
/// time) is a positive outcome; direction labeling is the caller's job via
/// [`ImprovementDirection`](crate::experiment::ImprovementDirection).
#[allow(clippy::cast_precision_loss)]
pub(super) fn welch_t_test(
    control: &MetricSample,
    treatment: &MetricSample,
) -> Result<TwoSampleTest> {
    let n1 = control.sample_size() as f64;
    let n2 = treatment.sample_size() as f64;

    let std_error = (control.variance() / n1 + treatment.variance() / n2).sqrt();
    if std_error == 0.0 {
        return Err(Error::Analysis(
            "zero variance in both samples; a two-sample test needs variation".to_string(),
        ));
    }

    let effect = treatment.mean() - control.mean();
    let statistic = effect / std_error;
    let p_value = 2.0 * (1.0 - normal::cdf(statistic.abs()));

    Ok(TwoSampleTest {
        effect,
        std_error,
        statistic,
        p_value,
    })
}
