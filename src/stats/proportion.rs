//! Two-proportion z-test (conversion-style metrics).

use crate::error::{Error, Result};

use super::{normal, MetricSample, TwoSampleTest};

/// Pooled two-proportion z-test of `treatment` against `control`.
///
/// The test statistic uses the pooled standard error under the null; the
/// returned `std_error` is the unpooled standard error of the difference,
/// which is what power and minimum-detectable-effect calculations need.
#[allow(clippy::cast_precision_loss)]
pub(super) fn z_test(control: &MetricSample, treatment: &MetricSample) -> Result<TwoSampleTest> {
    let n1 = control.sample_size() as f64;
    let n2 = treatment.sample_size() as f64;
    let p1 = control.mean();
    let p2 = treatment.mean();

    let pooled = p1.mul_add(n1, p2 * n2) / (n1 + n2);
    let pooled_se = (pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2)).sqrt();
    if pooled_se == 0.0 {
        return Err(Error::Analysis(
            "no variation in observed samples; both rates are 0 or 1".to_string(),
        ));
    }

    let effect = p2 - p1;
    let statistic = effect / pooled_se;
    let p_value = 2.0 * (1.0 - normal::cdf(statistic.abs()));
    let std_error = (p1 * (1.0 - p1) / n1 + p2 * (1.0 - p2) / n2).sqrt();

    Ok(TwoSampleTest {
        effect,
        std_error,
        statistic,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_difference_is_significant() {
        let control = MetricSample::proportion(1000, 0.10);
        let treatment = MetricSample::proportion(1000, 0.16);
        let test = z_test(&control, &treatment).unwrap();

        assert!((test.effect - 0.06).abs() < 1e-12);
        assert!(test.statistic > 3.0);
        assert!(test.p_value < 0.001);
    }

    #[test]
    fn test_identical_rates_not_significant() {
        let control = MetricSample::proportion(1000, 0.10);
        let treatment = MetricSample::proportion(1000, 0.10);
        let test = z_test(&control, &treatment).unwrap();

        assert!(test.effect.abs() < 1e-12);
        assert!((test.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_negative_effect_when_treatment_worse() {
        let control = MetricSample::proportion(1000, 0.20);
        let treatment = MetricSample::proportion(1000, 0.12);
        let test = z_test(&control, &treatment).unwrap();
        assert!(test.effect < 0.0);
        assert!(test.p_value < 0.05);
    }

    #[test]
    fn test_degenerate_rates_error() {
        let control = MetricSample::proportion(1000, 0.0);
        let treatment = MetricSample::proportion(1000, 0.0);
        assert!(z_test(&control, &treatment).is_err());
    }
}
