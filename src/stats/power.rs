//! Statistical power, minimum detectable effect, and pre-launch sizing.

use crate::error::{Error, Result};

use super::{normal, AnalysisConfig};

/// Probability of detecting a true effect of the observed size at the
/// given standard error and significance level.
///
/// `Phi(|effect| / se - z_{alpha/2})`: shrinking the standard error
/// (larger samples) pushes the argument up, so power is monotonic in
/// sample size.
pub(super) fn power_at(effect: f64, std_error: f64, alpha: f64) -> f64 {
    let z_alpha = normal::quantile(1.0 - alpha / 2.0);
    normal::cdf(effect.abs() / std_error - z_alpha)
}

/// Smallest effect reliably detectable at the target power:
/// `(z_{alpha/2} + z_{power}) * se`. Monotonically shrinks with the
/// standard error, hence with sample size.
pub(super) fn minimum_detectable_effect(std_error: f64, alpha: f64, power_target: f64) -> f64 {
    (normal::quantile(1.0 - alpha / 2.0) + normal::quantile(power_target)) * std_error
}

/// Per-variant sample size needed to detect a relative effect on a
/// baseline conversion rate at the configured confidence and power.
///
/// Standard two-proportion sizing: with `p2 = p1 * (1 + relative_effect)`,
///
/// ```text
/// n = (z_a * sqrt(2 * pbar * (1 - pbar)) + z_b * sqrt(p1 q1 + p2 q2))^2
///     -----------------------------------------------------------------
///                              (p2 - p1)^2
/// ```
///
/// # Errors
///
/// Returns [`Error::Analysis`] when the baseline rate is outside (0, 1),
/// the relative effect is zero, or the implied treatment rate leaves
/// (0, 1).
pub fn required_sample_size(
    baseline_rate: f64,
    relative_effect: f64,
    config: &AnalysisConfig,
) -> Result<u64> {
    config.validate()?;
    if !(0.0..=1.0).contains(&baseline_rate) || baseline_rate == 0.0 || baseline_rate == 1.0 {
        return Err(Error::Analysis(format!(
            "baseline rate must be in (0, 1), got {baseline_rate}"
        )));
    }
    if relative_effect == 0.0 {
        return Err(Error::Analysis(
            "relative effect must be non-zero".to_string(),
        ));
    }
    let p1 = baseline_rate;
    let p2 = baseline_rate * (1.0 + relative_effect);
    if p2 <= 0.0 || p2 >= 1.0 {
        return Err(Error::Analysis(format!(
            "implied treatment rate {p2} leaves (0, 1)"
        )));
    }

    let z_alpha = normal::quantile(1.0 - config.alpha() / 2.0);
    let z_beta = normal::quantile(config.power_target);
    let pbar = (p1 + p2) / 2.0;
    let numerator = z_alpha.mul_add(
        (2.0 * pbar * (1.0 - pbar)).sqrt(),
        z_beta * (p1 * (1.0 - p1) + p2 * (1.0 - p2)).sqrt(),
    );
    let n = (numerator * numerator) / ((p2 - p1) * (p2 - p1));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(n.ceil() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_increases_with_smaller_std_error() {
        let wide = power_at(0.05, 0.03, 0.05);
        let narrow = power_at(0.05, 0.015, 0.05);
        assert!(narrow > wide);
    }

    #[test]
    fn test_power_of_zero_effect_is_near_zero() {
        let power = power_at(0.0, 0.02, 0.05);
        assert!(power < 0.05);
    }

    #[test]
    fn test_mde_shrinks_with_std_error() {
        let wide = minimum_detectable_effect(0.03, 0.05, 0.8);
        let narrow = minimum_detectable_effect(0.015, 0.05, 0.8);
        assert!(narrow < wide);
        assert!((narrow * 2.0 - wide).abs() < 1e-12);
    }

    #[test]
    fn test_required_sample_size_plausible_range() {
        let config = AnalysisConfig::default();
        let n = required_sample_size(0.1, 0.2, &config).unwrap();
        assert!(n > 100);
        assert!(n < 100_000);
    }

    #[test]
    fn test_required_sample_size_grows_for_smaller_effects() {
        let config = AnalysisConfig::default();
        let big = required_sample_size(0.1, 0.5, &config).unwrap();
        let small = required_sample_size(0.1, 0.05, &config).unwrap();
        assert!(small > big);
    }

    #[test]
    fn test_required_sample_size_rejects_bad_inputs() {
        let config = AnalysisConfig::default();
        assert!(required_sample_size(0.0, 0.2, &config).is_err());
        assert!(required_sample_size(0.5, 0.0, &config).is_err());
        assert!(required_sample_size(0.9, 0.5, &config).is_err());
    }
}
