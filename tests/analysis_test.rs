//! Significance analysis and report generation integration tests.

use cohort::experiment::ImprovementDirection;
use cohort::report::{ImpactConfig, MetricOutcome, Recommendation, ReportGenerator};
use cohort::stats::{
    compare, required_sample_size, AnalysisConfig, MetricKind, MetricSample,
};
use cohort::Error;

// =============================================================================
// Worked example (conversion-style two-proportion test)
// =============================================================================

#[test]
fn test_conversion_example_is_significant() {
    let control = MetricSample::proportion(1250, 0.72);
    let treatment = MetricSample::proportion(1280, 0.78);

    let result = compare(
        &control,
        &treatment,
        MetricKind::Proportion,
        &AnalysisConfig::default(),
    )
    .unwrap();

    assert!((result.effect_size() - 0.06).abs() < 1e-12);
    assert!((result.relative_lift().unwrap() - 0.083).abs() < 0.001);
    assert!(result.p_value() < 0.05);
    assert!(result.significant());
    assert!(result.power() > 0.8);
}

#[test]
fn test_small_difference_is_inconclusive_not_an_error() {
    let control = MetricSample::proportion(200, 0.50);
    let treatment = MetricSample::proportion(200, 0.52);

    let result = compare(
        &control,
        &treatment,
        MetricKind::Proportion,
        &AnalysisConfig::default(),
    )
    .unwrap();

    assert!(!result.significant());
    assert!(result.p_value() > 0.05);
}

#[test]
fn test_insufficient_samples_are_a_typed_failure() {
    let control = MetricSample::proportion(5, 0.4);
    let treatment = MetricSample::proportion(5, 0.8);

    let err = compare(
        &control,
        &treatment,
        MetricKind::Proportion,
        &AnalysisConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Analysis(_)));
}

// =============================================================================
// Power and minimum detectable effect monotonicity
// =============================================================================

#[test]
fn test_doubling_samples_never_hurts_power_or_mde() {
    let config = AnalysisConfig::default();

    for &(rate_c, rate_t) in &[(0.10, 0.12), (0.45, 0.50), (0.72, 0.78)] {
        let mut n = 100u64;
        let mut last_power = 0.0f64;
        let mut last_mde = f64::INFINITY;
        for _ in 0..6 {
            let result = compare(
                &MetricSample::proportion(n, rate_c),
                &MetricSample::proportion(n, rate_t),
                MetricKind::Proportion,
                &config,
            )
            .unwrap();

            assert!(
                result.power() >= last_power,
                "power fell from {last_power} to {} at n={n}",
                result.power()
            );
            assert!(
                result.minimum_detectable_effect() <= last_mde,
                "MDE rose from {last_mde} to {} at n={n}",
                result.minimum_detectable_effect()
            );

            last_power = result.power();
            last_mde = result.minimum_detectable_effect();
            n *= 2;
        }
    }
}

#[test]
fn test_required_sample_size_shrinks_with_bigger_effects() {
    let config = AnalysisConfig::default();
    let n_small_effect = required_sample_size(0.2, 0.05, &config).unwrap();
    let n_large_effect = required_sample_size(0.2, 0.25, &config).unwrap();
    assert!(n_large_effect < n_small_effect);
}

// =============================================================================
// Report generation
// =============================================================================

fn significant_uplift() -> MetricOutcome {
    let result = compare(
        &MetricSample::proportion(1250, 0.72),
        &MetricSample::proportion(1280, 0.78),
        MetricKind::Proportion,
        &AnalysisConfig::default(),
    )
    .unwrap();
    MetricOutcome::primary("signup_rate", ImprovementDirection::Increase, result)
}

#[test]
fn test_report_recommends_treatment_on_significant_uplift() {
    let generator = ReportGenerator::new(ImpactConfig::new(4.0, 120_000));
    let report = generator.generate("exp-001", &[significant_uplift()]).unwrap();

    assert_eq!(report.recommendation(), Recommendation::ImplementTreatment);
    let impact = report.impact().unwrap();
    assert!(impact.projected_value() > 0.0);
    assert!((impact.additional_conversions() - 7200.0).abs() < 1.0);
}

#[test]
fn test_secondary_metrics_do_not_drive_the_decision() {
    let secondary_regression = MetricOutcome::secondary(
        "time_on_page",
        ImprovementDirection::Increase,
        compare(
            &MetricSample::continuous(1000, 60.0, 400.0),
            &MetricSample::continuous(1000, 55.0, 400.0),
            MetricKind::Continuous,
            &AnalysisConfig::default(),
        )
        .unwrap(),
    );

    let generator = ReportGenerator::new(ImpactConfig::new(4.0, 120_000));
    let report = generator
        .generate("exp-001", &[significant_uplift(), secondary_regression])
        .unwrap();

    // The significant secondary regression is reported but the decision
    // follows the primary metric.
    assert_eq!(report.recommendation(), Recommendation::ImplementTreatment);
    assert_eq!(report.outcomes().len(), 2);
}

#[test]
fn test_identical_inputs_produce_identical_reports() {
    let outcomes = [significant_uplift()];
    let generator = ReportGenerator::new(ImpactConfig::new(4.0, 120_000));

    let first = generator.generate("exp-001", &outcomes).unwrap();
    let second = generator.generate("exp-001", &outcomes).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
}
