//! Standard normal distribution helpers.

/// Cumulative distribution function via the error function:
/// `Phi(x) = (1 + erf(x / sqrt(2))) / 2`.
#[must_use]
pub fn cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / std::f64::consts::SQRT_2))
}

// Acklam's rational approximation coefficients for the inverse CDF.
const A: [f64; 6] = [
    -3.969_683_028_665_376e1,
    2.209_460_984_245_205e2,
    -2.759_285_104_469_687e2,
    1.383_577_518_672_69e2,
    -3.066_479_806_614_716e1,
    2.506_628_277_459_239,
];
const B: [f64; 5] = [
    -5.447_609_879_822_406e1,
    1.615_858_368_580_409e2,
    -1.556_989_798_598_866e2,
    6.680_131_188_771_972e1,
    -1.328_068_155_288_572e1,
];
const C: [f64; 6] = [
    -7.784_894_002_430_293e-3,
    -3.223_964_580_411_365e-1,
    -2.400_758_277_161_838,
    -2.549_732_539_343_734,
    4.374_664_141_464_968,
    2.938_163_982_698_783,
];
const D: [f64; 4] = [
    7.784_695_709_041_462e-3,
    3.224_671_290_700_398e-1,
    2.445_134_137_142_996,
    3.754_408_661_907_416,
];
const P_LOW: f64 = 0.02425;

/// Inverse CDF (quantile function) for `p` in (0, 1).
///
/// Acklam's rational approximation; relative error below 1.15e-9 across
/// the domain, which is far tighter than any confidence level choice.
#[must_use]
pub fn quantile(p: f64) -> f64 {
    debug_assert!(p > 0.0 && p < 1.0, "quantile requires p in (0, 1)");
    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        -quantile(1.0 - p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdf_at_zero_is_half() {
        assert!((cdf(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_cdf_at_196() {
        assert!((cdf(1.96) - 0.975).abs() < 1e-4);
    }

    #[test]
    fn test_cdf_symmetry() {
        for x in [0.5, 1.0, 2.0, 3.5] {
            assert!((cdf(x) + cdf(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_cdf_tails() {
        assert!(cdf(8.0) > 0.999_999);
        assert!(cdf(-8.0) < 1e-6);
    }

    #[test]
    fn test_quantile_round_trips_cdf() {
        for p in [0.001, 0.025, 0.2, 0.5, 0.8, 0.975, 0.999] {
            assert!((cdf(quantile(p)) - p).abs() < 1e-8, "round trip failed at p={p}");
        }
    }

    #[test]
    fn test_quantile_known_values() {
        assert!((quantile(0.975) - 1.959_964).abs() < 1e-5);
        assert!((quantile(0.8) - 0.841_621).abs() < 1e-5);
        assert!(quantile(0.5).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_antisymmetry() {
        assert!((quantile(0.975) + quantile(0.025)).abs() < 1e-9);
    }
}
