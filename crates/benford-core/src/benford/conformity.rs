//! Conformity tests against the Benford distribution.
//!
//! Chi-squared and per-group Z follow the usual goodness-of-fit forms; the
//! Mantissa Arc Test and Kolmogorov-Smirnov test use asymptotic p-values.
//! MAD thresholds and the Distortion Factor model follow Nigrini,
//! *Benford's Law* (2012).

use std::f64::consts::{LN_10, TAU};

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF};

use crate::error::{AnalysisStage, BenfordError};
use crate::types::Proportion;
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Outcome of a hypothesis test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HypothesisTest {
    pub method: String,
    pub statistic: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degrees_of_freedom: Option<f64>,
    pub p_value: f64,
}

/// MAD conformity tiers, tightest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MadConformity {
    CloseConformity,
    AcceptableConformity,
    MarginallyAcceptableConformity,
    Nonconformity,
}

impl MadConformity {
    pub fn label(self) -> &'static str {
        match self {
            MadConformity::CloseConformity => "Close conformity",
            MadConformity::AcceptableConformity => "Acceptable conformity",
            MadConformity::MarginallyAcceptableConformity => "Marginally acceptable conformity",
            MadConformity::Nonconformity => "Nonconformity",
        }
    }
}

/// Distortion Factor with the means it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistortionFactor {
    /// Mean of the values collapsed into [10, 100).
    pub actual_mean: f64,
    /// Expected collapsed mean for a Benford sample of the same size.
    pub expected_mean: f64,
    /// `(actual - expected) / expected`, in percent.
    pub distortion_factor: f64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn degenerate(stage: AnalysisStage, context: impl Into<String>) -> BenfordError {
    BenfordError::DegenerateDistribution {
        stage,
        context: context.into(),
    }
}

fn chi_squared_sf(statistic: f64, df: f64) -> AnalysisResult<f64> {
    let dist = ChiSquared::new(df).map_err(|e| {
        degenerate(
            AnalysisStage::ConformityTests,
            format!("Invalid chi-squared parameters: {e}"),
        )
    })?;
    Ok(dist.sf(statistic).clamp(0.0, 1.0))
}

/// Kolmogorov distribution survival function `Q(λ)`.
fn kolmogorov_sf(lambda: f64) -> f64 {
    if lambda < 0.2 {
        return 1.0;
    }
    let a2 = -2.0 * lambda * lambda;
    let mut fac = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let jf = f64::from(j);
        let term = fac * (a2 * jf * jf).exp();
        sum += term;
        if term.abs() <= 1e-3 * previous || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        fac = -fac;
        previous = term.abs();
    }
    1.0
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-group Z with continuity correction `1/(2n)`.
pub fn z_statistics(
    empirical: &[Proportion],
    theoretical: &[Proportion],
    n: usize,
) -> AnalysisResult<Vec<f64>> {
    let nf = n as f64;
    let correction = 1.0 / (2.0 * nf);
    empirical
        .iter()
        .zip(theoretical)
        .map(|(&p_emp, &p_th)| {
            if p_th <= 0.0 || p_th >= 1.0 {
                return Err(degenerate(
                    AnalysisStage::ConformityTests,
                    format!("theoretical probability {p_th} in Z denominator"),
                ));
            }
            Ok(((p_emp - p_th).abs() - correction) / (p_th * (1.0 - p_th) / nf).sqrt())
        })
        .collect()
}

/// Pearson chi-squared on counts, `df = groups - 1`.
pub fn chi_squared_test(
    observed: &[u64],
    theoretical: &[Proportion],
) -> AnalysisResult<HypothesisTest> {
    let n = observed.iter().sum::<u64>() as f64;
    let mut statistic = 0.0;
    for (&count, &p) in observed.iter().zip(theoretical) {
        let expected = p * n;
        if expected <= 0.0 {
            return Err(degenerate(
                AnalysisStage::ConformityTests,
                format!("expected frequency {expected} in chi-squared denominator"),
            ));
        }
        let diff = count as f64 - expected;
        statistic += diff * diff / expected;
    }
    let df = (theoretical.len().saturating_sub(1)) as f64;
    Ok(HypothesisTest {
        method: "Pearson's Chi-squared test".into(),
        statistic,
        degrees_of_freedom: Some(df),
        p_value: chi_squared_sf(statistic, df)?,
    })
}

/// Mantissa Arc Test: `2nL²` against chi-squared with 2 df.
pub fn mantissa_arc_test(mantissas: &[f64]) -> AnalysisResult<(HypothesisTest, f64)> {
    if mantissas.is_empty() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::ConformityTests,
            reason: "Mantissa Arc Test needs at least one mantissa.".into(),
        });
    }
    let n = mantissas.len() as f64;
    let (sum_cos, sum_sin) = mantissas.iter().fold((0.0, 0.0), |(c, s), m| {
        let theta = TAU * m;
        (c + theta.cos(), s + theta.sin())
    });
    let l_squared = (sum_cos / n).powi(2) + (sum_sin / n).powi(2);
    let statistic = 2.0 * n * l_squared;
    let test = HypothesisTest {
        method: "Mantissa Arc Test".into(),
        statistic,
        degrees_of_freedom: Some(2.0),
        p_value: chi_squared_sf(statistic, 2.0)?,
    };
    Ok((test, l_squared))
}

/// One-sample KS over the ordered digit-group CDFs.
pub fn kolmogorov_smirnov_test(
    empirical: &[Proportion],
    theoretical: &[Proportion],
    n: usize,
) -> HypothesisTest {
    let mut cum_emp = 0.0;
    let mut cum_th = 0.0;
    let mut statistic: f64 = 0.0;
    for (&p_emp, &p_th) in empirical.iter().zip(theoretical) {
        cum_emp += p_emp;
        cum_th += p_th;
        statistic = statistic.max((cum_emp - cum_th).abs());
    }
    let sqrt_n = (n as f64).sqrt();
    let lambda = (sqrt_n + 0.12 + 0.11 / sqrt_n) * statistic;
    HypothesisTest {
        method: "Kolmogorov-Smirnov test".into(),
        statistic,
        degrees_of_freedom: None,
        p_value: kolmogorov_sf(lambda),
    }
}

/// Mean absolute deviation between empirical and theoretical proportions.
pub fn mean_absolute_deviation(empirical: &[Proportion], theoretical: &[Proportion]) -> f64 {
    if theoretical.is_empty() {
        return 0.0;
    }
    let total: f64 = empirical
        .iter()
        .zip(theoretical)
        .map(|(e, t)| (e - t).abs())
        .sum();
    total / theoretical.len() as f64
}

/// Nigrini's MAD tiers; only defined for 1, 2 and 3 digits.
pub fn mad_conformity(mad: f64, number_of_digits: u32) -> Option<MadConformity> {
    let (close, acceptable, marginal) = match number_of_digits {
        1 => (0.006, 0.012, 0.015),
        2 => (0.0012, 0.0018, 0.0022),
        3 => (0.00036, 0.00044, 0.00050),
        _ => return None,
    };
    Some(if mad <= close {
        MadConformity::CloseConformity
    } else if mad <= acceptable {
        MadConformity::AcceptableConformity
    } else if mad <= marginal {
        MadConformity::MarginallyAcceptableConformity
    } else {
        MadConformity::Nonconformity
    })
}

/// Distortion Factor from the mantissas of the analysed magnitudes.
pub fn distortion_factor(mantissas: &[f64]) -> AnalysisResult<DistortionFactor> {
    if mantissas.is_empty() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::DistortionFactor,
            reason: "At least one value is required.".into(),
        });
    }
    let n = mantissas.len() as f64;
    let actual_mean = mantissas.iter().map(|m| 10f64.powf(1.0 + m)).sum::<f64>() / n;
    // 90 / (N (10^(1/N) - 1)), written with exp_m1 to stay exact for large N.
    let expected_mean = 90.0 / (n * (LN_10 / n).exp_m1());
    if !(expected_mean.is_finite() && expected_mean > 0.0) {
        return Err(degenerate(
            AnalysisStage::DistortionFactor,
            format!("expected mean {expected_mean} for {n} values"),
        ));
    }
    Ok(DistortionFactor {
        actual_mean,
        expected_mean,
        distortion_factor: (actual_mean - expected_mean) / expected_mean * 100.0,
    })
}

/// Expected collapsed mean as the sample grows without bound, `90 / ln 10`.
pub fn asymptotic_expected_mean() -> f64 {
    90.0 / LN_10
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn benford_first() -> Vec<f64> {
        (1..=9u32).map(|d| (1.0 + 1.0 / f64::from(d)).log10()).collect()
    }

    #[test]
    fn test_chi_squared_perfect_fit() {
        let p = benford_first();
        let counts: Vec<u64> = p.iter().map(|x| (x * 1e6).round() as u64).collect();
        let t = chi_squared_test(&counts, &p).unwrap();
        assert!(t.statistic < 0.01);
        assert_eq!(t.degrees_of_freedom, Some(8.0));
        assert!(t.p_value > 0.99);
    }

    #[test]
    fn test_chi_squared_uniform_rejects() {
        let counts = vec![100u64; 9];
        let t = chi_squared_test(&counts, &benford_first()).unwrap();
        assert!(t.p_value < 1e-6, "p={}", t.p_value);
    }

    #[test]
    fn test_chi_squared_zero_probability_guard() {
        let mut p = benford_first();
        p[3] = 0.0;
        assert!(matches!(
            chi_squared_test(&[1; 9], &p),
            Err(BenfordError::DegenerateDistribution { .. })
        ));
    }

    #[test]
    fn test_z_continuity_correction() {
        let z = z_statistics(&[0.5], &[0.5], 100).unwrap();
        // |0| - 1/200 over sqrt(0.25/100)
        assert!((z[0] - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_mat_uniform_mantissas() {
        let m: Vec<f64> = (0..1000).map(|i| f64::from(i) / 1000.0).collect();
        let (t, l2) = mantissa_arc_test(&m).unwrap();
        assert!(l2 < 1e-20);
        assert!(t.p_value > 0.99);
    }

    #[test]
    fn test_mat_clustered_mantissas() {
        let (t, l2) = mantissa_arc_test(&[0.3; 50]).unwrap();
        assert!((l2 - 1.0).abs() < 1e-12);
        assert!((t.statistic - 100.0).abs() < 1e-9);
        assert!((t.p_value - (-50.0f64).exp()).abs() < 1e-20);
    }

    #[test]
    fn test_ks_identical_distribution() {
        let p = benford_first();
        let t = kolmogorov_smirnov_test(&p, &p, 500);
        assert!(t.statistic < 1e-12);
        assert_eq!(t.p_value, 1.0);
    }

    #[test]
    fn test_ks_detects_shift() {
        let mut emp = vec![0.0; 9];
        emp[8] = 1.0;
        let t = kolmogorov_smirnov_test(&emp, &benford_first(), 100);
        assert!(t.statistic > 0.95);
        assert!(t.p_value < 1e-10);
    }

    #[test]
    fn test_kolmogorov_sf_known_value() {
        // Q(1.36) is the classical 5% critical point.
        assert!((kolmogorov_sf(1.36) - 0.0494).abs() < 1e-3);
    }

    #[test]
    fn test_mad_tiers_first_digit() {
        assert_eq!(mad_conformity(0.004, 1), Some(MadConformity::CloseConformity));
        assert_eq!(mad_conformity(0.006, 1), Some(MadConformity::CloseConformity));
        assert_eq!(mad_conformity(0.010, 1), Some(MadConformity::AcceptableConformity));
        assert_eq!(
            mad_conformity(0.014, 1),
            Some(MadConformity::MarginallyAcceptableConformity)
        );
        assert_eq!(mad_conformity(0.02, 1), Some(MadConformity::Nonconformity));
    }

    #[test]
    fn test_mad_tiers_tighten_with_digits() {
        assert_eq!(mad_conformity(0.002, 1), Some(MadConformity::CloseConformity));
        assert_eq!(
            mad_conformity(0.002, 2),
            Some(MadConformity::MarginallyAcceptableConformity)
        );
        assert_eq!(mad_conformity(0.002, 3), Some(MadConformity::Nonconformity));
        assert_eq!(mad_conformity(0.0001, 4), None);
    }

    #[test]
    fn test_distortion_factor_sign() {
        let high = distortion_factor(&[0.95; 20]).unwrap();
        assert!(high.distortion_factor > 0.0);
        let low = distortion_factor(&[0.01; 20]).unwrap();
        assert!(low.distortion_factor < 0.0);
    }

    #[test]
    fn test_expected_mean_converges() {
        let m: Vec<f64> = (0..100_000).map(|i| f64::from(i) / 100_000.0).collect();
        let df = distortion_factor(&m).unwrap();
        assert!((df.expected_mean - asymptotic_expected_mean()).abs() < 1e-3);
        assert!(df.distortion_factor.abs() < 0.1);
    }
}
