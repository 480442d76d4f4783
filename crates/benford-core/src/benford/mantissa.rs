use serde::{Deserialize, Serialize};

use crate::error::{AnalysisStage, BenfordError};
use crate::AnalysisResult;

/// Moments of a uniform distribution on [0, 1), the mantissa law under Benford.
pub const UNIFORM_MEAN: f64 = 0.5;
pub const UNIFORM_VARIANCE: f64 = 1.0 / 12.0;
pub const UNIFORM_SKEWNESS: f64 = 0.0;
pub const UNIFORM_EXCESS_KURTOSIS: f64 = -1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MantissaStatistic {
    Mean,
    Variance,
    Skewness,
    ExcessKurtosis,
}

/// One row of the mantissa table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MantissaMoment {
    pub statistic: MantissaStatistic,
    pub value: f64,
    pub benford_expected: f64,
}

/// Sample moments of a mantissa vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MantissaSummary {
    pub mean: f64,
    /// Sample variance, `n - 1` denominator.
    pub variance: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
}

impl MantissaSummary {
    pub fn table(&self) -> Vec<MantissaMoment> {
        vec![
            MantissaMoment {
                statistic: MantissaStatistic::Mean,
                value: self.mean,
                benford_expected: UNIFORM_MEAN,
            },
            MantissaMoment {
                statistic: MantissaStatistic::Variance,
                value: self.variance,
                benford_expected: UNIFORM_VARIANCE,
            },
            MantissaMoment {
                statistic: MantissaStatistic::Skewness,
                value: self.skewness,
                benford_expected: UNIFORM_SKEWNESS,
            },
            MantissaMoment {
                statistic: MantissaStatistic::ExcessKurtosis,
                value: self.excess_kurtosis,
                benford_expected: UNIFORM_EXCESS_KURTOSIS,
            },
        ]
    }
}

pub fn mantissa_summary(mantissas: &[f64]) -> AnalysisResult<MantissaSummary> {
    if mantissas.is_empty() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::Mantissa,
            reason: "At least one mantissa is required.".into(),
        });
    }
    let n = mantissas.len() as f64;
    let mean = mantissas.iter().sum::<f64>() / n;

    let central = |p: i32| mantissas.iter().map(|m| (m - mean).powi(p)).sum::<f64>() / n;
    let m2 = central(2);
    let m3 = central(3);
    let m4 = central(4);

    let variance = if mantissas.len() > 1 {
        m2 * n / (n - 1.0)
    } else {
        0.0
    };

    // Skewness and excess kurtosis (population)
    let (skewness, excess_kurtosis) = if m2 > f64::EPSILON * f64::EPSILON {
        (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
    } else {
        (0.0, 0.0)
    };

    Ok(MantissaSummary {
        mean,
        variance,
        skewness,
        excess_kurtosis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evenly_spaced_mantissas() {
        let m: Vec<f64> = (0..10_000).map(|i| (i as f64 + 0.5) / 10_000.0).collect();
        let s = mantissa_summary(&m).unwrap();
        assert!((s.mean - UNIFORM_MEAN).abs() < 1e-9);
        assert!((s.variance - UNIFORM_VARIANCE).abs() < 1e-4);
        assert!(s.skewness.abs() < 1e-6);
        assert!((s.excess_kurtosis - UNIFORM_EXCESS_KURTOSIS).abs() < 1e-3);
    }

    #[test]
    fn test_constant_mantissa() {
        let s = mantissa_summary(&[0.25, 0.25, 0.25]).unwrap();
        assert_eq!(s.mean, 0.25);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.excess_kurtosis, 0.0);
    }

    #[test]
    fn test_sample_variance_denominator() {
        let s = mantissa_summary(&[0.1, 0.3]).unwrap();
        assert!((s.variance - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_table_order() {
        let s = mantissa_summary(&[0.1, 0.5, 0.9]).unwrap();
        let table = s.table();
        assert_eq!(table.len(), 4);
        assert_eq!(table[0].statistic, MantissaStatistic::Mean);
        assert_eq!(table[3].benford_expected, UNIFORM_EXCESS_KURTOSIS);
    }

    #[test]
    fn test_empty() {
        assert!(mantissa_summary(&[]).is_err());
    }
}
