//! Sign filtering and empirical digit distributions (first and second order).

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::digits::{group_bounds, leading_digits};
use crate::error::{AnalysisStage, BenfordError};
use crate::types::{DigitGroup, Proportion};
use crate::AnalysisResult;

/// Largest rounding precision accepted for second-order differences.
pub const MAX_ROUND: u32 = 15;

// ---------------------------------------------------------------------------
// Sign filter
// ---------------------------------------------------------------------------

/// Which part of the sample is analysed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignFilter {
    /// Values strictly greater than zero.
    #[default]
    Positive,
    /// Values strictly less than zero.
    Negative,
    /// Every nonzero value.
    Both,
}

impl SignFilter {
    fn accepts(self, value: f64) -> bool {
        match self {
            SignFilter::Positive => value > 0.0,
            SignFilter::Negative => value < 0.0,
            SignFilter::Both => value != 0.0,
        }
    }
}

impl fmt::Display for SignFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignFilter::Positive => "positive",
            SignFilter::Negative => "negative",
            SignFilter::Both => "both",
        })
    }
}

impl FromStr for SignFilter {
    type Err = BenfordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(SignFilter::Positive),
            "negative" => Ok(SignFilter::Negative),
            "both" => Ok(SignFilter::Both),
            _ => Err(BenfordError::Configuration {
                field: "sign".into(),
                reason: "Must be 'positive', 'negative', or 'both'.".into(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Filtered sample
// ---------------------------------------------------------------------------

/// Observations that survived sign and missing-value filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredSample {
    /// Zero-based position of each observation in the raw input.
    pub lines: Vec<usize>,
    /// Signed values as given.
    pub values: Vec<f64>,
    /// `|value|`, always finite and strictly positive.
    pub magnitudes: Vec<f64>,
}

impl FilteredSample {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Drop missing, non-finite and sign-rejected entries.
pub fn filter_sample(data: &[Option<f64>], sign: SignFilter) -> AnalysisResult<FilteredSample> {
    let mut sample = FilteredSample {
        lines: Vec::new(),
        values: Vec::new(),
        magnitudes: Vec::new(),
    };
    for (line, value) in data.iter().enumerate() {
        let Some(v) = value.filter(|v| v.is_finite() && sign.accepts(*v)) else {
            continue;
        };
        sample.lines.push(line);
        sample.values.push(v);
        sample.magnitudes.push(v.abs());
    }
    if sample.is_empty() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::Validation,
            reason: format!("No {sign} values remain after filtering {} entries.", data.len()),
        });
    }
    Ok(sample)
}

// ---------------------------------------------------------------------------
// Digit tallies
// ---------------------------------------------------------------------------

/// Digit group per observation plus counts and proportions over the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitTally {
    /// Digit group assigned to each observation, aligned with the input.
    pub digits: Vec<DigitGroup>,
    /// Count per domain group, ascending by group.
    pub counts: Vec<u64>,
    /// `counts / n`; all zero when `n == 0`.
    pub proportions: Vec<Proportion>,
}

impl DigitTally {
    pub fn n(&self) -> usize {
        self.digits.len()
    }
}

fn tally(
    magnitudes: &[f64],
    number_of_digits: u32,
    stage: AnalysisStage,
) -> AnalysisResult<DigitTally> {
    let (lo, hi) = group_bounds(number_of_digits);
    let width = (hi - lo + 1) as usize;
    let mut counts = vec![0u64; width];
    let mut digits = Vec::with_capacity(magnitudes.len());
    for &m in magnitudes {
        let group = leading_digits(m, number_of_digits).ok_or_else(|| {
            BenfordError::InsufficientData {
                stage,
                reason: format!("value {m} has no leading digit"),
            }
        })?;
        counts[(group - lo) as usize] += 1;
        digits.push(group);
    }
    let n = digits.len();
    let proportions = counts
        .iter()
        .map(|&c| if n == 0 { 0.0 } else { c as f64 / n as f64 })
        .collect();
    Ok(DigitTally {
        digits,
        counts,
        proportions,
    })
}

/// First-order tally of the filtered magnitudes.
pub fn first_order(sample: &FilteredSample, number_of_digits: u32) -> AnalysisResult<DigitTally> {
    tally(&sample.magnitudes, number_of_digits, AnalysisStage::FirstOrder)
}

/// Differences of the sorted sample that carry a leading digit.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondOrderSample {
    pub differences: Vec<f64>,
    pub tally: DigitTally,
}

fn round_to(value: f64, round: u32) -> f64 {
    Decimal::from_f64(value)
        .and_then(|d| d.round_dp(round).to_f64())
        .unwrap_or_else(|| {
            let scale = 10f64.powi(round as i32);
            let scaled = value * scale;
            // Beyond 2^53 the value has no fractional part left to round.
            if scaled.is_finite() {
                scaled.round() / scale
            } else {
                value
            }
        })
}

/// Second-order tally: ascending sort of the signed sample, consecutive
/// differences, optional
/// rounding to `round` decimals, zero differences dropped.
///
/// Fewer than two observations, or a sample of identical values, produce an
/// empty tally rather than an error.
pub fn second_order(
    sample: &FilteredSample,
    number_of_digits: u32,
    discrete: bool,
    round: u32,
) -> AnalysisResult<SecondOrderSample> {
    if round > MAX_ROUND {
        return Err(BenfordError::Configuration {
            field: "round".into(),
            reason: format!("Must be at most {MAX_ROUND} decimal places."),
        });
    }
    // Signed values: with `SignFilter::Both` a -v/+v pair is 2v apart.
    let mut sorted = sample.values.clone();
    sorted.sort_by(f64::total_cmp);

    let differences: Vec<f64> = sorted
        .windows(2)
        .map(|w| w[1] - w[0])
        .map(|d| if discrete { round_to(d, round) } else { d })
        .filter(|d| d.is_finite() && *d > 0.0)
        .collect();

    let tally = tally(&differences, number_of_digits, AnalysisStage::SecondOrder)?;
    Ok(SecondOrderSample { differences, tally })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample(values: &[f64], sign: SignFilter) -> FilteredSample {
        let data: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
        filter_sample(&data, sign).unwrap()
    }

    #[test]
    fn test_positive_filter() {
        let s = sample(&[5.0, -3.0, 0.0, 12.0], SignFilter::Positive);
        assert_eq!(s.values, vec![5.0, 12.0]);
        assert_eq!(s.lines, vec![0, 3]);
    }

    #[test]
    fn test_negative_filter_keeps_sign() {
        let s = sample(&[5.0, -3.0, 0.0, -12.0], SignFilter::Negative);
        assert_eq!(s.values, vec![-3.0, -12.0]);
        assert_eq!(s.magnitudes, vec![3.0, 12.0]);
    }

    #[test]
    fn test_both_filter_drops_zero_and_missing() {
        let data = vec![Some(5.0), None, Some(0.0), Some(f64::NAN), Some(-2.0)];
        let s = filter_sample(&data, SignFilter::Both).unwrap();
        assert_eq!(s.values, vec![5.0, -2.0]);
        assert_eq!(s.lines, vec![0, 4]);
    }

    #[test]
    fn test_empty_after_filter() {
        let data = vec![Some(-5.0), Some(-10.0), Some(-15.0)];
        assert!(matches!(
            filter_sample(&data, SignFilter::Positive),
            Err(BenfordError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_sign_from_str() {
        assert_eq!("Both".parse::<SignFilter>().unwrap(), SignFilter::Both);
        assert!("sideways".parse::<SignFilter>().is_err());
    }

    #[test]
    fn test_first_order_counts() {
        let s = sample(&[100.0, 200.0, 150.0, 999.0], SignFilter::Positive);
        let t = first_order(&s, 1).unwrap();
        assert_eq!(t.digits, vec![1, 2, 1, 9]);
        assert_eq!(t.counts, vec![2, 1, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(t.proportions[0], 0.5);
    }

    #[test]
    fn test_second_order_identical_values_is_empty() {
        let s = sample(&[7.0; 5], SignFilter::Positive);
        let so = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(so.tally.n(), 0);
        assert!(so.tally.proportions.iter().all(|p| *p == 0.0));
    }

    #[test]
    fn test_second_order_single_value_is_empty() {
        let s = sample(&[42.0], SignFilter::Positive);
        assert_eq!(second_order(&s, 2, true, 3).unwrap().tally.n(), 0);
    }

    #[test]
    fn test_second_order_rounding_discards_noise() {
        let s = sample(&[1.1, 1.1 + 1e-9, 2.2], SignFilter::Positive);
        let rounded = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(rounded.differences.len(), 1);
        let raw = second_order(&s, 1, false, 3).unwrap();
        assert_eq!(raw.differences.len(), 2);
    }

    #[test]
    fn test_second_order_rounding_fixes_digits() {
        // 0.3 - 0.1 is 0.19999999999999998 in binary floating point.
        let s = sample(&[0.1, 0.3], SignFilter::Positive);
        let so = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(so.tally.digits, vec![2]);
    }

    #[test]
    fn test_second_order_mixed_signs() {
        let s = sample(&[-5.0, 5.0], SignFilter::Both);
        let so = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(so.differences, vec![10.0]);
        assert_eq!(so.tally.digits, vec![1]);

        let s = sample(&[20.0, -30.0, 10.0], SignFilter::Both);
        let so = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(so.differences, vec![40.0, 10.0]);
        assert_eq!(so.tally.digits, vec![4, 1]);
    }

    #[test]
    fn test_second_order_negative_sample() {
        let s = sample(&[-1.0, -4.0, -2.5], SignFilter::Negative);
        let so = second_order(&s, 1, true, 3).unwrap();
        assert_eq!(so.differences, vec![1.5, 1.5]);
    }

    #[test]
    fn test_round_to_huge_values_unchanged() {
        assert_eq!(round_to(1e300, MAX_ROUND), 1e300);
        assert_eq!(round_to(-4.5e299, 12), -4.5e299);
        assert_eq!(round_to(0.12345, 3), 0.123);
    }

    #[test]
    fn test_second_order_keeps_huge_differences() {
        let s = sample(&[1e300, 3.5e300, 9e300], SignFilter::Positive);
        let so = second_order(&s, 1, true, MAX_ROUND).unwrap();
        assert_eq!(so.differences.len(), 2);
        assert_eq!(so.tally.digits, vec![2, 5]);
    }

    #[test]
    fn test_round_out_of_range() {
        let s = sample(&[1.0, 2.0], SignFilter::Positive);
        assert!(matches!(
            second_order(&s, 1, true, MAX_ROUND + 1),
            Err(BenfordError::Configuration { .. })
        ));
    }
}
