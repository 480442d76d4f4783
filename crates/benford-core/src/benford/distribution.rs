//! Theoretical Benford distribution for k-digit leading sequences.

use serde::{Deserialize, Serialize};

use super::digits::{group_bounds, p_these_digits};
use crate::error::{AnalysisStage, BenfordError};
use crate::types::{DigitGroup, Proportion};
use crate::AnalysisResult;

/// Largest supported digit-group width. The whole domain is materialized,
/// 7 digits is already 9 000 000 groups.
pub const MAX_NUMBER_OF_DIGITS: u32 = 7;

/// Expected probability for a single digit group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitProbability {
    pub digits: DigitGroup,
    pub probability: Proportion,
}

/// Ordered digit-group domain: 1..=9 for one digit, 10^(k-1)..10^k-1 otherwise.
pub fn digit_groups(number_of_digits: u32) -> AnalysisResult<Vec<DigitGroup>> {
    validate_number_of_digits(number_of_digits)?;
    let (lo, hi) = group_bounds(number_of_digits);
    Ok((lo..=hi).collect())
}

/// Benford probabilities `log10(1 + 1/d)` over the full domain, ascending.
pub fn benford_distribution(number_of_digits: u32) -> AnalysisResult<Vec<DigitProbability>> {
    digit_groups(number_of_digits)?
        .into_iter()
        .map(|digits| match p_these_digits(digits) {
            Some(probability) if probability > 0.0 => Ok(DigitProbability {
                digits,
                probability,
            }),
            _ => Err(BenfordError::DegenerateDistribution {
                stage: AnalysisStage::TheoreticalDistribution,
                context: format!("digit group {digits} has no positive probability"),
            }),
        })
        .collect()
}

pub(crate) fn validate_number_of_digits(number_of_digits: u32) -> AnalysisResult<()> {
    if number_of_digits == 0 || number_of_digits > MAX_NUMBER_OF_DIGITS {
        return Err(BenfordError::Configuration {
            field: "number_of_digits".into(),
            reason: format!("Must be between 1 and {MAX_NUMBER_OF_DIGITS}."),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_digit_domain() {
        assert_eq!(digit_groups(1).unwrap(), (1..=9).collect::<Vec<_>>());
    }

    #[test]
    fn test_two_digit_domain() {
        let groups = digit_groups(2).unwrap();
        assert_eq!(groups.len(), 90);
        assert_eq!(groups.first(), Some(&10));
        assert_eq!(groups.last(), Some(&99));
    }

    #[test]
    fn test_distribution_sums_to_one() {
        for k in 1..=5 {
            let total: f64 = benford_distribution(k)
                .unwrap()
                .iter()
                .map(|p| p.probability)
                .sum();
            assert!((total - 1.0).abs() < 1e-9, "k={k} total={total}");
        }
    }

    #[test]
    fn test_distribution_is_decreasing() {
        let dist = benford_distribution(2).unwrap();
        assert!(dist.windows(2).all(|w| w[0].probability > w[1].probability));
    }

    #[test]
    fn test_classical_first_digit_law() {
        let dist = benford_distribution(1).unwrap();
        assert!((dist[0].probability - 0.30103).abs() < 1e-5);
        assert!((dist[8].probability - 0.045757).abs() < 1e-6);
    }

    #[test]
    fn test_zero_digits_rejected() {
        assert!(matches!(
            digit_groups(0),
            Err(BenfordError::Configuration { .. })
        ));
    }

    #[test]
    fn test_too_many_digits_rejected() {
        assert!(benford_distribution(MAX_NUMBER_OF_DIGITS + 1).is_err());
    }
}
