//! Summation by digit group.
//!
//! Under Benford's Law every digit group is expected to contribute the same
//! total amount; groups whose sum stands out indicate a few large values
//! dominating the dataset.

use serde::{Deserialize, Serialize};

use super::digits::group_bounds;
use crate::error::{AnalysisStage, BenfordError};
use crate::types::DigitGroup;
use crate::AnalysisResult;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitSummation {
    pub digits: DigitGroup,
    pub data_summation: f64,
    pub abs_excess_summation: f64,
}

/// Sum `magnitudes` per assigned digit group over the full domain.
pub fn summation_by_digits(
    magnitudes: &[f64],
    digits: &[DigitGroup],
    number_of_digits: u32,
) -> AnalysisResult<Vec<DigitSummation>> {
    if magnitudes.len() != digits.len() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::Summation,
            reason: format!(
                "{} values but {} digit assignments",
                magnitudes.len(),
                digits.len()
            ),
        });
    }
    let (lo, hi) = group_bounds(number_of_digits);
    let mut sums = vec![0.0; (hi - lo + 1) as usize];
    for (&m, &d) in magnitudes.iter().zip(digits) {
        sums[(d - lo) as usize] += m;
    }
    let mean = sums.iter().sum::<f64>() / sums.len() as f64;
    Ok(sums
        .into_iter()
        .zip(lo..=hi)
        .map(|(data_summation, digits)| DigitSummation {
            digits,
            data_summation,
            abs_excess_summation: (data_summation - mean).abs(),
        })
        .collect())
}
