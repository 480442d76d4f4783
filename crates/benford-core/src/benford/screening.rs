//! Screening queries over a finished analysis: which digit groups deviate
//! most, and which exact values repeat most often.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::analysis::{DigitRow, Observation};
use crate::error::BenfordError;

/// Column used to rank digit groups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingCriterion {
    #[default]
    AbsoluteDiff,
    SquaredDiff,
    Difference,
    AbsExcessSummation,
    AbsZStatistic,
}

impl RankingCriterion {
    fn key(self, row: &DigitRow) -> f64 {
        match self {
            RankingCriterion::AbsoluteDiff => row.absolute_diff,
            RankingCriterion::SquaredDiff => row.squared_diff,
            RankingCriterion::Difference => row.difference,
            RankingCriterion::AbsExcessSummation => row.abs_excess_summation,
            RankingCriterion::AbsZStatistic => row.z_statistic.abs(),
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankingCriterion::AbsoluteDiff => "absolute_diff",
            RankingCriterion::SquaredDiff => "squared_diff",
            RankingCriterion::Difference => "difference",
            RankingCriterion::AbsExcessSummation => "abs_excess_summation",
            RankingCriterion::AbsZStatistic => "abs_z_statistic",
        })
    }
}

impl FromStr for RankingCriterion {
    type Err = BenfordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('.', "_").as_str() {
            "absolute_diff" => Ok(RankingCriterion::AbsoluteDiff),
            "squared_diff" => Ok(RankingCriterion::SquaredDiff),
            "difference" => Ok(RankingCriterion::Difference),
            "abs_excess_summation" => Ok(RankingCriterion::AbsExcessSummation),
            "abs_z_statistic" | "z_statistic" => Ok(RankingCriterion::AbsZStatistic),
            _ => Err(BenfordError::Configuration {
                field: "by".into(),
                reason: "Must be 'absolute_diff', 'squared_diff', 'difference', \
                         'abs_excess_summation', or 'abs_z_statistic'."
                    .into(),
            }),
        }
    }
}

/// Rows sorted descending by `criterion` (ties by ascending digit group),
/// truncated to `top_n`.
pub fn rank_digit_rows(
    rows: &[DigitRow],
    criterion: RankingCriterion,
    top_n: usize,
) -> Vec<DigitRow> {
    let mut ranked = rows.to_vec();
    ranked.sort_by(|a, b| {
        criterion
            .key(b)
            .total_cmp(&criterion.key(a))
            .then(a.digits.cmp(&b.digits))
    });
    ranked.truncate(top_n);
    ranked
}

/// A value that occurs more than once in the analysed sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DuplicateValue {
    pub value: f64,
    pub count: usize,
}

/// Repeated values, most frequent first, then by ascending value.
pub fn duplicate_values(observations: &[Observation], top_n: usize) -> Vec<DuplicateValue> {
    let mut counts: BTreeMap<u64, usize> = BTreeMap::new();
    for obs in observations {
        // -0.0 never reaches here, the sign filter drops zeros.
        *counts.entry(obs.value.to_bits()).or_default() += 1;
    }
    let mut duplicates: Vec<DuplicateValue> = counts
        .into_iter()
        .filter(|&(_, count)| count > 1)
        .map(|(bits, count)| DuplicateValue {
            value: f64::from_bits(bits),
            count,
        })
        .collect();
    duplicates.sort_by(|a, b| match b.count.cmp(&a.count) {
        Ordering::Equal => a.value.total_cmp(&b.value),
        other => other,
    });
    duplicates.truncate(top_n);
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(digits: u64, difference: f64) -> DigitRow {
        DigitRow {
            digits,
            data_dist: 0.0,
            data_second_order_dist: 0.0,
            benford_dist: 0.1,
            data_dist_freq: 0,
            data_second_order_dist_freq: 0,
            benford_dist_freq: 1.0,
            benford_so_dist_freq: 0.0,
            data_summation: 0.0,
            abs_excess_summation: digits as f64,
            difference,
            squared_diff: difference * difference,
            absolute_diff: difference.abs(),
            z_statistic: -difference,
        }
    }

    fn obs(value: f64) -> Observation {
        Observation {
            line: 0,
            value,
            mantissa: 0.0,
            digits: 1,
        }
    }

    #[test]
    fn test_rank_by_absolute_diff() {
        let rows = vec![row(1, 0.5), row(2, -3.0), row(3, 2.0)];
        let ranked = rank_digit_rows(&rows, RankingCriterion::AbsoluteDiff, 2);
        let digits: Vec<u64> = ranked.iter().map(|r| r.digits).collect();
        assert_eq!(digits, vec![2, 3]);
    }

    #[test]
    fn test_rank_by_signed_difference() {
        let rows = vec![row(1, 0.5), row(2, -3.0), row(3, 2.0)];
        let ranked = rank_digit_rows(&rows, RankingCriterion::Difference, 3);
        let digits: Vec<u64> = ranked.iter().map(|r| r.digits).collect();
        assert_eq!(digits, vec![3, 1, 2]);
    }

    #[test]
    fn test_rank_ties_by_digit() {
        let rows = vec![row(5, 1.0), row(4, -1.0)];
        let ranked = rank_digit_rows(&rows, RankingCriterion::AbsoluteDiff, 5);
        assert_eq!(ranked[0].digits, 4);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_criterion_from_str() {
        assert_eq!(
            "absolute.diff".parse::<RankingCriterion>().unwrap(),
            RankingCriterion::AbsoluteDiff
        );
        assert!("largest".parse::<RankingCriterion>().is_err());
    }

    #[test]
    fn test_duplicates() {
        let data = vec![obs(50.0), obs(12.5), obs(50.0), obs(12.5), obs(50.0), obs(7.0)];
        let dups = duplicate_values(&data, 10);
        assert_eq!(
            dups,
            vec![
                DuplicateValue { value: 50.0, count: 3 },
                DuplicateValue { value: 12.5, count: 2 },
            ]
        );
    }

    #[test]
    fn test_duplicates_top_n() {
        let data = vec![obs(1.0), obs(1.0), obs(2.0), obs(2.0)];
        let dups = duplicate_values(&data, 1);
        assert_eq!(dups, vec![DuplicateValue { value: 1.0, count: 2 }]);
    }
}
