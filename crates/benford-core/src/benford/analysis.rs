//! Full Benford analysis of a numeric sample.
//!
//! Runs the whole pipeline (filtering, first- and second-order digit
//! distributions, summation, mantissa moments and the conformity tests) and
//! assembles a single read-only [`BenfordResult`].

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::conformity::{self, DistortionFactor, HypothesisTest, MadConformity};
use super::digits::mantissa;
use super::distribution::{benford_distribution, validate_number_of_digits};
use super::empirical::{self, SignFilter, MAX_ROUND};
use super::mantissa::{mantissa_summary, MantissaMoment};
use super::screening::{self, DuplicateValue, RankingCriterion};
use super::summation::{summation_by_digits, DigitSummation};
use crate::error::{AnalysisStage, BenfordError};
use crate::types::{with_metadata, ComputationOutput, DigitGroup, Proportion};
use crate::AnalysisResult;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Sample and configuration for one analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenfordInput {
    /// Raw sample; `null` entries are treated as missing.
    pub data: Vec<Option<f64>>,
    /// Width of the leading-digit groups.
    #[serde(default = "default_number_of_digits")]
    pub number_of_digits: u32,
    #[serde(default)]
    pub sign: SignFilter,
    /// Round second-order differences before extracting digits.
    #[serde(default = "default_discrete")]
    pub discrete: bool,
    /// Decimal places used when `discrete` is set.
    #[serde(default = "default_round")]
    pub round: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_name: Option<String>,
}

fn default_number_of_digits() -> u32 {
    2
}

fn default_discrete() -> bool {
    true
}

fn default_round() -> u32 {
    3
}

impl BenfordInput {
    /// Input with the default configuration: two digits, positive values,
    /// discrete data rounded to three decimals.
    pub fn new(data: impl IntoIterator<Item = f64>) -> Self {
        Self::from_raw(data.into_iter().map(Some).collect())
    }

    /// Like [`BenfordInput::new`] for a sample with missing entries.
    pub fn from_raw(data: Vec<Option<f64>>) -> Self {
        Self {
            data,
            number_of_digits: default_number_of_digits(),
            sign: SignFilter::default(),
            discrete: default_discrete(),
            round: default_round(),
            data_name: None,
        }
    }

    pub fn with_number_of_digits(mut self, number_of_digits: u32) -> Self {
        self.number_of_digits = number_of_digits;
        self
    }

    pub fn with_sign(mut self, sign: SignFilter) -> Self {
        self.sign = sign;
        self
    }

    pub fn with_discrete(mut self, discrete: bool, round: u32) -> Self {
        self.discrete = discrete;
        self.round = round;
        self
    }

    pub fn with_data_name(mut self, name: impl Into<String>) -> Self {
        self.data_name = Some(name.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Sample metadata and the configuration the result was computed with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleInfo {
    pub data_name: String,
    /// Length of the raw input, missing entries included.
    pub n_input: usize,
    /// Observations that passed the sign filter.
    pub n: usize,
    /// Positive second-order differences.
    pub n_second_order: usize,
    pub number_of_digits: u32,
    pub sign: SignFilter,
    pub discrete: bool,
    pub round: u32,
}

/// One row of the digit table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DigitRow {
    pub digits: DigitGroup,
    pub data_dist: Proportion,
    pub data_second_order_dist: Proportion,
    pub benford_dist: Proportion,
    pub data_dist_freq: u64,
    pub data_second_order_dist_freq: u64,
    pub benford_dist_freq: f64,
    pub benford_so_dist_freq: f64,
    pub data_summation: f64,
    pub abs_excess_summation: f64,
    /// `data_dist_freq - benford_dist_freq`.
    pub difference: f64,
    /// `difference² / benford_dist_freq`.
    pub squared_diff: f64,
    pub absolute_diff: f64,
    pub z_statistic: f64,
}

/// Second-order view of a digit row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderRow {
    pub digits: DigitGroup,
    pub data_second_order_dist: Proportion,
    pub benford_dist: Proportion,
    pub data_second_order_dist_freq: u64,
    pub benford_so_dist_freq: f64,
}

/// A filtered observation and its derived digit data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Zero-based position in the raw input.
    pub line: usize,
    pub value: f64,
    pub mantissa: f64,
    pub digits: DigitGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderObservation {
    pub difference: f64,
    pub digits: DigitGroup,
}

/// Complete, read-only result of a Benford analysis.
///
/// Only [`analyze_benford`] builds one, so it serializes but never
/// deserializes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenfordResult {
    info: SampleInfo,
    data: Vec<Observation>,
    second_order_data: Vec<SecondOrderObservation>,
    bfd: Vec<DigitRow>,
    mantissa: Vec<MantissaMoment>,
    mad: f64,
    mad_conformity: Option<MadConformity>,
    distortion_factor: DistortionFactor,
    chi_squared: HypothesisTest,
    mantissa_arc_test: HypothesisTest,
    mantissa_arc_l_squared: f64,
    ks_test: HypothesisTest,
}

impl BenfordResult {
    pub fn info(&self) -> &SampleInfo {
        &self.info
    }

    /// Per-digit table, ascending by digit group.
    pub fn digit_table(&self) -> &[DigitRow] {
        &self.bfd
    }

    pub fn second_order_table(&self) -> Vec<SecondOrderRow> {
        self.bfd
            .iter()
            .map(|r| SecondOrderRow {
                digits: r.digits,
                data_second_order_dist: r.data_second_order_dist,
                benford_dist: r.benford_dist,
                data_second_order_dist_freq: r.data_second_order_dist_freq,
                benford_so_dist_freq: r.benford_so_dist_freq,
            })
            .collect()
    }

    pub fn summation_table(&self) -> Vec<DigitSummation> {
        self.bfd
            .iter()
            .map(|r| DigitSummation {
                digits: r.digits,
                data_summation: r.data_summation,
                abs_excess_summation: r.abs_excess_summation,
            })
            .collect()
    }

    pub fn mantissa_table(&self) -> &[MantissaMoment] {
        &self.mantissa
    }

    pub fn observations(&self) -> &[Observation] {
        &self.data
    }

    pub fn second_order_observations(&self) -> &[SecondOrderObservation] {
        &self.second_order_data
    }

    pub fn mad(&self) -> f64 {
        self.mad
    }

    /// `None` when the digit width has no published MAD thresholds.
    pub fn mad_conformity(&self) -> Option<MadConformity> {
        self.mad_conformity
    }

    pub fn distortion_factor(&self) -> &DistortionFactor {
        &self.distortion_factor
    }

    pub fn chi_squared(&self) -> &HypothesisTest {
        &self.chi_squared
    }

    pub fn mantissa_arc_test(&self) -> &HypothesisTest {
        &self.mantissa_arc_test
    }

    /// Squared mean resultant length of the mantissa angles.
    pub fn mantissa_arc_l_squared(&self) -> f64 {
        self.mantissa_arc_l_squared
    }

    pub fn ks_test(&self) -> &HypothesisTest {
        &self.ks_test
    }

    /// Digit rows ranked descending by `criterion`, at most `top_n` of them.
    pub fn suspects_table(&self, criterion: RankingCriterion, top_n: usize) -> Vec<DigitRow> {
        screening::rank_digit_rows(&self.bfd, criterion, top_n)
    }

    /// Most frequently repeated values of the filtered sample.
    pub fn duplicates_table(&self, top_n: usize) -> Vec<DuplicateValue> {
        screening::duplicate_values(&self.data, top_n)
    }
}

// ---------------------------------------------------------------------------
// Core function
// ---------------------------------------------------------------------------

fn validate(input: &BenfordInput) -> AnalysisResult<()> {
    validate_number_of_digits(input.number_of_digits)?;
    if input.round > MAX_ROUND {
        return Err(BenfordError::Configuration {
            field: "round".into(),
            reason: format!("Must be at most {MAX_ROUND} decimal places."),
        });
    }
    if input.data.is_empty() {
        return Err(BenfordError::InsufficientData {
            stage: AnalysisStage::Validation,
            reason: "At least one data point is required.".into(),
        });
    }
    Ok(())
}

/// Perform a complete Benford's Law analysis of `input.data`.
#[tracing::instrument(
    name = "benford_analysis",
    skip_all,
    fields(n_input = input.data.len(), digits = input.number_of_digits, sign = %input.sign)
)]
pub fn analyze_benford(input: &BenfordInput) -> AnalysisResult<BenfordResult> {
    validate(input)?;
    let k = input.number_of_digits;

    let sample = empirical::filter_sample(&input.data, input.sign)?;

    let theoretical = benford_distribution(k)?;
    let benford_dist: Vec<Proportion> = theoretical.iter().map(|p| p.probability).collect();
    tracing::debug!(groups = benford_dist.len(), "theoretical distribution built");

    let first = empirical::first_order(&sample, k)?;
    let n = first.n();
    tracing::debug!(n, excluded = input.data.len() - n, "first-order distribution built");

    let second = empirical::second_order(&sample, k, input.discrete, input.round)?;
    let n_second_order = second.tally.n();
    if n_second_order == 0 {
        tracing::debug!("second-order sample is empty");
    } else {
        tracing::debug!(n_second_order, "second-order distribution built");
    }

    let z = conformity::z_statistics(&first.proportions, &benford_dist, n)?;
    let mad = conformity::mean_absolute_deviation(&first.proportions, &benford_dist);
    let mad_conformity = conformity::mad_conformity(mad, k);
    let summation = summation_by_digits(&sample.magnitudes, &first.digits, k)?;

    let mantissas: Vec<f64> = sample
        .magnitudes
        .iter()
        .map(|&m| {
            mantissa(m).ok_or_else(|| BenfordError::InsufficientData {
                stage: AnalysisStage::Mantissa,
                reason: format!("value {m} has no mantissa"),
            })
        })
        .collect::<AnalysisResult<_>>()?;
    let moments = mantissa_summary(&mantissas)?;
    let distortion_factor = conformity::distortion_factor(&mantissas)?;

    let chi_squared = conformity::chi_squared_test(&first.counts, &benford_dist)?;
    let (mantissa_arc_test, mantissa_arc_l_squared) = conformity::mantissa_arc_test(&mantissas)?;
    let ks_test = conformity::kolmogorov_smirnov_test(&first.proportions, &benford_dist, n);
    tracing::debug!(
        chi_squared = chi_squared.statistic,
        mat = mantissa_arc_test.statistic,
        ks = ks_test.statistic,
        "conformity tests complete"
    );

    let nf = n as f64;
    let nso = n_second_order as f64;
    let bfd: Vec<DigitRow> = theoretical
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let data_dist_freq = first.counts[i];
            let benford_dist_freq = p.probability * nf;
            let difference = data_dist_freq as f64 - benford_dist_freq;
            DigitRow {
                digits: p.digits,
                data_dist: first.proportions[i],
                data_second_order_dist: second.tally.proportions[i],
                benford_dist: p.probability,
                data_dist_freq,
                data_second_order_dist_freq: second.tally.counts[i],
                benford_dist_freq,
                benford_so_dist_freq: p.probability * nso,
                data_summation: summation[i].data_summation,
                abs_excess_summation: summation[i].abs_excess_summation,
                difference,
                squared_diff: difference * difference / benford_dist_freq,
                absolute_diff: difference.abs(),
                z_statistic: z[i],
            }
        })
        .collect();

    let data = sample
        .lines
        .iter()
        .zip(&sample.values)
        .zip(mantissas.iter().zip(&first.digits))
        .map(|((&line, &value), (&mantissa, &digits))| Observation {
            line,
            value,
            mantissa,
            digits,
        })
        .collect();
    let second_order_data = second
        .differences
        .iter()
        .zip(&second.tally.digits)
        .map(|(&difference, &digits)| SecondOrderObservation { difference, digits })
        .collect();

    tracing::info!(
        n,
        n_second_order,
        mad,
        conformity = mad_conformity.map_or("undefined", MadConformity::label),
        "benford analysis complete"
    );

    Ok(BenfordResult {
        info: SampleInfo {
            data_name: input.data_name.clone().unwrap_or_else(|| "data".into()),
            n_input: input.data.len(),
            n,
            n_second_order,
            number_of_digits: k,
            sign: input.sign,
            discrete: input.discrete,
            round: input.round,
        },
        data,
        second_order_data,
        bfd,
        mantissa: moments.table(),
        mad,
        mad_conformity,
        distortion_factor,
        chi_squared,
        mantissa_arc_test,
        mantissa_arc_l_squared,
        ks_test,
    })
}

fn collect_warnings(result: &BenfordResult) -> Vec<String> {
    let mut warnings = Vec::new();
    let info = result.info();
    if info.n_second_order == 0 {
        warnings.push(
            "Second-order sample is empty: fewer than two distinct values after filtering."
                .to_string(),
        );
    }
    if result.mad_conformity().is_none() {
        warnings.push(format!(
            "MAD conformity is undefined for {} digits; thresholds exist for 1 to 3.",
            info.number_of_digits
        ));
    }
    let sparse = result
        .digit_table()
        .iter()
        .filter(|r| r.benford_dist_freq < 5.0)
        .count();
    if sparse > 0 {
        warnings.push(format!(
            "{sparse} digit groups have an expected frequency below 5; chi-squared is unreliable."
        ));
    }
    warnings
}

/// [`analyze_benford`] wrapped in the computation envelope.
pub fn analyze_benford_with_metadata(
    input: &BenfordInput,
) -> AnalysisResult<ComputationOutput<BenfordResult>> {
    let start = Instant::now();
    let result = analyze_benford(input)?;
    let warnings = collect_warnings(&result);
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Benford's Law digit analysis (first and second order, Nigrini conformity)",
        &serde_json::json!({
            "number_of_digits": input.number_of_digits,
            "sign": input.sign,
            "discrete": input.discrete,
            "round": input.round,
        }),
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
