use napi::Result as NapiResult;
use napi_derive::napi;
use serde::Deserialize;

use benford_core::benford::{self, BenfordInput, RankingCriterion};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[napi]
pub fn analyze_benford(input_json: String) -> NapiResult<String> {
    let input: BenfordInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = benford::analyze_benford_with_metadata(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Analysis input plus the screening parameters of one query.
#[derive(Deserialize)]
struct ScreeningRequest {
    #[serde(flatten)]
    input: BenfordInput,
    #[serde(default)]
    by: RankingCriterion,
    #[serde(default = "default_top")]
    top: usize,
}

fn default_top() -> usize {
    2
}

#[napi]
pub fn suspects_table(input_json: String) -> NapiResult<String> {
    let request: ScreeningRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = benford::analyze_benford(&request.input).map_err(to_napi_error)?;
    serde_json::to_string(&result.suspects_table(request.by, request.top)).map_err(to_napi_error)
}

#[napi]
pub fn duplicates_table(input_json: String) -> NapiResult<String> {
    let request: ScreeningRequest = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let result = benford::analyze_benford(&request.input).map_err(to_napi_error)?;
    serde_json::to_string(&result.duplicates_table(request.top)).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Theoretical probabilities
// ---------------------------------------------------------------------------

#[napi]
pub fn benford_distribution(number_of_digits: u32) -> NapiResult<String> {
    let table =
        benford::distribution::benford_distribution(number_of_digits).map_err(to_napi_error)?;
    serde_json::to_string(&table).map_err(to_napi_error)
}

#[napi]
pub fn p_these_digits(digits: i64) -> NapiResult<f64> {
    u64::try_from(digits)
        .ok()
        .and_then(benford::digits::p_these_digits)
        .ok_or_else(|| to_napi_error(format!("{digits} is not a leading-digit sequence")))
}

#[napi]
pub fn p_this_digit_at_n(digit: u32, position: u32) -> NapiResult<f64> {
    benford::digits::p_this_digit_at_n(digit, position)
        .ok_or_else(|| to_napi_error(format!("digit {digit} cannot appear at position {position}")))
}
