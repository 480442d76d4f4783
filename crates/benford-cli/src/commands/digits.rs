use clap::Args;
use serde_json::{json, Value};

use benford_core::benford::digits;
use benford_core::benford::distribution;

/// Arguments for printing the theoretical distribution
#[derive(Args)]
pub struct DistributionArgs {
    /// Width of the leading-digit group (1..=7)
    #[arg(long, default_value_t = 1)]
    pub digits: u32,
}

pub fn run_distribution(args: DistributionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = distribution::benford_distribution(args.digits)?;
    Ok(serde_json::to_value(table)?)
}

/// Arguments for a single Benford probability
#[derive(Args)]
pub struct DigitProbabilityArgs {
    /// Leading digit sequence, e.g. 314 for "starts with 314"
    #[arg(long, conflicts_with_all = ["digit", "position"])]
    pub digits: Option<u64>,

    /// Single digit (0-9) at --position
    #[arg(long, requires = "position")]
    pub digit: Option<u32>,

    /// One-based position of --digit (the first digit is position 1)
    #[arg(long, requires = "digit")]
    pub position: Option<u32>,
}

pub fn run_digit_probability(
    args: DigitProbabilityArgs,
) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(sequence) = args.digits {
        let p = digits::p_these_digits(sequence)
            .ok_or_else(|| format!("{sequence} is not a leading-digit sequence"))?;
        return Ok(json!({ "digits": sequence, "probability": p }));
    }
    let digit = args.digit.ok_or("--digits or --digit with --position is required")?;
    let position = args.position.ok_or("--position is required with --digit")?;
    let p = digits::p_this_digit_at_n(digit, position)
        .ok_or_else(|| format!("digit {digit} cannot appear at position {position}"))?;
    Ok(json!({ "digit": digit, "position": position, "probability": p }))
}
