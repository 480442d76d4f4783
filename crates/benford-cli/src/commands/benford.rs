use clap::Args;
use serde_json::Value;

use benford_core::benford::{self, BenfordInput, RankingCriterion, SignFilter};

use crate::input;
use crate::input::stdin::StdinPayload;

/// Where the sample comes from, plus per-run overrides of the analysis
/// configuration.
#[derive(Args)]
pub struct SourceArgs {
    /// Path to a JSON or YAML analysis input file
    #[arg(long, conflicts_with_all = ["csv", "values"])]
    pub input: Option<String>,

    /// Path to a CSV file (use with --column)
    #[arg(long, requires = "column", conflicts_with = "values")]
    pub csv: Option<String>,

    /// Header of the numeric CSV column to analyse
    #[arg(long)]
    pub column: Option<String>,

    /// Sample values (comma-separated, e.g. "1234.5,-87,310")
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub values: Option<Vec<f64>>,

    /// Width of the leading-digit group (1..=7)
    #[arg(long)]
    pub digits: Option<u32>,

    /// Which values to analyse: positive, negative or both
    #[arg(long)]
    pub sign: Option<String>,

    /// Treat the data as continuous: do not round second-order differences
    #[arg(long)]
    pub continuous: bool,

    /// Decimal places used to round second-order differences
    #[arg(long)]
    pub round: Option<u32>,

    /// Label recorded in the result
    #[arg(long)]
    pub name: Option<String>,
}

fn load_input(args: &SourceArgs) -> Result<BenfordInput, Box<dyn std::error::Error>> {
    let mut bf_input: BenfordInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(ref path) = args.csv {
        let column = args.column.as_deref().ok_or("--column is required with --csv")?;
        BenfordInput::from_raw(input::csv_in::read_column(path, column)?)
            .with_data_name(column)
    } else if let Some(ref values) = args.values {
        BenfordInput::new(values.iter().copied())
    } else if let Some(payload) = input::stdin::read_stdin()? {
        match payload {
            StdinPayload::Json(Value::Array(items)) => {
                BenfordInput::from_raw(serde_json::from_value(Value::Array(items))?)
            }
            StdinPayload::Json(data) => serde_json::from_value(data)?,
            StdinPayload::Values(values) => BenfordInput::from_raw(values),
        }
    } else {
        return Err("provide --input, --csv with --column, --values, or pipe data on stdin".into());
    };

    if let Some(k) = args.digits {
        bf_input = bf_input.with_number_of_digits(k);
    }
    if let Some(ref sign) = args.sign {
        bf_input = bf_input.with_sign(sign.parse::<SignFilter>()?);
    }
    if args.continuous || args.round.is_some() {
        let discrete = bf_input.discrete && !args.continuous;
        let round = args.round.unwrap_or(bf_input.round);
        bf_input = bf_input.with_discrete(discrete, round);
    }
    if let Some(ref name) = args.name {
        bf_input = bf_input.with_data_name(name);
    }
    tracing::debug!(
        entries = bf_input.data.len(),
        number_of_digits = bf_input.number_of_digits,
        sign = %bf_input.sign,
        "analysis input loaded"
    );
    Ok(bf_input)
}

/// Arguments for a full Benford analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Keep the per-observation tables in the output
    #[arg(long)]
    pub include_data: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bf_input = load_input(&args.source)?;
    let output = benford::analyze_benford_with_metadata(&bf_input)?;
    let mut value = serde_json::to_value(output)?;
    if !args.include_data {
        if let Some(Value::Object(result)) = value.get_mut("result") {
            result.remove("data");
            result.remove("second_order_data");
        }
    }
    Ok(value)
}

/// Arguments for ranking the most deviant digit groups
#[derive(Args)]
pub struct SuspectsArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Ranking column: absolute_diff, squared_diff, difference,
    /// abs_excess_summation or abs_z_statistic
    #[arg(long, default_value = "absolute_diff")]
    pub by: String,

    /// Number of digit groups to report
    #[arg(long, default_value_t = 2)]
    pub top: usize,
}

pub fn run_suspects(args: SuspectsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let criterion: RankingCriterion = args.by.parse()?;
    let bf_input = load_input(&args.source)?;
    let result = benford::analyze_benford(&bf_input)?;
    Ok(serde_json::to_value(result.suspects_table(criterion, args.top))?)
}

/// Arguments for listing repeated values
#[derive(Args)]
pub struct DuplicatesArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Number of values to report
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

pub fn run_duplicates(args: DuplicatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let bf_input = load_input(&args.source)?;
    let result = benford::analyze_benford(&bf_input)?;
    Ok(serde_json::to_value(result.duplicates_table(args.top))?)
}
