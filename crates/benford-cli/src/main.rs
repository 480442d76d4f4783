mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use commands::benford::{AnalyzeArgs, DuplicatesArgs, SuspectsArgs};
use commands::digits::{DigitProbabilityArgs, DistributionArgs};

/// Benford's Law digit analysis for fraud and anomaly screening
#[derive(Parser)]
#[command(
    name = "benford",
    version,
    about = "Benford's Law digit analysis",
    long_about = "A CLI for testing numeric samples against Benford's Law. Computes \
                  first- and second-order digit distributions, summation and mantissa \
                  tests, MAD conformity, the distortion factor, and chi-squared, \
                  Mantissa Arc and Kolmogorov-Smirnov tests."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log analysis stages to stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full Benford analysis on a sample
    Analyze(AnalyzeArgs),
    /// Rank the digit groups that deviate most from Benford
    Suspects(SuspectsArgs),
    /// List values that repeat in the analysed sample
    Duplicates(DuplicatesArgs),
    /// Print the theoretical Benford distribution for a digit width
    Distribution(DistributionArgs),
    /// Benford probability of a digit sequence, or of a digit at a position
    DigitProbability(DigitProbabilityArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "benford_core=debug,benford=debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Analyze(args) => commands::benford::run_analyze(args),
        Commands::Suspects(args) => commands::benford::run_suspects(args),
        Commands::Duplicates(args) => commands::benford::run_duplicates(args),
        Commands::Distribution(args) => commands::digits::run_distribution(args),
        Commands::DigitProbability(args) => commands::digits::run_digit_probability(args),
        Commands::Version => {
            println!("benford {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
