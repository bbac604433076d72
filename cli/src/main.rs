//! `fixinsured`: the verifier's off-chain companion.
//!
//! Verifiers hold private booking records. Given the digest a policy
//! published, they recompute commitments locally and decide what to attest.

mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use config::VerifierConfig;
use fixinsured_crypto::ClaimTuple;
use fixinsured_types::{Address, Amount, ClaimDigest};
use fixinsured_utils::{init_logging, LogFormat};
use fixinsured_verification::VerifierRole;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fixinsured", about = "FIXInsured verifier companion", version)]
struct Cli {
    /// Path to a TOML configuration file. CLI flags and env vars override it.
    #[arg(long, env = "FIXINSURED_CONFIG")]
    config: Option<PathBuf>,

    /// Private flight records: CSV for a `.csv` file, JSON otherwise.
    #[arg(long, env = "FIXINSURED_DATASET")]
    dataset: Option<PathBuf>,

    /// Eligibility price tolerance in basis points (100 = ±1%).
    #[arg(long, env = "FIXINSURED_TOLERANCE_BPS")]
    tolerance_bps: Option<u32>,

    /// This verifier's address.
    #[arg(long, env = "FIXINSURED_VERIFIER")]
    verifier: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "FIXINSURED_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "FIXINSURED_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Compute the claim digest for an identity and trip.
    Commit {
        #[arg(long)]
        first: String,
        #[arg(long, default_value = "")]
        middle: String,
        #[arg(long)]
        last: String,
        #[arg(long)]
        confirmation: String,
        #[arg(long)]
        flight: String,
        /// Flight date, YYYY-MM-DD.
        #[arg(long)]
        date: String,
    },
    /// Is there a booking matching the digest priced within tolerance of the fixed loss?
    CheckEligibility {
        #[arg(long)]
        digest: ClaimDigest,
        #[arg(long)]
        fixed_loss: u128,
    },
    /// Is there a booking matching the digest whose flight was delayed?
    CheckAccident {
        #[arg(long)]
        digest: ClaimDigest,
    },
    /// Validate a policy parameter file and print a summary.
    Params {
        /// TOML file of policy creation parameters.
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => VerifierConfig::from_toml_file(path)?,
        None => VerifierConfig::default(),
    };
    let config = VerifierConfig {
        dataset: cli.dataset.or(file_config.dataset),
        tolerance_bps: cli.tolerance_bps.unwrap_or(file_config.tolerance_bps),
        verifier: cli.verifier.or(file_config.verifier),
        log_level: cli.log_level.unwrap_or(file_config.log_level),
        log_format: cli.log_format.unwrap_or(file_config.log_format),
    };
    init_logging(config.log_format, &config.log_level)?;
    if let Some(path) = &cli.config {
        tracing::debug!(path = %path.display(), "config loaded");
    }

    match cli.command {
        Command::Commit {
            first,
            middle,
            last,
            confirmation,
            flight,
            date,
        } => {
            let tuple = ClaimTuple::new(first, middle, last, confirmation, flight, date);
            println!("{}", commands::commit(&tuple));
        }
        Command::CheckEligibility { digest, fixed_loss } => {
            let answer = run_check(&config, VerifierRole::Eligibility, digest, fixed_loss)?;
            println!("{answer}");
        }
        Command::CheckAccident { digest } => {
            let answer = run_check(&config, VerifierRole::Accident, digest, 0)?;
            println!("{answer}");
        }
        Command::Params { file } => {
            println!("{}", commands::describe_params(&file)?);
        }
    }
    Ok(())
}

fn run_check(
    config: &VerifierConfig,
    role: VerifierRole,
    digest: ClaimDigest,
    fixed_loss: u128,
) -> anyhow::Result<bool> {
    let path = config
        .dataset
        .as_deref()
        .context("no dataset configured (use --dataset or FIXINSURED_DATASET)")?;
    let dataset = commands::load_dataset(path, config.tolerance_bps)?;
    let verifier = match &config.verifier {
        Some(raw) => Address::parse(raw)?,
        None => Address::new(commands::ANONYMOUS_VERIFIER),
    };
    Ok(commands::check(
        dataset,
        verifier,
        role,
        digest,
        Amount::new(fixed_loss),
    ))
}
