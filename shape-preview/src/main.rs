//! Liquidity Shape Preview
//!
//! Shows how a deposit would be spread over DLMM bins for a chosen shape
//! before any transaction is built. Configuration comes from `PREVIEW_*`
//! environment variables (or a `.env` file), an optional TOML strategy file,
//! and command line flags, in increasing order of priority.

use anyhow::Result;
use clap::{Parser, Subcommand};
use log::{info, warn};
use rust_decimal::Decimal;
use std::path::PathBuf;

use shape_preview::amounts::from_base_units;
use shape_preview::config::{parse_param, PreviewConfig, PreviewOverrides, SideOverrides};
use shape_preview::{
    allocate, generate_weights, preview_from_shapes, AllocationConstraints, AllocationResult,
    ShapeParams,
};

/// Command line interface for liquidity shape previews
#[derive(Parser)]
#[command(name = "preview")]
#[command(about = "Preview how a liquidity shape splits a deposit across DLMM bins")]
struct Cli {
    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the weight curve for one side
    Weights {
        /// Shape family (flat, gaussian, gaussian-with-edge-boost, exponential, inverse-power, wall-then-decay)
        #[arg(long)]
        family: String,
        /// Number of bins, nearest to the active bin first
        #[arg(long, allow_hyphen_values = true)]
        bins: i64,
        /// Shape parameter as key=value, repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, f64)>,
    },
    /// Allocate a base-unit amount over explicit weights
    Allocate {
        /// Total amount in base units
        #[arg(long, allow_hyphen_values = true)]
        amount: i64,
        /// Left-side weights, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        left: Vec<f64>,
        /// Right-side weights, comma separated
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        right: Vec<f64>,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        min_per_bin: i64,
        #[arg(long)]
        max_bins: Option<usize>,
    },
    /// Generate both sides from shapes and allocate a UI amount
    Shape {
        /// TOML strategy file
        #[arg(long)]
        strategy: Option<PathBuf>,
        /// Deposit in UI units (e.g. 1500.5)
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<Decimal>,
        /// Mint decimals used to convert the amount to base units
        #[arg(long)]
        decimals: Option<u8>,
        #[arg(long)]
        left_family: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        left_bins: Option<i64>,
        #[arg(long = "left-param", value_parser = parse_param)]
        left_params: Vec<(String, f64)>,
        #[arg(long)]
        right_family: Option<String>,
        #[arg(long, allow_hyphen_values = true)]
        right_bins: Option<i64>,
        #[arg(long = "right-param", value_parser = parse_param)]
        right_params: Vec<(String, f64)>,
        #[arg(long, allow_hyphen_values = true)]
        min_per_bin: Option<i64>,
        #[arg(long)]
        max_bins: Option<usize>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Weights { family, bins, params } => {
            let params: ShapeParams = params.into_iter().collect();
            let weights = generate_weights(&family, bins, &params)?;
            print_weights(&weights, cli.json)?;
        }
        Commands::Allocate {
            amount,
            left,
            right,
            min_per_bin,
            max_bins,
        } => {
            let constraints = AllocationConstraints::new(min_per_bin, max_bins);
            let result = allocate(amount, &left, &right, &constraints)?;
            print_allocation(&result, 0, cli.json)?;
        }
        Commands::Shape {
            strategy,
            amount,
            decimals,
            left_family,
            left_bins,
            left_params,
            right_family,
            right_bins,
            right_params,
            min_per_bin,
            max_bins,
        } => {
            let flags = PreviewOverrides {
                total_amount: amount,
                decimals,
                min_per_bin,
                max_bins,
                left: side_flags(left_family, left_bins, left_params),
                right: side_flags(right_family, right_bins, right_params),
            };
            let file = match strategy {
                Some(path) => {
                    info!("Loading strategy from {}", path.display());
                    PreviewOverrides::from_file(&path)?
                }
                None => PreviewOverrides::default(),
            };
            let config = flags.or(file).or(PreviewOverrides::from_env()?).resolve()?;

            run_shape_preview(&config, cli.json)?;
        }
    }

    Ok(())
}

fn side_flags(
    family: Option<String>,
    bins: Option<i64>,
    params: Vec<(String, f64)>,
) -> SideOverrides {
    SideOverrides {
        family,
        bins,
        params: if params.is_empty() {
            None
        } else {
            Some(params.into_iter().collect())
        },
    }
}

fn run_shape_preview(config: &PreviewConfig, json: bool) -> Result<()> {
    info!(
        "Previewing {} ({} base units) with {} x{} left, {} x{} right",
        config.ui_amount,
        config.total_amount,
        config.left.family,
        config.left.bins,
        config.right.family,
        config.right.bins
    );

    let result = preview_from_shapes(
        config.total_amount,
        &config.left,
        &config.right,
        &config.constraints,
    )?;

    if json {
        let report = serde_json::json!({
            "config": config,
            "result": result,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_allocation(&result, config.decimals, false)
}

fn print_weights(weights: &[f64], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(weights)?);
        return Ok(());
    }

    let total: f64 = weights.iter().sum();
    println!("{:>6}  {:>14}  {:>8}", "bin", "weight", "share");
    for (i, weight) in weights.iter().enumerate() {
        let share = if total > 0.0 { weight / total * 100.0 } else { 0.0 };
        println!("{:>6}  {:>14.6}  {:>7.2}%", i + 1, weight, share);
    }
    Ok(())
}

fn print_allocation(result: &AllocationResult, decimals: u8, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    println!("{:>7}  {:>20}  {:>24}", "offset", "amount", "ui amount");
    for (offset, amount) in result.by_offset() {
        println!(
            "{:>7}  {:>20}  {:>24}",
            offset,
            amount,
            from_base_units(amount, decimals)?
        );
    }

    println!();
    println!("Total allocated: {}", result.total_allocated);
    println!("Remainder:       {}", result.remainder);
    println!("Bins touched:    {}", result.bins_touched);
    for warning in &result.warnings {
        warn!("⚠️  {}", warning);
    }

    Ok(())
}
