//! Ballast CLI binary.
//!
//! Provides a command-line interface for computing portfolio weights from
//! insight files and return tables.

mod cmd;
mod config;
mod data;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::OutputFormat;
use cmd::optimize::Method;
use cmd::weights::Scheme;
use config::Settings;

#[derive(Parser)]
#[command(name = "ballast")]
#[command(about = "Portfolio weight construction from insights and return histories")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// JSON settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute target weights from active insights
    Weights {
        /// JSON array of insights
        #[arg(short, long)]
        insights: PathBuf,

        /// Weighting scheme
        #[arg(short, long, value_enum, default_value = "equal")]
        scheme: Scheme,

        /// JSON object mapping symbol to sector (sector scheme)
        #[arg(long)]
        sectors: Option<PathBuf>,

        /// Evaluation time (RFC 3339 or YYYY-MM-DD, defaults to the latest insight)
        #[arg(long)]
        at: Option<String>,
    },

    /// Optimize weights over a return history
    Optimize {
        /// CSV of periodic returns, one column per symbol
        #[arg(short, long)]
        returns: PathBuf,

        /// Optimization method
        #[arg(short, long, value_enum, default_value = "risk-parity")]
        method: Method,

        /// JSON array of insights restricting the universe (and providing views)
        #[arg(short, long)]
        insights: Option<PathBuf>,

        /// Risk budget per asset (risk-parity only)
        #[arg(short, long, value_delimiter = ',')]
        budget: Vec<f64>,
    },
}

fn main() {
    let _ = dotenvy::dotenv();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Weights {
            insights,
            scheme,
            sectors,
            at,
        } => {
            cmd::weights::compute_weights(
                &insights,
                scheme,
                sectors.as_deref(),
                at.as_deref(),
                &settings,
                cli.format,
            )?;
        }
        Commands::Optimize {
            returns,
            method,
            insights,
            budget,
        } => {
            cmd::optimize::optimize_weights(
                &returns,
                method,
                insights.as_deref(),
                &budget,
                &settings,
                cli.format,
            )?;
        }
    }

    Ok(())
}
