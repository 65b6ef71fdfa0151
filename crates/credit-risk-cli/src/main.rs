mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::metrics::{AssessArgs, EadArgs, EclArgs, LgdArgs, PdArgs};
use commands::migration::MigrationArgs;
use commands::stress::StressArgs;

/// Regulatory credit-risk calculations
#[derive(Parser)]
#[command(
    name = "crisk",
    version,
    about = "Regulatory credit-risk calculations with decimal precision",
    long_about = "A CLI for regulatory credit-risk calculations with decimal precision. \
                  Supports PD term structures, collateral-adjusted LGD, EAD with credit \
                  conversion factors, IFRS 9 ECL staging, portfolio stress testing, and \
                  rating migration matrices."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Probability of default for a rating over a horizon
    Pd(PdArgs),
    /// Loss given default after collateral protection
    Lgd(LgdArgs),
    /// Exposure at default from drawn and undrawn amounts
    Ead(EadArgs),
    /// IFRS 9 expected credit loss and staging
    Ecl(EclArgs),
    /// Full PD/LGD/EAD/ECL assessment of a single exposure
    Assess(AssessArgs),
    /// Run a multi-scenario stress test over a portfolio
    StressTest(StressArgs),
    /// Generate a rating migration matrix for a portfolio
    Migration(MigrationArgs),
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

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Pd(args) => commands::metrics::run_pd(args),
        Commands::Lgd(args) => commands::metrics::run_lgd(args),
        Commands::Ead(args) => commands::metrics::run_ead(args),
        Commands::Ecl(args) => commands::metrics::run_ecl(args),
        Commands::Assess(args) => commands::metrics::run_assess(args),
        Commands::StressTest(args) => commands::stress::run_stress(args),
        Commands::Migration(args) => commands::migration::run_migration(args),
        Commands::Version => {
            println!("crisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
