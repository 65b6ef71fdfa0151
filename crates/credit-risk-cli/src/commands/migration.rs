use clap::Args;
use serde_json::Value;

use credit_risk_core::migration::{generate_rating_migration_matrix, MigrationInput};
use credit_risk_core::Exposure;

use crate::commands::engine_config;
use crate::input;

/// Arguments for rating migration matrix generation
#[derive(Args)]
pub struct MigrationArgs {
    /// Path to a JSON portfolio file: an array of exposures, or an object
    /// with "portfolio" and "period_months" fields
    #[arg(long)]
    pub input: Option<String>,

    /// Migration period in months
    #[arg(long, default_value = "12")]
    pub period_months: u32,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_migration(args: MigrationArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;

    let data: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err(
            "--input file is required for migration analysis (or pipe JSON on stdin)".into(),
        );
    };

    let migration_input: MigrationInput = if data.is_array() {
        let portfolio: Vec<Exposure> = serde_json::from_value(data)?;
        MigrationInput {
            portfolio,
            period_months: args.period_months,
        }
    } else {
        serde_json::from_value(data)?
    };

    let output = generate_rating_migration_matrix(&migration_input, &config)?;
    Ok(serde_json::to_value(output)?)
}
