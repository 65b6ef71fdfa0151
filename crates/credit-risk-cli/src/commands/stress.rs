use clap::Args;
use serde_json::Value;

use credit_risk_core::stress::{run_stress_test, StressTestInput};
use credit_risk_core::{Exposure, Scenario};

use crate::commands::engine_config;
use crate::input;

/// Arguments for portfolio stress testing
#[derive(Args)]
pub struct StressArgs {
    /// Path to a JSON portfolio file: an array of exposures, or an object
    /// with "portfolio" and "scenarios" fields
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated scenarios to run (baseline, adverse, severe)
    #[arg(long, default_value = "baseline,adverse,severe")]
    pub scenarios: String,

    /// Path to a JSON calibration file
    #[arg(long)]
    pub config: Option<String>,
}

pub fn run_stress(args: StressArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = engine_config(&args.config)?;

    let data: Value = if let Some(ref path) = args.input {
        input::file::read_json_value(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input file is required for stress testing (or pipe JSON on stdin)".into());
    };

    let stress_input = parse_stress_input(data, &args.scenarios)?;
    let output = run_stress_test(&stress_input, &config)?;
    Ok(serde_json::to_value(output)?)
}

/// Accept either a bare portfolio array (scenarios come from the flag) or
/// a complete stress-test request object.
fn parse_stress_input(
    data: Value,
    scenarios_flag: &str,
) -> Result<StressTestInput, Box<dyn std::error::Error>> {
    if data.is_array() {
        let portfolio: Vec<Exposure> = serde_json::from_value(data)?;
        let scenarios = parse_scenarios(scenarios_flag)?;
        Ok(StressTestInput { portfolio, scenarios })
    } else {
        Ok(serde_json::from_value(data)?)
    }
}

fn parse_scenarios(flag: &str) -> Result<Vec<Scenario>, Box<dyn std::error::Error>> {
    flag.split(',')
        .map(|s| s.trim().parse::<Scenario>().map_err(Into::into))
        .collect()
}
