pub mod metrics;
pub mod migration;
pub mod stress;

use credit_risk_core::EngineConfig;

use crate::input;

/// Load the engine calibration, either from a JSON file or the standard
/// defaults.
pub fn engine_config(path: &Option<String>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(input::file::read_json(p)?),
        None => Ok(EngineConfig::default()),
    }
}
