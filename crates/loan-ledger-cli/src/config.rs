use std::fs;
use std::path::Path;

use loan_ledger_core::ledger::LedgerConfig;
use tracing::debug;

/// Load ledger settings from a YAML file, or defaults when none is given.
pub fn load(path: Option<&Path>) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(LedgerConfig::default());
    };
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config '{}': {}", path.display(), e))?;
    let config: LedgerConfig = serde_yaml::from_str(&contents)
        .map_err(|e| format!("Failed to parse config '{}': {}", path.display(), e))?;
    debug!(path = %path.display(), ?config, "loaded ledger config");
    Ok(config)
}
