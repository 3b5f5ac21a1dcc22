//! Configuration file loading and validation.

use std::path::Path;

use crate::error::ConfigError;
use crate::types::{EngineEntry, LerwConfig};

/// Conventional configuration file name.
pub const CONFIG_FILE: &str = "lerw.toml";

/// Loads and validates a configuration file.
pub fn load_config(path: &Path) -> Result<LerwConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<LerwConfig, ConfigError> {
    let config: LerwConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Resolves the configuration for a run.
///
/// An explicit path must exist. Otherwise `<dir>/lerw.toml` is used if
/// present, falling back to the built-in defaults.
pub fn discover_config(explicit: Option<&Path>, dir: &Path) -> Result<LerwConfig, ConfigError> {
    if let Some(path) = explicit {
        return load_config(path);
    }
    let candidate = dir.join(CONFIG_FILE);
    if candidate.is_file() {
        load_config(&candidate)
    } else {
        Ok(LerwConfig::default())
    }
}

/// Checks values the type system cannot.
fn validate_config(config: &LerwConfig) -> Result<(), ConfigError> {
    if config.cache.root.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "cache.root must not be empty".to_string(),
        ));
    }
    if config.engine.timeout_secs == Some(0) {
        return Err(ConfigError::ValidationError(
            "engine.timeout_secs must be positive".to_string(),
        ));
    }
    validate_engine("engine.lengths", &config.engine.lengths)?;
    validate_engine("engine.points", &config.engine.points)?;

    let defaults = &config.defaults;
    if defaults.dimension == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.dimension must be positive".to_string(),
        ));
    }
    if !defaults.alpha.is_finite() || defaults.alpha <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "defaults.alpha must be a finite positive number, got {}",
            defaults.alpha
        )));
    }
    if defaults.walks == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.walks must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine(section: &str, entry: &EngineEntry) -> Result<(), ConfigError> {
    if entry.program.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{section}.program must not be empty"
        )));
    }
    Ok(())
}
