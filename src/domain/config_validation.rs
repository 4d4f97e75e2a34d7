//! Configuration validation.
//!
//! Validates every section before any file is read or any table is touched.

use crate::domain::error::ReconError;
use crate::domain::settings::{
    DEFAULT_SEGMENT_DELIMITER, ExtractSettings, StoreSettings, read_delimiter,
};
use crate::ports::config_port::ConfigPort;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Validates extraction, segment and logging settings, and the store
/// settings when `require_store` is set.
pub fn validate_config(config: &dyn ConfigPort, require_store: bool) -> Result<(), ReconError> {
    ExtractSettings::from_config(config)?;
    read_delimiter(config, "segments", DEFAULT_SEGMENT_DELIMITER)?;
    validate_log_level(config)?;
    if require_store {
        StoreSettings::from_config(config)?;
    }
    Ok(())
}

fn validate_log_level(config: &dyn ConfigPort) -> Result<(), ReconError> {
    let Some(level) = config.get_string("log", "level") else {
        return Ok(());
    };
    let level = level.trim().to_lowercase();
    if level.is_empty() || LOG_LEVELS.contains(&level.as_str()) {
        return Ok(());
    }
    Err(ReconError::ConfigInvalid {
        section: "log".to_string(),
        key: "level".to_string(),
        reason: format!("level must be one of {}", LOG_LEVELS.join(", ")),
    })
}
