//! Typed views over the INI configuration.

use crate::domain::error::ReconError;
use crate::domain::extractor::DEFAULT_MIN_NON_EMPTY;
use crate::domain::header_locator::{DEFAULT_HEADER_THRESHOLD, HeaderPolicy};
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const DEFAULT_GRID_DELIMITER: u8 = b',';
pub const DEFAULT_SEGMENT_DELIMITER: u8 = b';';
pub const DEFAULT_POOL_SIZE: u32 = 4;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> ReconError {
    ReconError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

/// Reads a single-byte delimiter. `\t` and `tab` mean a tab; `semicolon`
/// spells `;`, which the INI reader treats as a comment marker.
pub fn read_delimiter(
    config: &dyn ConfigPort,
    section: &str,
    default: u8,
) -> Result<u8, ReconError> {
    let Some(raw) = config.get_string(section, "delimiter") else {
        return Ok(default);
    };
    let value = match raw.trim() {
        "" => return Ok(default),
        "\\t" | "tab" => "\t",
        "semicolon" => ";",
        other => other,
    };
    match value.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(invalid(
            section,
            "delimiter",
            "delimiter must be a single ASCII character",
        )),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractSettings {
    pub policy: HeaderPolicy,
    pub threshold: usize,
    pub min_non_empty: usize,
    pub delimiter: u8,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            policy: HeaderPolicy::Flexible,
            threshold: DEFAULT_HEADER_THRESHOLD,
            min_non_empty: DEFAULT_MIN_NON_EMPTY,
            delimiter: DEFAULT_GRID_DELIMITER,
        }
    }
}

impl ExtractSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ReconError> {
        let policy = match config.get_string("extract", "header_mode") {
            Some(mode) => mode
                .parse::<HeaderPolicy>()
                .map_err(|reason| invalid("extract", "header_mode", reason))?,
            None => HeaderPolicy::Flexible,
        };

        let threshold = config.get_int("extract", "header_threshold", DEFAULT_HEADER_THRESHOLD as i64);
        if threshold < 1 {
            return Err(invalid(
                "extract",
                "header_threshold",
                "header_threshold must be at least 1",
            ));
        }

        let min_non_empty = config.get_int("extract", "min_non_empty", DEFAULT_MIN_NON_EMPTY as i64);
        if min_non_empty < 1 {
            return Err(invalid(
                "extract",
                "min_non_empty",
                "min_non_empty must be at least 1",
            ));
        }

        Ok(Self {
            policy,
            threshold: threshold as usize,
            min_non_empty: min_non_empty as usize,
            delimiter: read_delimiter(config, "extract", DEFAULT_GRID_DELIMITER)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Database file for the sqlite backend.
    pub path: Option<PathBuf>,
    pub connection_string: Option<String>,
    pub pool_size: u32,
}

impl StoreSettings {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, ReconError> {
        let backend = match config
            .get_string("store", "backend")
            .map(|b| b.trim().to_lowercase())
            .as_deref()
        {
            None | Some("sqlite") => StoreBackend::Sqlite,
            Some("postgres") | Some("postgresql") => StoreBackend::Postgres,
            Some(other) => {
                return Err(invalid(
                    "store",
                    "backend",
                    format!("unknown backend '{other}'"),
                ));
            }
        };

        let pool_size = config.get_int("store", "pool_size", DEFAULT_POOL_SIZE as i64);
        if pool_size < 1 || pool_size > u32::MAX as i64 {
            return Err(invalid("store", "pool_size", "pool_size must be positive"));
        }

        let path = config
            .get_string("store", "path")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        let connection_string = config
            .get_string("postgres", "connection_string")
            .filter(|c| !c.trim().is_empty());

        match backend {
            StoreBackend::Sqlite if path.is_none() => {
                return Err(ReconError::ConfigMissing {
                    section: "store".to_string(),
                    key: "path".to_string(),
                });
            }
            StoreBackend::Postgres if connection_string.is_none() => {
                return Err(ReconError::ConfigMissing {
                    section: "postgres".to_string(),
                    key: "connection_string".to_string(),
                });
            }
            _ => {}
        }

        Ok(Self {
            backend,
            path,
            connection_string,
            pool_size: pool_size as u32,
        })
    }
}

/// Output directory for CSV artifacts; `[output] dir`, default `.`.
pub fn output_dir(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("output", "dir")
        .filter(|d| !d.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `[log] level`, default `info`.
pub fn log_level(config: &dyn ConfigPort) -> String {
    config
        .get_string("log", "level")
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| "info".to_string())
}
