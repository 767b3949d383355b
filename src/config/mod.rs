mod schema;

pub use schema::{
    Config, PathsConfig, DEFAULT_MATCH_PREFIX, DEFAULT_PREDICTIONS_PATH, DEFAULT_REPORT_PATH,
    DEFAULT_RESULTS_PATH,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::scoring::validate_scoring;

/// Get the config directory path (<config dir>/tipsheet/)
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tipsheet"))
}

/// Get the default config file path (<config dir>/tipsheet/config.yaml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.yaml"))
}

/// Load configuration from a YAML file
///
/// # Arguments
///
/// * `path` - Optional path to config file. If None, the default path is
///   tried and built-in defaults are used when it does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed or has unknown keys
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found at {}", path.display());
            }
            path
        }
        None => match get_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                log::debug!("No config file found; using defaults");
                return Ok(Config::default());
            }
        },
    };

    let config_content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse config: invalid YAML in {}",
            config_path.display()
        )
    })?;

    log::debug!("Loaded config from {}", config_path.display());
    Ok(config)
}

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let prefix = config.match_prefix();
    if prefix.trim().is_empty() {
        errors.push("match_prefix: must not be empty".to_string());
    } else if prefix.ends_with(|c: char| c.is_ascii_digit()) {
        errors.push(format!("match_prefix: '{}' must not end with a digit", prefix));
    }

    let sheet = config.sheet();
    if sheet.is_empty() || sheet.chars().count() > 31 {
        errors.push(format!("sheet: '{}' must be 1 to 31 characters", sheet));
    } else if sheet.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        errors.push(format!("sheet: '{}' contains a character Excel rejects", sheet));
    }

    for (alias, canonical) in &config.aliases {
        if alias.trim().is_empty() || canonical.trim().is_empty() {
            errors.push(format!("aliases: '{}' -> '{}' has an empty side", alias, canonical));
        }
    }

    if let Err(scoring_errors) = validate_scoring(&config.scoring.clone().unwrap_or_default()) {
        errors.extend(scoring_errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
