use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Applies command-line overrides to a loaded configuration
///
/// The result is validated again, so overridden values face the same bounds
/// as values read from the file.
pub fn apply_overrides(
    mut config: Config,
    concurrency: Option<usize>,
    extra_urls: Vec<String>,
) -> Result<Config, ConfigError> {
    if let Some(concurrency) = concurrency {
        config.scraper.concurrency = concurrency;
    }
    config.urls.extend(extra_urls);

    validate(&config)?;
    Ok(config)
}
