//! Validator configuration loader.
//!
//! Reads `curator.toml` from the data directory (`~/.curator/` in
//! production) into a [`ValidatorConfig`]. Falls back to defaults when the
//! file is missing or malformed, and always returns sanitized thresholds.

use std::path::Path;

use curator_types::config::ValidatorConfig;

/// File name looked up inside the data directory.
pub const CONFIG_FILE: &str = "curator.toml";

/// Load validator configuration from `{data_dir}/curator.toml`.
///
/// - Missing file: [`ValidatorConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
/// - Otherwise the parsed config, with out-of-range values corrected.
pub async fn load_validator_config(data_dir: &Path) -> ValidatorConfig {
    let config_path = data_dir.join(CONFIG_FILE);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No {CONFIG_FILE} found at {}, using defaults", config_path.display());
            return ValidatorConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ValidatorConfig::default();
        }
    };

    match toml::from_str::<ValidatorConfig>(&content) {
        Ok(config) => {
            let sanitized = config.clone().sanitized();
            if sanitized != config {
                tracing::warn!(
                    "Adjusted out-of-range values in {}",
                    config_path.display()
                );
            }
            sanitized
        }
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ValidatorConfig::default()
        }
    }
}
