mod types;

pub use types::*;

use anyhow::{Context, Result};
use mediaforge_common::paths::is_format_token;
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./mediaforge.toml",
        "~/.config/mediaforge/config.toml",
        "/etc/mediaforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.conversion.max_concurrent == Some(0) {
        anyhow::bail!("conversion.max_concurrent must be at least 1 when set");
    }

    if config.conversion.timeout_secs == Some(0) {
        anyhow::bail!("conversion.timeout_secs must be at least 1 when set");
    }

    for format in &config.conversion.allowed_formats {
        if !is_format_token(format) {
            anyhow::bail!("Invalid target format in allowed_formats: {:?}", format);
        }
    }

    if let Some(ref path) = config.conversion.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    Ok(())
}
