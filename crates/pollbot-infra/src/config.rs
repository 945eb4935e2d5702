//! Global configuration loader for Pollbot.
//!
//! Reads `config.toml` from the data directory (`~/.pollbot/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use pollbot_types::config::GlobalConfig;

/// Environment variable naming the data directory.
pub const DATA_DIR_ENV: &str = "POLLBOT_DATA_DIR";
/// Environment variable overriding `database_url`.
pub const DATABASE_URL_ENV: &str = "POLLBOT_DATABASE_URL";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `POLLBOT_DATA_DIR` environment variable
/// 2. `~/.pollbot`
/// 3. `.pollbot` in the current directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".pollbot");
    }

    PathBuf::from(".pollbot")
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`GlobalConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and uses the default.
/// - `POLLBOT_DATABASE_URL`, when set, replaces `database_url`.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let mut config = read_config_file(data_dir).await;
    if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
        config.database_url = Some(url);
    }
    config
}

async fn read_config_file(data_dir: &Path) -> GlobalConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            GlobalConfig::default()
        }
    }
}
