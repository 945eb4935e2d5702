//! Global configuration types for Pollbot.
//!
//! `GlobalConfig` represents the top-level `config.toml`: where the poll
//! store lives and which identities have admin rights.

use serde::{Deserialize, Serialize};

/// Top-level configuration for the plugin.
///
/// Loaded once at startup from `~/.pollbot/config.toml`. All fields have
/// sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// SQLite connection URL. `None` means `{data_dir}/pollbot.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Identities allowed to open, close and delete any poll and to remove
    /// other users' votes.
    #[serde(default)]
    pub admins: Vec<String>,

    /// Width of the tally bar in `info` reports, in cells.
    #[serde(default = "default_bar_width")]
    pub bar_width: usize,
}

fn default_bar_width() -> usize {
    10
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            admins: Vec::new(),
            bar_width: default_bar_width(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_default_values() {
        let config = GlobalConfig::default();
        assert!(config.database_url.is_none());
        assert!(config.admins.is_empty());
        assert_eq!(config.bar_width, 10);
    }

    #[test]
    fn test_global_config_deserialize_with_defaults() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config, GlobalConfig::default());
    }

    #[test]
    fn test_global_config_deserialize_with_values() {
        let toml_str = r#"
database_url = "sqlite:///var/lib/pollbot/polls.db"
admins = ["Totoro", "fingercomp"]
bar_width = 20
"#;
        let config: GlobalConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.database_url.as_deref(),
            Some("sqlite:///var/lib/pollbot/polls.db")
        );
        assert_eq!(config.admins, vec!["Totoro", "fingercomp"]);
        assert_eq!(config.bar_width, 20);
    }
}
