//! Configuration loading, validation, and management for Ordbok.
//!
//! Loads configuration from a TOML file with environment variable overrides.
//! Validates all settings at startup. The bot token is never printed: `Debug`
//! output redacts it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Chat transport token (Telegram bot token). Overridden by `TOKEN`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// The single privileged caller identity. Overridden by
    /// `ORDBOK_ADMIN_ID`. Not discoverable or changeable at runtime.
    #[serde(default = "default_admin_id")]
    pub admin_id: String,

    /// Directory holding the three table files. Overridden by
    /// `ORDBOK_DATA_DIR`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_admin_id() -> String {
    "admin".into()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            admin_id: default_admin_id(),
            data_dir: default_data_dir(),
        }
    }
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("admin_id", &self.admin_id)
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    ///
    /// An absent file is not an error — defaults are used (the store creates
    /// its own table files on first run).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            debug!(path = %path.display(), "config file absent, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment variables take precedence over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(token) = std::env::var("TOKEN") {
            if !token.is_empty() {
                self.bot_token = Some(token);
            }
        }
        if let Ok(admin) = std::env::var("ORDBOK_ADMIN_ID") {
            if !admin.is_empty() {
                self.admin_id = admin;
            }
        }
        if let Ok(dir) = std::env::var("ORDBOK_DATA_DIR") {
            if !dir.is_empty() {
                self.data_dir = PathBuf::from(dir);
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.admin_id.trim().is_empty() {
            return Err(ConfigError::Invalid("admin_id must not be empty".into()));
        }
        Ok(())
    }

    /// Serialize back to TOML (used by `ordbok init`).
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("failed to serialize config: {e}")))
    }

    /// Default config file location: `ordbok.toml` in the working directory.
    pub fn default_path() -> PathBuf {
        PathBuf::from("ordbok.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn absent_file_yields_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/ordbok.toml")).unwrap();
        assert_eq!(config.admin_id, "admin");
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.bot_token.is_none());
    }

    #[test]
    fn file_values_are_loaded() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "bot_token = \"secret-token\"\nadmin_id = \"509114893\"\ndata_dir = \"/var/lib/ordbok\""
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.bot_token.as_deref(), Some("secret-token"));
        assert_eq!(config.admin_id, "509114893");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ordbok"));
    }

    #[test]
    fn empty_admin_id_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "admin_id = \"  \"").unwrap();

        let result = AppConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = AppConfig {
            bot_token: Some("very-secret".into()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn toml_round_trip() {
        let config = AppConfig {
            bot_token: Some("tok".into()),
            admin_id: "42".into(),
            data_dir: PathBuf::from("tables"),
        };
        let toml_str = config.to_toml().unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.admin_id, "42");
        assert_eq!(parsed.data_dir, PathBuf::from("tables"));
    }
}
