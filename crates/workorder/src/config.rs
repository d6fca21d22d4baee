//! Configuration management for workorder.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "workorder";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "os_files.db";

/// Default directory name for generated documents.
const OUTPUT_DIR_NAME: &str = "pdf";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `WORKORDER_`, sections split by `__`)
/// 2. `OPENAI_API_KEY`, mapped onto `llm.api_key`
/// 3. TOML config file at `~/.config/workorder/config.toml`
/// 4. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration.
    pub server: ServerConfig,
    /// Language-model API configuration.
    pub llm: LlmConfig,
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Cleanup job configuration.
    pub cleanup: CleanupConfig,
    /// Document rendering configuration.
    pub document: DocumentConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind: String,
    /// Maximum accepted request body size. Logo uploads travel inline.
    pub max_body_bytes: usize,
}

/// Language-model API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// Bearer token for the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Upper bound on reply tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the file registry database.
    /// Defaults to `~/.local/share/workorder/os_files.db`
    pub database_path: Option<PathBuf>,
    /// Directory generated documents are written to.
    /// Defaults to `~/.local/share/workorder/pdf`
    pub output_dir: Option<PathBuf>,
}

/// Cleanup job configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Run the periodic cleanup job while serving.
    pub enabled: bool,
    /// Seconds between cleanup passes.
    pub interval_secs: u64,
    /// Age in seconds after which generated files are deleted.
    pub max_age_secs: u64,
}

/// Document rendering configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    /// TrueType font used for all text. The built-in Helvetica is used when unset.
    pub font_path: Option<PathBuf>,
    /// Bold variant of `font_path`. Falls back to `font_path`.
    pub bold_font_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 60,
            max_age_secs: 5 * 60,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(
                Env::raw()
                    .only(&["OPENAI_API_KEY"])
                    .map(|_| "llm.api_key".into()),
            )
            .merge(Env::prefixed("WORKORDER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.server.bind.parse::<SocketAddr>().is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid bind address: {}", self.server.bind),
            });
        }

        if self.llm.max_tokens == 0 {
            return Err(Error::ConfigValidation {
                message: "max_tokens must be greater than 0".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "temperature ({}) must be between 0 and 2",
                    self.llm.temperature
                ),
            });
        }

        if self.cleanup.interval_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "interval_secs must be greater than 0".to_string(),
            });
        }

        if self.cleanup.max_age_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "max_age_secs must be greater than 0".to_string(),
            });
        }

        for path in [&self.document.font_path, &self.document.bold_font_path]
            .into_iter()
            .flatten()
        {
            if !path.exists() {
                return Err(Error::ConfigValidation {
                    message: format!("font file not found: {}", path.display()),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the output directory, resolving defaults if not set.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.storage
            .output_dir
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(OUTPUT_DIR_NAME))
    }

    /// Get the cleanup interval as a Duration.
    #[must_use]
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup.interval_secs)
    }

    /// Get the maximum file age as a Duration.
    #[must_use]
    pub fn max_file_age(&self) -> Duration {
        Duration::from_secs(self.cleanup.max_age_secs)
    }

    /// Get the model request timeout as a Duration.
    #[must_use]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}
