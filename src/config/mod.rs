use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use config::{Config, ConfigError, Environment, File};

use crate::hub::PretrainedOptions;
use crate::hub::types::{DEFAULT_ENDPOINT, DEFAULT_REVISION, DEFAULT_TIMEOUT};

/// Where pretrained tokenizers are fetched from and cached
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    /// Base URL of the file server
    pub endpoint: String,
    /// Branch, tag or commit to resolve files against
    pub revision: String,
    /// Persistent cache root; files go to a temporary directory when unset
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Bearer token for gated or private repositories
    #[serde(default)]
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TokenizerConfig {
    /// Re-tokenize text that matches a special token
    pub encode_special_tokens: bool,
}

/// Configuration for application logging
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Optional log directory
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Main settings struct that contains all configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub hub: HubConfig,
    pub tokenizer: TokenizerConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads settings relative to `./config`.
    ///
    /// Sources in order of precedence (highest first):
    /// 1. Environment variables prefixed with `TOKENBRIDGE_`, sections split by `__`
    ///    (`TOKENBRIDGE_HUB__CACHE_DIR`)
    /// 2. `config/local.toml` if present
    /// 3. `config/default.toml` if present
    /// 4. Built-in defaults
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::current_dir()
            .map_err(|e| ConfigError::Message(format!("Failed to get current directory: {}", e)))?
            .join("config");
        Self::from_dir(&config_dir)
    }

    /// Loads settings from the TOML files in `config_dir` plus the environment.
    pub fn from_dir(config_dir: &Path) -> Result<Self, ConfigError> {
        let default_config = config_dir.join("default.toml");
        let local_config = config_dir.join("local.toml");

        let settings = Config::builder()
            .set_default("hub.endpoint", DEFAULT_ENDPOINT)?
            .set_default("hub.revision", DEFAULT_REVISION)?
            .set_default("hub.timeout_secs", DEFAULT_TIMEOUT.as_secs())?
            .set_default("tokenizer.encode_special_tokens", false)?
            .set_default("logging.level", "info")?
            .add_source(File::from(default_config).required(false))
            .add_source(File::from(local_config).required(false))
            .add_source(
                Environment::with_prefix("TOKENBRIDGE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.hub.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Message(format!(
                "hub.endpoint must be an http(s) URL, got: {}",
                self.hub.endpoint
            )));
        }

        if self.hub.revision.trim().is_empty() {
            return Err(ConfigError::Message("hub.revision must not be empty".to_string()));
        }

        if self.hub.timeout_secs == 0 {
            return Err(ConfigError::Message(
                "hub.timeout_secs must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => Ok(()),
            _ => Err(ConfigError::Message(format!(
                "Invalid logging level: {}. Must be one of: error, warn, info, debug, trace",
                self.logging.level
            ))),
        }
    }

    /// Pretrained options seeded from the `hub` and `tokenizer` sections
    pub fn pretrained_options(&self) -> PretrainedOptions {
        let mut options = PretrainedOptions::new()
            .with_endpoint(self.hub.endpoint.trim())
            .with_revision(self.hub.revision.trim())
            .with_timeout(Duration::from_secs(self.hub.timeout_secs))
            .with_encode_special_tokens(self.tokenizer.encode_special_tokens);
        if let Some(dir) = &self.hub.cache_dir {
            options = options.with_cache_dir(dir);
        }
        if let Some(token) = &self.hub.auth_token {
            options = options.with_auth_token(token);
        }
        options
    }
}
