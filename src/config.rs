// file: src/config.rs
// description: layered application configuration and the persisted settings store
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::models::summary::{DetailLevel, SummaryOptions};
use crate::summarizer::retry::RetryPolicy;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";
pub const ENV_PREFIX: &str = "CODE_SUMMARIZE";
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";
pub const PORT_ENV: &str = "PORT";
pub const DEFAULT_PORT: u16 = 24312;

const MIN_API_KEY_LENGTH: usize = 10;
const MAX_RETRIES_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub port: u16,
    pub summary: SummaryOptions,
    pub pipeline: PipelineConfig,
    pub retry: RetryPolicy,
    pub model: ModelConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch_size: usize,
    pub max_file_size_bytes: u64,
    pub batch_pause_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
    pub max_prompt_tokens: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub rate_limit_per_minute: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            port: DEFAULT_PORT,
            summary: SummaryOptions::default(),
            pipeline: PipelineConfig::default(),
            retry: RetryPolicy::default(),
            model: ModelConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            max_file_size_bytes: 200 * 1024,
            batch_pause_ms: 1000,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-2.0-flash".to_string(),
            request_timeout_secs: 60,
            max_prompt_tokens: 30_000,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            rate_limit_per_minute: 60,
        }
    }
}

impl Config {
    /// Load from `path` (or `config.json`), the process environment and `.env`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_env(path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)), &env)
    }

    /// Resolve every layer once: defaults, then the file at `path` when it
    /// exists, then `CODE_SUMMARIZE__*` variables, then `GOOGLE_API_KEY` and
    /// `PORT`.
    pub fn load_with_env(path: &Path, env: &HashMap<String, String>) -> Result<Self> {
        let mut builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .source(Some(env.clone())),
            );

        if let Some(api_key) = env_api_key(env) {
            builder = builder
                .set_override("api_key", api_key)
                .map_err(|e| PipelineError::Config(e.to_string()))?;
        }

        if let Some(port) = env.get(PORT_ENV).filter(|v| !v.trim().is_empty()) {
            let port: u16 = port.trim().parse().map_err(|_| {
                PipelineError::Config(format!("{} must be a port number, got {:?}", PORT_ENV, port))
            })?;
            builder = builder
                .set_override("port", i64::from(port))
                .map_err(|e| PipelineError::Config(e.to_string()))?;
        }

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if config.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            config.api_key = None;
        }

        config.validate()?;
        debug!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(api_key) = &self.api_key
            && api_key.trim().len() < MIN_API_KEY_LENGTH
        {
            return Err(PipelineError::Config(
                "API key appears to be too short".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(PipelineError::Config(
                "port must be greater than 0".to_string(),
            ));
        }

        self.summary
            .validate()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        if self.pipeline.batch_size == 0 {
            return Err(PipelineError::Config(
                "batch_size must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.max_file_size_bytes == 0 {
            return Err(PipelineError::Config(
                "max_file_size_bytes must be greater than 0".to_string(),
            ));
        }

        if self.retry.max_retries > MAX_RETRIES_LIMIT {
            return Err(PipelineError::Config(format!(
                "max_retries must be at most {}",
                MAX_RETRIES_LIMIT
            )));
        }

        if self.retry.backoff_factor < 1.0 {
            return Err(PipelineError::Config(
                "backoff_factor must be at least 1".to_string(),
            ));
        }

        if !(self.retry.jitter_min > 0.0 && self.retry.jitter_min <= self.retry.jitter_max) {
            return Err(PipelineError::Config(
                "jitter range must satisfy 0 < jitter_min <= jitter_max".to_string(),
            ));
        }

        if self.model.base_url.trim().is_empty() || self.model.model.trim().is_empty() {
            return Err(PipelineError::Config(
                "model base_url and model must be set".to_string(),
            ));
        }

        if self.model.request_timeout_secs == 0 {
            return Err(PipelineError::Config(
                "request_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.server.rate_limit_per_minute == 0 {
            return Err(PipelineError::Config(
                "rate_limit_per_minute must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Apply one-off overrides (command-line flags) and re-check the result
    /// with the same rules as a loaded file.
    pub fn apply_overrides(&mut self, overrides: &ConfigUpdate) -> Result<()> {
        overrides.apply(self);
        self.validate()
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Config(format!(
                "API key not configured. Set {} or configure api_key",
                API_KEY_ENV
            ))
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn masked_api_key(&self) -> &'static str {
        if self.has_api_key() { "***" } else { "Not set" }
    }
}

fn env_api_key(env: &HashMap<String, String>) -> Option<&str> {
    env.get(API_KEY_ENV)
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
}

/// A partial change to the persisted settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
pub struct ConfigUpdate {
    /// Google API key for Gemini
    pub api_key: Option<String>,
    /// Server port
    pub port: Option<u16>,
    /// Default summary detail level
    pub detail_level: Option<DetailLevel>,
    /// Default maximum summary length in characters
    pub max_length: Option<u32>,
    /// Files summarized concurrently per batch
    pub batch_size: Option<usize>,
}

impl ConfigUpdate {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Parse a single `key value` pair as given on the command line.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self> {
        let invalid =
            |what: &str| PipelineError::Validation(format!("Invalid {} value: {:?}", what, value));

        let mut update = Self::default();
        match key {
            "api_key" => update.api_key = Some(value.to_string()),
            "port" => update.port = Some(value.parse().map_err(|_| invalid("port"))?),
            "detail_level" => {
                update.detail_level = Some(
                    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
                        .map_err(|_| invalid("detail_level"))?,
                )
            }
            "max_length" => {
                update.max_length = Some(value.parse().map_err(|_| invalid("max_length"))?)
            }
            "batch_size" => {
                update.batch_size = Some(value.parse().map_err(|_| invalid("batch_size"))?)
            }
            other => {
                return Err(PipelineError::Validation(format!(
                    "Unknown configuration key: {} (expected one of api_key, port, detail_level, max_length, batch_size)",
                    other
                )));
            }
        }
        Ok(update)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.trim().to_string());
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(detail_level) = self.detail_level {
            config.summary.detail_level = detail_level;
        }
        if let Some(max_length) = self.max_length {
            config.summary.max_length = max_length;
        }
        if let Some(batch_size) = self.batch_size {
            config.pipeline.batch_size = batch_size;
        }
    }

    /// Names of the fields this update sets.
    pub fn changed_keys(&self) -> Vec<&'static str> {
        let mut keys = Vec::new();
        if self.api_key.is_some() {
            keys.push("api_key");
        }
        if self.port.is_some() {
            keys.push("port");
        }
        if self.detail_level.is_some() {
            keys.push("detail_level");
        }
        if self.max_length.is_some() {
            keys.push("max_length");
        }
        if self.batch_size.is_some() {
            keys.push("batch_size");
        }
        keys
    }
}

/// Settings persisted as pretty JSON at `path`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    env: HashMap<String, String>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Self {
        dotenv().ok();
        Self::with_env(path, std::env::vars().collect())
    }

    pub fn with_env(path: PathBuf, env: HashMap<String, String>) -> Self {
        Self { path, env }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        Config::load_with_env(&self.path, &self.env)
    }

    /// Validate and persist `update` on top of the current settings. An API
    /// key supplied by the environment is never written to disk.
    pub async fn update(&self, update: &ConfigUpdate) -> Result<Config> {
        let mut config = self.load()?;
        update.apply(&mut config);
        config.validate()?;

        let mut persisted = config.clone();
        if env_api_key(&self.env).is_some() {
            persisted.api_key = None;
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| PipelineError::FileOperation {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let contents = serde_json::to_string_pretty(&persisted).map_err(|e| {
            PipelineError::Serialization(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&self.path, contents)
            .await
            .map_err(|source| PipelineError::FileOperation {
                path: self.path.clone(),
                source,
            })?;

        info!(
            "Updated configuration ({}) in {}",
            update.changed_keys().join(", "),
            self.path.display()
        );
        Ok(config)
    }

    /// Delete the persisted file and return the settings that remain.
    pub async fn reset(&self) -> Result<Config> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            fs::remove_file(&self.path)
                .await
                .map_err(|source| PipelineError::FileOperation {
                    path: self.path.clone(),
                    source,
                })?;
            info!("Removed {}", self.path.display());
        }
        self.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let temp = TempDir::new().unwrap();
        let config = Config::load_with_env(&temp.path().join("config.json"), &env(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.port, 24312);
        assert_eq!(config.pipeline.batch_size, 5);
        assert_eq!(config.pipeline.max_file_size_bytes, 204_800);
        assert_eq!(config.retry.max_retries, 3);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_file_then_env_precedence() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "api_key": "file-key-0123456789",
                "port": 9000,
                "summary": {"detail_level": "high", "max_length": 800},
                "pipeline": {"batch_size": 3}
            }"#,
        )
        .unwrap();

        let from_file = Config::load_with_env(&path, &env(&[])).unwrap();
        assert_eq!(from_file.api_key.as_deref(), Some("file-key-0123456789"));
        assert_eq!(from_file.port, 9000);
        assert_eq!(from_file.summary.detail_level, DetailLevel::High);
        assert_eq!(from_file.summary.max_length, 800);
        assert_eq!(from_file.pipeline.batch_size, 3);
        assert_eq!(from_file.pipeline.batch_pause_ms, 1000);

        let layered = Config::load_with_env(
            &path,
            &env(&[
                ("GOOGLE_API_KEY", "env-key-0123456789"),
                ("PORT", "7000"),
                ("CODE_SUMMARIZE__PIPELINE__BATCH_SIZE", "8"),
            ]),
        )
        .unwrap();
        assert_eq!(layered.api_key.as_deref(), Some("env-key-0123456789"));
        assert_eq!(layered.port, 7000);
        assert_eq!(layered.pipeline.batch_size, 8);
        assert_eq!(layered.summary.max_length, 800);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        assert!(Config::load_with_env(&path, &env(&[("GOOGLE_API_KEY", "short")])).is_err());
        assert!(Config::load_with_env(&path, &env(&[("PORT", "not-a-port")])).is_err());
        assert!(Config::load_with_env(&path, &env(&[("PORT", "0")])).is_err());

        std::fs::write(&path, r#"{"summary": {"max_length": 5000}}"#).unwrap();
        assert!(Config::load_with_env(&path, &env(&[])).is_err());

        std::fs::write(&path, r#"{"pipeline": {"batch_size": 0}}"#).unwrap();
        assert!(Config::load_with_env(&path, &env(&[])).is_err());

        std::fs::write(&path, r#"{"retry": {"max_retries": 11}}"#).unwrap();
        assert!(Config::load_with_env(&path, &env(&[])).is_err());

        std::fs::write(&path, r#"{"retry": {"backoff_factor": 0.5}}"#).unwrap();
        assert!(Config::load_with_env(&path, &env(&[])).is_err());
    }

    #[test]
    fn test_update_from_key_value() {
        assert_eq!(
            ConfigUpdate::from_key_value("detail_level", "HIGH").unwrap().detail_level,
            Some(DetailLevel::High)
        );
        assert_eq!(
            ConfigUpdate::from_key_value("port", "8080").unwrap().port,
            Some(8080)
        );
        assert!(ConfigUpdate::from_key_value("port", "eighty").is_err());
        assert!(ConfigUpdate::from_key_value("colour", "blue").is_err());
        assert!(ConfigUpdate::default().is_empty());
    }

    #[tokio::test]
    async fn test_store_update_and_reset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings").join("config.json");
        let store = ConfigStore::with_env(path.clone(), env(&[]));

        let update = ConfigUpdate {
            api_key: Some("stored-key-0123456789".to_string()),
            max_length: Some(250),
            ..ConfigUpdate::default()
        };
        let updated = store.update(&update).await.unwrap();
        assert_eq!(updated.summary.max_length, 250);
        assert!(path.exists());

        let reloaded = store.load().unwrap();
        assert_eq!(reloaded, updated);

        let reset = store.reset().await.unwrap();
        assert!(!path.exists());
        assert_eq!(reset, Config::default());
    }

    #[tokio::test]
    async fn test_store_never_persists_env_api_key() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let store = ConfigStore::with_env(
            path.clone(),
            env(&[("GOOGLE_API_KEY", "env-key-0123456789")]),
        );

        let update = ConfigUpdate {
            port: Some(9100),
            ..ConfigUpdate::default()
        };
        let updated = store.update(&update).await.unwrap();
        assert_eq!(updated.api_key.as_deref(), Some("env-key-0123456789"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("env-key-0123456789"));
        assert_eq!(store.load().unwrap().port, 9100);
    }

    #[tokio::test]
    async fn test_store_rejects_invalid_update() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        let store = ConfigStore::with_env(path.clone(), env(&[]));

        let update = ConfigUpdate {
            max_length: Some(0),
            ..ConfigUpdate::default()
        };
        assert!(store.update(&update).await.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_require_api_key() {
        let mut config = Config::default();
        assert!(config.require_api_key().is_err());
        assert_eq!(config.masked_api_key(), "Not set");

        config.api_key = Some("abcdefghijkl".to_string());
        assert_eq!(config.require_api_key().unwrap(), "abcdefghijkl");
        assert_eq!(config.masked_api_key(), "***");
    }

    #[test]
    fn test_overrides_are_validated() {
        let mut config = Config::default();
        let zero_batch = ConfigUpdate {
            batch_size: Some(0),
            ..ConfigUpdate::default()
        };
        assert!(matches!(
            config.apply_overrides(&zero_batch),
            Err(PipelineError::Config(_))
        ));

        let mut config = Config::default();
        let overrides = ConfigUpdate {
            batch_size: Some(8),
            detail_level: Some(DetailLevel::High),
            max_length: Some(300),
            ..ConfigUpdate::default()
        };
        config.apply_overrides(&overrides).unwrap();
        assert_eq!(config.pipeline.batch_size, 8);
        assert_eq!(config.summary.detail_level, DetailLevel::High);
        assert_eq!(config.summary.max_length, 300);
    }
}
