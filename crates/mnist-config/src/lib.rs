use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable that overrides the settings document location.
pub const CONFIG_PATH_ENV: &str = "MNIST_CONFIG";

/// Settings location used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.json";

/// Registry pointer used when `mlflow.model_uri` is absent.
pub const DEFAULT_MODEL_URI: &str = "models:/mnist-model/latest";

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dataset and storage locations shared with the offline pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub minio: Option<MinioConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinioConfig {
    pub endpoint: String,
    pub bucket: String,
    #[serde(default, skip_serializing)]
    pub access_key: String,
    #[serde(default, skip_serializing)]
    pub secret_key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub postgres: Option<PostgresConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    #[serde(default = "default_postgres_port")]
    pub port: u16,
    pub dbname: String,
    #[serde(default)]
    pub user: String,
    #[serde(default, skip_serializing)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlflowConfig {
    #[serde(alias = "tracking_endpoint")]
    pub tracking_uri: String,
    #[serde(default = "default_model_uri", alias = "model_reference")]
    pub model_uri: String,
    /// File inside the registered model's artifact directory holding the weights.
    #[serde(default = "default_artifact_file")]
    pub artifact_file: String,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    5000
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("data/raw")
}

fn default_processed_dir() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_model_uri() -> String {
    DEFAULT_MODEL_URI.into()
}

fn default_artifact_file() -> String {
    "model.json".into()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings
// ─────────────────────────────────────────────────────────────────────────────

/// The full settings document. All three sections are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub service: ServiceConfig,
    pub data: DataConfig,
    pub mlflow: MlflowConfig,
}

impl Settings {
    /// Loads from [`CONFIG_PATH_ENV`] if set, else [`DEFAULT_CONFIG_PATH`].
    pub fn load() -> Result<Self, ConfigError> {
        let path = resolve_path(env::var(CONFIG_PATH_ENV).ok());
        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = content.parse()?;
        tracing::debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Location of the model registry.
    pub fn tracking_endpoint(&self) -> &str {
        &self.mlflow.tracking_uri
    }

    /// Versioned pointer to the served model.
    pub fn model_reference(&self) -> &str {
        &self.mlflow.model_uri
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.mlflow.fetch_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.service.name.trim().is_empty() {
            return Err(ConfigError::Invalid("service.name must not be empty".into()));
        }
        if self.mlflow.tracking_uri.trim().is_empty() {
            return Err(ConfigError::Invalid("mlflow.tracking_uri must not be empty".into()));
        }
        if self.mlflow.model_uri.trim().is_empty() {
            return Err(ConfigError::Invalid("mlflow.model_uri must not be empty".into()));
        }
        if self.mlflow.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "mlflow.fetch_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl FromStr for Settings {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let settings: Settings = serde_json::from_str(s)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Picks the settings path from an optional override.
pub fn resolve_path(override_path: Option<String>) -> PathBuf {
    override_path
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
