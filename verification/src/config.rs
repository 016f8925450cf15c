//! Engine configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use bgv_protocol::ProviderConfig;
use bgv_types::EngineParams;
use bgv_utils::LogFormat;

use crate::EngineError;

/// Configuration for a verification engine host.
///
/// Can be loaded from a TOML file via [`EngineConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default, so an
/// empty file is a valid configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the LMDB attempt log.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log output format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Default log filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Provider endpoints, timeouts and credentials.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retry budget, backoff and bulk pacing.
    #[serde(default)]
    pub engine: EngineParams,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./bgv-data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
        toml::from_str(s).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            provider: ProviderConfig::default(),
            engine: EngineParams::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = EngineConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = EngineConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.engine.max_attempts, 5);
        assert_eq!(config.engine.retry_backoff_secs, 300);
        assert_eq!(config.engine.pacing_millis, 1_000);
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.provider.request_timeout_secs, 30);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"

            [provider]
            employment_base_url = "https://verify.example.com"
            api_key = "k"

            [engine]
            max_attempts = 3
        "#;
        let config = EngineConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.provider.employment_base_url, "https://verify.example.com");
        assert_eq!(config.provider.api_key.as_deref(), Some("k"));
        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.engine.retry_backoff_secs, 300); // default
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = EngineConfig::from_toml_file("/nonexistent/bgv.toml");
        assert!(matches!(result, Err(EngineError::Config(_))));
    }
}
