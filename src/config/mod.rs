//! Configuration loading and management

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;

pub const BIND_ENV: &str = "ORDER_DESK_BIND";

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where orders and products are kept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Process-local tables, lost on restart
    #[default]
    Memory,

    /// SQLite database (requires the `sqlite` feature)
    Sqlite { database_url: String },
}

/// Chat-completions endpoint used by `/extract-order`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "LlmConfig::default_endpoint")]
    pub endpoint: String,

    #[serde(default = "LlmConfig::default_model")]
    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "LlmConfig::default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "LlmConfig::default_timeout_ms")]
    pub timeout_ms: u64,
}

impl LlmConfig {
    fn default_endpoint() -> String {
        "https://api.openai.com/v1".to_string()
    }

    fn default_model() -> String {
        "gpt-4o".to_string()
    }

    fn default_api_key_env() -> String {
        "OPENAI_API_KEY".to_string()
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            model: Self::default_model(),
            api_key_env: Self::default_api_key_env(),
            timeout_ms: Self::default_timeout_ms(),
        }
    }
}

/// Complete configuration of the order desk server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP server binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Browser origins allowed by CORS
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Default tracing filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Extraction is disabled when this section is absent
    #[serde(default)]
    pub llm: Option<LlmConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_origins: default_cors_origins(),
            log_level: default_log_level(),
            storage: StorageConfig::default(),
            llm: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        Self::parse(&content, Some(path.display().to_string()))
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::parse(yaml, None)
    }

    fn parse(yaml: &str, file: Option<String>) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file,
            message: e.to_string(),
        })?;
        config.bind_addr()?;
        Ok(config)
    }

    /// Apply environment overrides on top of the loaded values
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(bind) = std::env::var(BIND_ENV) {
            self.bind = bind;
            self.bind_addr()?;
        }
        Ok(self)
    }

    /// Resolve `bind` the way the listener will, host names included
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            field: "bind".to_string(),
            value: self.bind.clone(),
            message,
        };

        self.bind
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("address resolved to nothing".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = AppConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
        assert_eq!(config.cors_origins.len(), 2);
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
bind: "0.0.0.0:9000"
cors_origins:
  - "https://shop.example.com"
log_level: debug
storage:
  backend: sqlite
  database_url: "sqlite://orders.db"
llm:
  model: gpt-4o-mini
  timeout_ms: 5000
"#;
        let config = AppConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.bind, "0.0.0.0:9000");
        assert_eq!(config.cors_origins, vec!["https://shop.example.com"]);
        assert_eq!(
            config.storage,
            StorageConfig::Sqlite {
                database_url: "sqlite://orders.db".to_string()
            }
        );

        let llm = config.llm.unwrap();
        assert_eq!(llm.model, "gpt-4o-mini");
        assert_eq!(llm.timeout_ms, 5000);
        assert_eq!(llm.endpoint, "https://api.openai.com/v1");
        assert_eq!(llm.api_key_env, "OPENAI_API_KEY");
    }

    #[test]
    fn test_host_name_bind_is_accepted() {
        let config = AppConfig::from_yaml_str("bind: \"localhost:8000\"").unwrap();
        assert_eq!(config.bind, "localhost:8000");
        assert_eq!(config.bind_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_invalid_bind_is_rejected() {
        let err = AppConfig::from_yaml_str("bind: not-an-address").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "bind"));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = AppConfig::from_yaml_str("bind: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { file: None, .. }));
    }

    #[test]
    fn test_from_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "log_level: warn").unwrap();

        let config = AppConfig::from_yaml_file(file.path()).unwrap();
        assert_eq!(config.log_level, "warn");

        let err = AppConfig::from_yaml_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }

    #[test]
    fn test_api_key_from_unset_variable() {
        let llm = LlmConfig {
            api_key_env: "ORDER_DESK_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(llm.api_key().is_none());
    }
}
