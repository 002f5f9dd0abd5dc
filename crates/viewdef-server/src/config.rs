//! Configuration for the viewdef server
//!
//! Loads configuration from:
//! 1. config.yaml - listen address, logging, and the source table catalog
//! 2. .env file - local environment overrides
//!
//! Environment variables always override config.yaml values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use viewdef_model::{SourceTable, StaticCatalog};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for {name}: {value}")]
    InvalidEnvVar { name: String, value: String },
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Source tables the server can build views over
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub tables: Vec<SourceTable>,
}

impl CatalogConfig {
    pub fn to_catalog(&self) -> StaticCatalog {
        self.tables.iter().cloned().collect()
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("VIEWDEF_SERVER_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("VIEWDEF_SERVER_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: "VIEWDEF_SERVER_PORT".to_string(),
                value: port.clone(),
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            self.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            self.logging.directory = dir;
        }

        Ok(())
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewdef_model::TableCatalog;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.address(), "127.0.0.1:8080");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
        assert!(config.catalog.tables.is_empty());
    }

    #[test]
    fn test_catalog_section() {
        let config_yaml = r#"
catalog:
  tables:
    - name: "hr.public.employees"
      columns: ["emp_id", "name"]
      primaryKey: "emp_id"
      connection: "hrDS"
    - name: "hr.public.departments"
      columns: ["dept_id"]
"#;
        let config: Config = serde_yaml::from_str(config_yaml).unwrap();
        assert_eq!(config.server.port, 8080);

        let catalog = config.catalog.to_catalog();
        assert_eq!(catalog.len(), 2);

        let employees = catalog.get_table("hr.public.employees").unwrap();
        assert_eq!(employees.primary_key.as_deref(), Some("emp_id"));
        assert_eq!(employees.connection.as_deref(), Some("hrDS"));
        assert_eq!(employees.columns, vec!["emp_id", "name"]);
    }

    #[test]
    fn test_partial_sections_use_defaults() {
        let config_yaml = r#"
server:
  port: 9000
logging:
  level: "debug"
"#;
        let config: Config = serde_yaml::from_str(config_yaml).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "stdout");
        assert_eq!(config.logging.directory, "./logs");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("VIEWDEF_SERVER_PORT", "9090");
        std::env::set_var("VIEWDEF_SERVER_HOST", "0.0.0.0");

        let config_yaml = r#"
server:
  host: "127.0.0.1"
  port: 8080
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;
        let temp_file = std::env::temp_dir().join("viewdef_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = Config::load(&temp_file).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "0.0.0.0");

        std::env::set_var("VIEWDEF_SERVER_PORT", "not-a-port");
        assert!(matches!(
            Config::load(&temp_file),
            Err(ConfigError::InvalidEnvVar { .. })
        ));

        std::env::remove_var("VIEWDEF_SERVER_PORT");
        std::env::remove_var("VIEWDEF_SERVER_HOST");
        std::fs::remove_file(&temp_file).ok();

        // Missing file: defaults, no error
        let config = Config::load_or_default(&temp_file).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert!(config.catalog.tables.is_empty());
        assert!(matches!(Config::load(&temp_file), Err(ConfigError::Io(_))));
    }
}
