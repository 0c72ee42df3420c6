//! Spider configuration
//!
//! A JSON file supplying the default data source, the reserved column names
//! and the pipeline write mode. Every field is optional.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event};
use crate::pipeline::PipelineMode;
use crate::schema::{ReservedColumns, CREATED_COLUMN, ID_COLUMN};

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "SPIDER_CONFIG_IO",
            ConfigError::Parse(_) => "SPIDER_CONFIG_PARSE",
            ConfigError::Invalid(_) => "SPIDER_CONFIG_INVALID",
        }
    }
}

/// Default storage of a spider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceConfig {
    /// Provider identifier, e.g. `"MySql.Data.MySqlClient"` or `"MongoDB"`.
    /// Empty or unknown selects the no-op pipeline.
    #[serde(default)]
    pub provider_name: String,

    #[serde(default)]
    pub connection_string: String,
}

/// Spider configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpiderConfig {
    #[serde(default)]
    pub data_source: DataSourceConfig,

    /// Identity column, added to every table (default `__id`)
    #[serde(default = "default_identity_column")]
    pub identity_column: String,

    /// Creation timestamp column (default `cdate`)
    #[serde(default = "default_created_column")]
    pub created_column: String,

    /// Further names declared fields may not use
    #[serde(default)]
    pub extra_reserved_columns: Vec<String>,

    #[serde(default)]
    pub pipeline_mode: PipelineMode,
}

fn default_identity_column() -> String {
    ID_COLUMN.to_string()
}

fn default_created_column() -> String {
    CREATED_COLUMN.to_string()
}

impl Default for SpiderConfig {
    fn default() -> Self {
        Self {
            data_source: DataSourceConfig::default(),
            identity_column: default_identity_column(),
            created_column: default_created_column(),
            extra_reserved_columns: Vec::new(),
            pipeline_mode: PipelineMode::default(),
        }
    }
}

impl SpiderConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let config: SpiderConfig = serde_json::from_str(&content)?;
        config.validate()?;

        let display = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", display.as_str()),
                ("provider", config.data_source.provider_name.as_str()),
                ("mode", config.pipeline_mode.as_str()),
            ],
        );
        Ok(config)
    }

    /// Checks the reserved column names
    pub fn validate(&self) -> ConfigResult<()> {
        let identity = self.identity_column.trim();
        let created = self.created_column.trim();

        if identity.is_empty() {
            return Err(ConfigError::Invalid("identity_column must not be empty".into()));
        }
        if created.is_empty() {
            return Err(ConfigError::Invalid("created_column must not be empty".into()));
        }
        if identity.eq_ignore_ascii_case(created) {
            return Err(ConfigError::Invalid(format!(
                "identity_column and created_column must differ, both are '{}'",
                identity
            )));
        }
        if self.extra_reserved_columns.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "extra_reserved_columns must not contain empty names".into(),
            ));
        }
        Ok(())
    }

    /// Reserved column set injected into entity compilation and pipelines
    pub fn reserved_columns(&self) -> ReservedColumns {
        self.extra_reserved_columns.iter().fold(
            ReservedColumns::new(self.identity_column.trim(), self.created_column.trim()),
            |reserved, name| reserved.with_extra(name.trim()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_config(temp_dir: &TempDir, config: serde_json::Value) -> std::path::PathBuf {
        let path = temp_dir.path().join("spider.json");
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    #[test]
    fn test_config_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({}));

        let config = SpiderConfig::load(&path).unwrap();
        assert_eq!(config, SpiderConfig::default());
        assert_eq!(config.identity_column, "__id");
        assert_eq!(config.created_column, "cdate");
        assert_eq!(config.pipeline_mode, PipelineMode::Insert);
        assert!(config.data_source.provider_name.is_empty());
    }

    #[test]
    fn test_config_full() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({
                "data_source": {
                    "provider_name": "MongoDB",
                    "connection_string": "mongodb://localhost:27017/crawl"
                },
                "identity_column": "row_id",
                "created_column": "crawled_at",
                "extra_reserved_columns": ["url"],
                "pipeline_mode": "InsertNewAndUpdateOld"
            }),
        );

        let config = SpiderConfig::load(&path).unwrap();
        assert_eq!(config.data_source.provider_name, "MongoDB");
        assert_eq!(config.pipeline_mode, PipelineMode::InsertNewAndUpdateOld);

        let reserved = config.reserved_columns();
        assert_eq!(reserved.identity(), "row_id");
        assert_eq!(reserved.created(), "crawled_at");
        assert!(reserved.is_reserved("URL"));
        assert!(!reserved.is_reserved("__id"));
    }

    #[test]
    fn test_config_rejects_same_reserved_names() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(
            &temp_dir,
            json!({ "identity_column": "id", "created_column": "ID" }),
        );
        let err = SpiderConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "SPIDER_CONFIG_INVALID");
    }

    #[test]
    fn test_config_rejects_empty_identity() {
        let config = SpiderConfig {
            identity_column: " ".into(),
            ..SpiderConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spider.json");
        fs::write(&path, "{ not json").unwrap();
        let err = SpiderConfig::load(&path).unwrap_err();
        assert_eq!(err.code(), "SPIDER_CONFIG_PARSE");
    }

    #[test]
    fn test_config_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = SpiderConfig::load(&temp_dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_config_unknown_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(&temp_dir, json!({ "pipeline_mode": "Upsert" }));
        assert!(SpiderConfig::load(&path).is_err());
    }
}
