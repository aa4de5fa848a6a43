//! Typed launcher configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::defaults::LauncherDefaults;
use super::merge::merge_layers;
use crate::poll::WaitMode;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Effective launcher configuration after merging all layers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    pub scheduler_bin: String,
    pub poll_interval_seconds: u64,
    pub timeout_minutes: u64,
    pub metadata_path: PathBuf,
    pub output_file: PathBuf,
    pub wait_mode: WaitMode,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        let defaults = LauncherDefaults::default();
        Self {
            scheduler_bin: defaults.scheduler_bin,
            poll_interval_seconds: defaults.poll_interval_seconds,
            timeout_minutes: defaults.timeout_minutes,
            metadata_path: PathBuf::from(defaults.metadata_path),
            output_file: PathBuf::from(defaults.output_file),
            wait_mode: defaults.wait_mode,
        }
    }
}

impl LauncherConfig {
    /// Merge builtin defaults, the optional config file and CLI overrides.
    ///
    /// `null` entries in `cli_overrides` are ignored.
    pub fn load(config_file: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![LauncherDefaults::default().to_value()];

        if let Some(path) = config_file {
            layers.push(Self::load_toml_file(path)?);
        }
        if let Some(cli) = cli_overrides {
            layers.push(cli);
        }

        let merged = merge_layers(layers);
        let config: LauncherConfig =
            serde_json::from_value(merged).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn load_toml_file(path: &Path) -> Result<Value, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table: toml::Value = toml::from_str(&contents).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml_to_json(table))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler_bin.trim().is_empty() {
            return Err(ConfigError::Invalid("scheduler_bin must not be empty".to_string()));
        }
        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_seconds must be greater than 0".to_string(),
            ));
        }
        if self.timeout_minutes == 0 {
            return Err(ConfigError::Invalid("timeout_minutes must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_minutes.saturating_mul(60))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }
}

fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_defaults_only() {
        let config = LauncherConfig::load(None, None).unwrap();
        assert_eq!(config, LauncherConfig::default());
        assert_eq!(config.timeout(), Duration::from_secs(1800));
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_file_then_cli_precedence() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "scheduler_bin = \"/opt/arena/bin/arena\"").unwrap();
        writeln!(temp, "timeout_minutes = 10").unwrap();
        writeln!(temp, "wait_mode = \"terminal\"").unwrap();

        let cli = json!({"timeout_minutes": 2, "scheduler_bin": null});
        let config = LauncherConfig::load(Some(temp.path()), Some(cli)).unwrap();

        assert_eq!(config.scheduler_bin, "/opt/arena/bin/arena");
        assert_eq!(config.timeout_minutes, 2);
        assert_eq!(config.wait_mode, WaitMode::Terminal);
        assert_eq!(config.metadata_path, PathBuf::from("/mlpipeline-ui-metadata.json"));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = LauncherConfig::load(None, Some(json!({"poll_interval_seconds": 0}))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains("poll_interval_seconds"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = LauncherConfig::load(None, Some(json!({"timeout_minutes": 0}))).unwrap_err();
        assert!(err.to_string().contains("timeout_minutes"));
    }

    #[test]
    fn test_unknown_wait_mode_rejected() {
        let err = LauncherConfig::load(None, Some(json!({"wait_mode": "forever"}))).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = LauncherConfig::load(Some(Path::new("/nonexistent/launcher.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_toml_error() {
        let mut temp = NamedTempFile::new().unwrap();
        writeln!(temp, "timeout_minutes = = 3").unwrap();
        let err = LauncherConfig::load(Some(temp.path()), None).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }
}
