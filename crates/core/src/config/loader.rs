//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, Result, ResultExt};
use std::path::Path;

/// Configuration wrapper
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed and validated settings
    pub schema: ConfigSchema,
    /// File the settings came from, `None` when running on defaults
    pub path: Option<String>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// An explicit `path` must exist. Without one, the standard locations are
    /// searched and defaults are used when none of them exist.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            if !Path::new(p).exists() {
                return Err(Error::file_not_found(p));
            }
        }

        let config_path = path.map(String::from).or_else(find_config_file);

        let schema = if let Some(ref p) = config_path {
            load_config_file(p)?
        } else {
            ConfigSchema::default()
        };

        schema
            .validate()
            .context(format!("While loading {}", config_path.as_deref().unwrap_or("defaults")))?;

        Ok(Self {
            schema,
            path: config_path,
        })
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let schema: ConfigSchema = toml::from_str(content)?;
        schema.validate()?;
        Ok(Self { schema, path: None })
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<String> {
    let candidates = [".rider.toml", "rider.toml", ".config/rider.toml"];

    candidates
        .into_iter()
        .find(|candidate| Path::new(candidate).exists())
        .map(String::from)
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &str) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read config file {path}: {e}")))?;

    toml::from_str(&content)
        .map_err(|e| Error::from(e).with_context(format!("Failed to parse config file {path}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.location.poll_interval_ms, 3000);
        assert!((config.schema.arrival.min_threshold_m - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[location]\npoll_interval_ms = 5000\n\n[arrival]\nmin_threshold_m = 40.0"
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let config = Config::load(Some(path)).unwrap();

        assert_eq!(config.path.as_deref(), Some(path));
        assert_eq!(config.schema.location.poll_interval_ms, 5000);
        assert_eq!(config.schema.location.time_interval_ms, 3000);
        assert!((config.schema.arrival.min_threshold_m - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some("/definitely/not/here/rider.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }

    #[test]
    fn test_config_rejects_invalid_values() {
        let err = Config::from_toml("[location]\npoll_interval_ms = 0").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidConfigValue);
    }

    #[test]
    fn test_config_parse_error() {
        let err = Config::from_toml("[location\npoll_interval_ms = 1").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }
}
