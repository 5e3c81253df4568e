//! Application settings.
//!
//! Settings come from an optional `uptime.toml` and are then overridden by
//! environment variables:
//!
//! | variable           | setting                    | default           |
//! |--------------------|----------------------------|-------------------|
//! | `HOST`             | `server.host`              | `0.0.0.0`         |
//! | `PORT`             | `server.port`              | `8080`            |
//! | `DEFAULT_TIMEZONE` | `report.default_timezone`  | `America/Chicago` |
//! | `WORKER_POOL_SIZE` | `report.worker_pool_size`  | `8`               |
//! | `REPORTS_DIR`      | `report.reports_dir`       | `reports`         |
//! | `DATA_DIR`         | `data.dir`                 | `data`            |

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{InvalidTimezone, TimezoneResolver, DEFAULT_TIMEZONE};
use crate::services::DEFAULT_WORKER_POOL_SIZE;

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Invalid default timezone: {0}")]
    Timezone(#[from] InvalidTimezone),
}

/// All settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub report: ReportSettings,
    #[serde(default)]
    pub data: DataSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Report generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,
}

/// Input data settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_worker_pool_size() -> usize {
    DEFAULT_WORKER_POOL_SIZE
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            default_timezone: default_timezone(),
            worker_pool_size: default_worker_pool_size(),
            reports_dir: default_reports_dir(),
        }
    }
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|source| ConfigError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `uptime.toml` from the first standard location that has one.
    ///
    /// Searches:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    ///
    /// Returns `Ok(None)` when no file exists.
    pub fn from_default_location() -> Result<Option<Self>, ConfigError> {
        let search_paths = [
            PathBuf::from("uptime.toml"),
            PathBuf::from("backend/uptime.toml"),
            PathBuf::from("../uptime.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                log::info!("Loading settings from {}", path.display());
                return Self::from_file(&path).map(Some);
            }
        }
        Ok(None)
    }

    /// File settings (or defaults) with environment overrides, validated.
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Self::from_default_location()?.unwrap_or_default();
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_value("PORT", &port)?;
        }
        if let Some(tz) = lookup("DEFAULT_TIMEZONE") {
            self.report.default_timezone = tz;
        }
        if let Some(size) = lookup("WORKER_POOL_SIZE") {
            self.report.worker_pool_size = parse_value("WORKER_POOL_SIZE", &size)?;
        }
        if let Some(dir) = lookup("REPORTS_DIR") {
            self.report.reports_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("DATA_DIR") {
            self.data.dir = PathBuf::from(dir);
        }
        Ok(())
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.report.worker_pool_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "worker_pool_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        self.timezone_resolver()?;
        Ok(())
    }

    /// Resolver falling back to the configured default timezone.
    pub fn timezone_resolver(&self) -> Result<TimezoneResolver, InvalidTimezone> {
        TimezoneResolver::from_name(&self.report.default_timezone)
    }

    /// `host:port` to bind the HTTP listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.report.default_timezone, "America/Chicago");
        assert_eq!(settings.report.worker_pool_size, 8);
        assert_eq!(settings.data.dir, PathBuf::from("data"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml = r#"
[server]
port = 9000

[report]
default_timezone = "Asia/Kolkata"
"#;

        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.report.default_timezone, "Asia/Kolkata");
        assert_eq!(settings.report.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uptime.toml");
        fs::write(&path, "[data]\ndir = \"/srv/uptime\"\n").unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.data.dir, PathBuf::from("/srv/uptime"));

        assert!(matches!(
            Settings::from_file(dir.path().join("missing.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(env(&[
                ("PORT", "3000"),
                ("WORKER_POOL_SIZE", "2"),
                ("DEFAULT_TIMEZONE", "Europe/Berlin"),
                ("REPORTS_DIR", "/tmp/out"),
            ]))
            .unwrap();

        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.report.worker_pool_size, 2);
        assert_eq!(settings.report.reports_dir, PathBuf::from("/tmp/out"));
        assert_eq!(
            settings.timezone_resolver().unwrap().fallback(),
            chrono_tz::Europe::Berlin
        );
    }

    #[test]
    fn test_invalid_overrides() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.apply_overrides(env(&[("PORT", "eighty")])),
            Err(ConfigError::InvalidValue { .. })
        ));

        let mut settings = Settings::default();
        settings
            .apply_overrides(env(&[("DEFAULT_TIMEZONE", "Nowhere/Special")]))
            .unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Timezone(_))));

        let mut settings = Settings::default();
        settings.report.worker_pool_size = 0;
        assert!(settings.validate().is_err());
    }
}
