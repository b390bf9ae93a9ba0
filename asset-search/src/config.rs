//! Search service configuration.
//!
//! Read from a TOML file, then overridden from the environment:
//!
//! ```toml
//! whitelist_path = "config/valid-queries.json"
//! category_keywords = ["model", "texture"]
//! log_level = "debug"
//! ```
//!
//! Every key is optional. A missing file means all defaults.
//!
//! # Environment
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `ASSET_SEARCH_WHITELIST` | `whitelist_path` |
//! | `ASSET_SEARCH_LOG` | `log_level` |

use crate::constants::{
    DEFAULT_LOG_LEVEL, DEFAULT_WHITELIST_PATH, ENV_LOG, ENV_WHITELIST, RESERVED_CATEGORIES,
};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Configuration for a search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// JSON file listing the searchable field paths.
    pub whitelist_path: PathBuf,
    /// Keywords that, searched alone, list a whole category.
    pub category_keywords: Vec<String>,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            whitelist_path: PathBuf::from(DEFAULT_WHITELIST_PATH),
            category_keywords: RESERVED_CATEGORIES.iter().map(ToString::to_string).collect(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl SearchConfig {
    /// Parse a TOML document.
    ///
    /// ```
    /// use asset_search::SearchConfig;
    ///
    /// let config = SearchConfig::from_toml_str(r#"log_level = "debug""#).unwrap();
    /// assert_eq!(config.log_level, "debug");
    /// assert_eq!(config.whitelist_path.to_str(), Some("valid-queries.json"));
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Toml(e.to_string()))
    }

    /// Read a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            },
            Err(err) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: err,
            }),
        }
    }

    /// Apply overrides from `(name, value)` pairs such as `std::env::vars()`.
    ///
    /// ```
    /// use asset_search::SearchConfig;
    ///
    /// let env = vec![("ASSET_SEARCH_LOG".to_string(), "warn".to_string())];
    /// let config = SearchConfig::default().with_env_overrides(&env);
    /// assert_eq!(config.log_level, "warn");
    /// ```
    #[must_use]
    pub fn with_env_overrides(mut self, env: &[(String, String)]) -> Self {
        if let Some(path) = env_get(env, ENV_WHITELIST) {
            self.whitelist_path = PathBuf::from(path);
        }
        if let Some(level) = env_get(env, ENV_LOG) {
            self.log_level = level.to_string();
        }
        self
    }

    /// The configured log level.
    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        self.log_level
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }
}

/// Look up a variable, ignoring empty values.
fn env_get<'a>(env: &'a [(String, String)], name: &str) -> Option<&'a str> {
    env.iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Invalid configuration.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file exists but could not be read.
    Io {
        /// The config file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
    /// The file is not valid TOML or has unexpected keys.
    Toml(String),
    /// `log_level` is not a known level.
    InvalidLogLevel(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config {}: {source}", path.display())
            },
            Self::Toml(err) => write!(f, "invalid config: {err}"),
            Self::InvalidLogLevel(level) => write!(
                f,
                "invalid log level '{level}' (expected off, error, warn, info, debug or trace)"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = SearchConfig::default();
        assert_eq!(config.whitelist_path, PathBuf::from("valid-queries.json"));
        assert_eq!(config.category_keywords.len(), 7);
        assert!(config.category_keywords.iter().any(|c| c == "hdri"));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
    }

    #[test]
    fn test_full_toml() {
        let config = SearchConfig::from_toml_str(
            r#"
            whitelist_path = "conf/fields.json"
            category_keywords = ["model"]
            log_level = "DEBUG"
            "#,
        )
        .unwrap();
        assert_eq!(config.whitelist_path, PathBuf::from("conf/fields.json"));
        assert_eq!(config.category_keywords, vec!["model"]);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(SearchConfig::from_toml_str("").unwrap(), SearchConfig::default());
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(
            SearchConfig::from_toml_str("log_level = "),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            SearchConfig::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = SearchConfig::load("/nonexistent/asset-search.toml").unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let config = SearchConfig::default().with_env_overrides(&env(&[
            ("ASSET_SEARCH_WHITELIST", "/etc/fields.json"),
            ("ASSET_SEARCH_LOG", "trace"),
            ("UNRELATED", "x"),
        ]));
        assert_eq!(config.whitelist_path, PathBuf::from("/etc/fields.json"));
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Trace);
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let config = SearchConfig::default().with_env_overrides(&env(&[("ASSET_SEARCH_LOG", "")]));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_invalid_log_level() {
        let config = SearchConfig {
            log_level: "loud".into(),
            ..SearchConfig::default()
        };
        assert!(matches!(
            config.level_filter(),
            Err(ConfigError::InvalidLogLevel(level)) if level == "loud"
        ));
    }
}
