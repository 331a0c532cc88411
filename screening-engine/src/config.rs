//! Configuration for the screening engine

use crate::types::DEFAULT_FUZZY_MATCH_THRESHOLD;
use crate::watchlist::DEFAULT_ALIAS_DELIMITER;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Screening engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Rule document (YAML)
    pub rules_path: PathBuf,

    /// Watchlist source (CSV)
    pub watchlist_path: PathBuf,

    /// Fuzzy threshold used when the rule document has none (0-100)
    pub default_fuzzy_threshold: f64,

    /// Separator inside the watchlist `aliases` column
    pub alias_delimiter: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "screening-engine".to_string(),
            rules_path: PathBuf::from("./config/rules.yaml"),
            watchlist_path: PathBuf::from("./data/watchlist.csv"),
            default_fuzzy_threshold: DEFAULT_FUZZY_MATCH_THRESHOLD,
            alias_delimiter: DEFAULT_ALIAS_DELIMITER,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `KYC_*` environment overrides
    pub fn with_env_overrides(mut self) -> crate::Result<Self> {
        if let Ok(path) = std::env::var("KYC_RULES_PATH") {
            self.rules_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("KYC_WATCHLIST_PATH") {
            self.watchlist_path = PathBuf::from(path);
        }

        if let Ok(threshold) = std::env::var("KYC_FUZZY_THRESHOLD") {
            self.default_fuzzy_threshold = threshold.parse().map_err(|_| {
                crate::Error::Config(format!("KYC_FUZZY_THRESHOLD is not a number: {}", threshold))
            })?;
        }

        Ok(self)
    }
}
