//! Service configuration.
//!
//! Loaded from a TOML file with environment-variable overrides for the
//! query-service knobs. Every section has usable defaults so tests and
//! embedded callers can run with `Config::default()`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Query-service knobs.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GraphConfig {
    /// Emit space-labeled variants of query metrics.
    pub enable_space_level_metrics: bool,
    /// Queries slower than this (microseconds) count as slow queries.
    pub slow_query_threshold_us: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enable_space_level_metrics: false,
            slow_query_threshold_us: 200_000,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    pub level: String,
    pub dir: String,
    pub file: String,
    /// Maximum size of a single log file in bytes.
    pub max_file_size: u64,
    /// Number of rotated log files to keep.
    pub max_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: "logs".to_string(),
            file: "graph-query".to_string(),
            max_file_size: 100 * 1024 * 1024,
            max_files: 5,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment overrides for the graph knobs:
    /// `GRAPH_ENABLE_SPACE_LEVEL_METRICS` and `GRAPH_SLOW_QUERY_THRESHOLD_US`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("GRAPH_ENABLE_SPACE_LEVEL_METRICS") {
            if let Ok(parsed) = v.parse::<bool>() {
                self.graph.enable_space_level_metrics = parsed;
            } else {
                log::warn!("ignoring invalid GRAPH_ENABLE_SPACE_LEVEL_METRICS: {}", v);
            }
        }
        if let Ok(v) = env::var("GRAPH_SLOW_QUERY_THRESHOLD_US") {
            if let Ok(parsed) = v.parse::<u64>() {
                self.graph.slow_query_threshold_us = parsed;
            } else {
                log::warn!("ignoring invalid GRAPH_SLOW_QUERY_THRESHOLD_US: {}", v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.graph.enable_space_level_metrics);
        assert_eq!(config.graph.slow_query_threshold_us, 200_000);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_parse_partial_toml() {
        let content = r#"
[graph]
enable_space_level_metrics = true
slow_query_threshold_us = 50000
"#;
        let config: Config = toml::from_str(content).expect("valid toml");
        assert!(config.graph.enable_space_level_metrics);
        assert_eq!(config.graph.slow_query_threshold_us, 50_000);
        // Missing sections fall back to defaults.
        assert_eq!(config.log.max_files, 5);
    }
}
