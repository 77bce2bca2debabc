//! Persistent configuration for Lattice.
//!
//! Loads/saves a TOML config at `<config root>/config.toml`. The config
//! root defaults to `~/.lattice` and can be overridden with the
//! `LATTICE_HOME` environment variable.

use crate::LatticeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the config root directory.
pub const CONFIG_ROOT_ENV: &str = "LATTICE_HOME";

/// Top-level Lattice configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub scan: ScanConfig,
    pub propagator: PropagatorConfig,
    pub delta: DeltaConfig,
    pub query: QueryConfig,
}

impl LatticeConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, LatticeError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LatticeError::Config(e.to_string()))
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<(), LatticeError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LatticeError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the default path, or return defaults if the file doesn't exist.
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Default config path: `<config root>/config.toml`.
    pub fn default_path() -> PathBuf {
        config_root().join("config.toml")
    }
}

/// Resolve the per-user config root, honoring `LATTICE_HOME`.
pub fn config_root() -> PathBuf {
    if let Ok(root) = std::env::var(CONFIG_ROOT_ENV) {
        if !root.is_empty() {
            return PathBuf::from(root);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lattice")
}

/// Cold-start project scan ceilings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Maximum number of files indexed at cold start.
    pub max_files: usize,
    /// Wall-clock ceiling for the initial scan, in seconds.
    pub max_seconds: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_files: 200,
            max_seconds: 7,
        }
    }
}

/// Bounds on the cascade re-parse after an exported-set change.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagatorConfig {
    /// Maximum files re-resolved per original edit.
    pub max_fanout: usize,
    /// Maximum cascade depth (immediate dependents + their dependents).
    pub max_depth: usize,
}

impl Default for PropagatorConfig {
    fn default() -> Self {
        Self {
            max_fanout: 16,
            max_depth: 2,
        }
    }
}

/// Delta differ tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeltaConfig {
    /// Line window within which rename candidates must overlap.
    pub rename_window: u32,
}

impl Default for DeltaConfig {
    fn default() -> Self {
        Self { rename_window: 10 }
    }
}

/// Query engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// BFS depth for impact analysis over reverse file deps.
    pub impact_depth: usize,
    /// Regexes marking entry-point names excluded from dead-code reports.
    pub entry_points: Vec<String>,
    /// Number of nodes listed in summary top-degree tables.
    pub summary_top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            impact_depth: 5,
            entry_points: vec!["^(main|run|start|handler|init)$".to_string()],
            summary_top_k: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrips_through_toml() {
        let config = LatticeConfig::default();
        let toml_str =
            toml::to_string_pretty(&config).expect("default config should serialize to TOML");
        let parsed: LatticeConfig = toml::from_str(&toml_str).expect("serialized TOML should parse");
        assert_eq!(parsed.scan.max_files, 200);
        assert_eq!(parsed.propagator.max_fanout, 16);
        assert_eq!(parsed.propagator.max_depth, 2);
        assert_eq!(parsed.delta.rename_window, 10);
        assert_eq!(parsed.query.impact_depth, 5);
    }

    #[test]
    fn load_nonexistent_returns_error() {
        let result = LatticeConfig::load(Path::new("/tmp/nonexistent_lattice_config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join("lattice_config_test");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.toml");

        let mut config = LatticeConfig::default();
        config.propagator.max_fanout = 4;
        config.scan.max_files = 50;

        config.save(&path).expect("save should succeed");
        let loaded = LatticeConfig::load(&path).expect("load should succeed");

        assert_eq!(loaded.propagator.max_fanout, 4);
        assert_eq!(loaded.scan.max_files, 50);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_toml_uses_defaults_for_missing_fields() {
        let partial = r#"
[propagator]
max_fanout = 8
"#;
        let config: LatticeConfig = toml::from_str(partial).expect("partial TOML should parse");
        assert_eq!(config.propagator.max_fanout, 8);
        assert_eq!(config.propagator.max_depth, 2);
        assert_eq!(config.scan.max_files, 200);
    }

    #[test]
    fn entry_point_defaults_cover_main() {
        let config = LatticeConfig::default();
        let re = regex_lite_check(&config.query.entry_points[0], "main");
        assert!(re);
    }

    // Avoids a regex dependency in core: the default pattern is a plain
    // alternation, checked structurally.
    fn regex_lite_check(pattern: &str, name: &str) -> bool {
        pattern
            .trim_start_matches("^(")
            .trim_end_matches(")$")
            .split('|')
            .any(|p| p == name)
    }
}
