//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use vigil_core::constants::{DEFAULT_TICK_INTERVAL_MS, INDICATOR_ID, SERVICE_NAME};

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Milliseconds between reconciliation ticks.
    /// Override: `VIGIL_TICK_INTERVAL_MS`
    pub tick_interval_ms: u64,

    /// Name the playback service is registered under.
    /// Override: `VIGIL_SERVICE_NAME`
    pub service_name: String,

    /// Identity of the foreground indicator.
    pub indicator_id: u32,

    /// Whether the first context starts with playback active.
    /// When false the daemon boots silently, as after a device restart.
    /// Override: `VIGIL_START_PLAYING`
    pub start_playing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            service_name: SERVICE_NAME.to_string(),
            indicator_id: INDICATOR_ID,
            start_playing: false,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `VIGIL_*` overrides read through `lookup`.
    ///
    /// Values that fail to parse are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(interval) = lookup("VIGIL_TICK_INTERVAL_MS").and_then(|v| v.parse().ok()) {
            self.tick_interval_ms = interval;
        }

        if let Some(name) = lookup("VIGIL_SERVICE_NAME").filter(|v| !v.is_empty()) {
            self.service_name = name;
        }

        if let Some(playing) = lookup("VIGIL_START_PLAYING").and_then(|v| v.parse().ok()) {
            self.start_playing = playing;
        }

        // Note: VIGIL_LOG_LEVEL is handled by clap via #[arg(env = ...)] in main.rs
    }

    /// Converts to vigil-core's Config type.
    pub fn to_core_config(&self) -> vigil_core::Config {
        vigil_core::Config {
            service_name: self.service_name.clone(),
            tick_interval_ms: self.tick_interval_ms,
            indicator_id: self.indicator_id,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn missing_path_yields_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.tick_interval_ms, 5000);
        assert_eq!(config.indicator_id, 1001);
        assert!(!config.start_playing);
    }

    #[test]
    fn loads_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms: 250\nstart_playing: true").unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.tick_interval_ms, 250);
        assert!(config.start_playing);
        assert_eq!(config.service_name, SERVICE_NAME);
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tick_interval_ms: [not, a, number]").unwrap();

        let err = ServerConfig::load(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn unreadable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServerConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn overrides_replace_parsable_values_only() {
        let env: HashMap<&str, &str> = [
            ("VIGIL_TICK_INTERVAL_MS", "soon"),
            ("VIGIL_SERVICE_NAME", "radio.Background"),
            ("VIGIL_START_PLAYING", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = ServerConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.tick_interval_ms, 5000);
        assert_eq!(config.service_name, "radio.Background");
        assert!(config.start_playing);
    }

    #[test]
    fn core_config_carries_overrides() {
        let config = ServerConfig {
            tick_interval_ms: 100,
            ..Default::default()
        };
        let core = config.to_core_config();
        assert_eq!(core.tick_interval_ms, 100);
        assert!(core.validate().is_ok());
    }
}
