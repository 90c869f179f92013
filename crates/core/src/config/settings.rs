use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Registry name prefix of automation-capable host objects
pub const DEFAULT_REGISTRY_PREFIX: &str = "!VisualStudio.DTE";

/// File names searched for, nearest directory first
pub const CONFIG_FILE_NAMES: [&str; 2] = [".hostpilot.json", "hostpilot.json"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    pub registry_prefix: String,
    pub retry: RetrySettings,
    /// Block until the host finishes a build before reporting
    pub wait_for_build: bool,
    /// Directory names skipped by the on-disk file search, on top of the built-in set
    pub extra_ignored_dirs: Vec<String>,
    /// Process id to target instead of the foreground instance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_instance: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct RetrySettings {
    pub delay_ms: u64,
    pub ceiling_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_prefix: DEFAULT_REGISTRY_PREFIX.to_string(),
            retry: RetrySettings::default(),
            wait_for_build: true,
            extra_ignored_dirs: Vec::new(),
            default_instance: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_ms: 250,
            ceiling_ms: 30_000,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents).map_err(|e| {
            Error::ConfigError(format!("Failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.is_file() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    /// Load the nearest config file above `start_path`, or the defaults
    pub fn discover(start_path: &Path) -> Result<Self> {
        match Self::find_config_file(start_path) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                debug!("No config file above {}, using defaults", start_path.display());
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.registry_prefix.trim().is_empty() {
            return Err(Error::ConfigError("registry_prefix must not be empty".into()));
        }
        if self.retry.ceiling_ms == 0 {
            return Err(Error::ConfigError("retry.ceiling_ms must be positive".into()));
        }
        if self.retry.delay_ms > self.retry.ceiling_ms {
            return Err(Error::ConfigError(
                "retry.delay_ms must not exceed retry.ceiling_ms".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = serde_json::from_str(r#"{ "retry": { "delay_ms": 10 } }"#).unwrap();
        assert_eq!(config.registry_prefix, DEFAULT_REGISTRY_PREFIX);
        assert_eq!(config.retry.delay_ms, 10);
        assert_eq!(config.retry.ceiling_ms, 30_000);
        assert!(config.wait_for_build);
    }

    #[test]
    fn test_find_config_file_walks_up() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(
            temp.path().join(".hostpilot.json"),
            r#"{ "default_instance": 4242, "extra_ignored_dirs": ["out"] }"#,
        )
        .unwrap();

        let found = Config::find_config_file(&nested).unwrap();
        assert_eq!(found, temp.path().join(".hostpilot.json"));

        let config = Config::discover(&nested).unwrap();
        assert_eq!(config.default_instance, Some(4242));
        assert_eq!(config.extra_ignored_dirs, vec!["out".to_string()]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hostpilot.json");

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(Error::ConfigError(_))
        ));

        std::fs::write(&path, r#"{ "retry": { "delay_ms": 500, "ceiling_ms": 100 } }"#).unwrap();
        assert!(matches!(
            Config::load_from_file(&path),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn test_save_and_reload() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".hostpilot.json");
        let config = Config {
            wait_for_build: false,
            ..Config::default()
        };
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert!(!loaded.wait_for_build);
        assert_eq!(loaded.default_instance, None);
    }
}
