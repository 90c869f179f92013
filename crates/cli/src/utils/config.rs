use anyhow::{Context, Result};
use hostpilot_core::Config;
use std::env;
use std::path::Path;
use tracing::debug;

/// Configuration from `explicit`, or the nearest config file above the working directory
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        debug!("Loading config from {}", path.display());
        return Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()));
    }

    let cwd = env::current_dir().context("Failed to get current directory")?;
    Config::discover(&cwd).context("Failed to load configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("custom.json");
        fs::write(&path, r#"{ "wait_for_build": false, "retry": { "delay_ms": 10 } }"#).unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(!config.wait_for_build);
        assert_eq!(config.retry.delay_ms, 10);
        assert_eq!(config.retry.ceiling_ms, 30_000);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = load_config(Some(&temp.path().join("absent.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
