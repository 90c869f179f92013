use anyhow::{Context, Result};
use hostpilot_core::Config;
use hostpilot_core::config::CONFIG_FILE_NAMES;
use std::{env, path::Path};
use tracing::info;

pub fn init_command(cwd: Option<&Path>, force: bool) -> Result<u8> {
    let root = match cwd {
        Some(cwd) => cwd.to_path_buf(),
        None => env::current_dir().context("Failed to get current directory")?,
    };
    let config_path = root.join(CONFIG_FILE_NAMES[0]);

    if config_path.exists() && !force {
        println!("❌ Config already exists at: {}", config_path.display());
        println!("   Use --force to overwrite");
        return Ok(1);
    }

    Config::default()
        .save_to_file(&config_path)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    info!("Wrote {}", config_path.display());

    println!("✅ Created config: {}", config_path.display());
    println!("\n📌 Settings:");
    println!("   • registry_prefix: registry name prefix of host objects");
    println!("   • retry.delay_ms / retry.ceiling_ms: busy-host retry policy");
    println!("   • extra_ignored_dirs: directories skipped by the on-disk file search");
    println!("   • default_instance: process id to drive instead of the foreground host");
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_writes_loadable_config() {
        let temp = TempDir::new().unwrap();
        assert_eq!(init_command(Some(temp.path()), false).unwrap(), 0);

        let config = Config::load_from_file(&temp.path().join(".hostpilot.json")).unwrap();
        assert_eq!(config.registry_prefix, "!VisualStudio.DTE");
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".hostpilot.json");
        std::fs::write(&path, r#"{ "wait_for_build": false }"#).unwrap();

        assert_eq!(init_command(Some(temp.path()), false).unwrap(), 1);
        assert!(!Config::load_from_file(&path).unwrap().wait_for_build);

        assert_eq!(init_command(Some(temp.path()), true).unwrap(), 0);
        assert!(Config::load_from_file(&path).unwrap().wait_for_build);
    }
}
