use std::path::{Path, PathBuf};

use super::types::AppConfig;

/// Get the default wavecrew data directory: ~/.wavecrew
pub fn get_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".wavecrew"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    // Priority 1: ~/.wavecrew/config.toml (highest)
    let data_dir = get_data_dir()?;
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./wavecrew.toml (current directory)
    let local_config = Path::new("wavecrew.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    if cfg.logging.file
        && cfg
            .logging
            .directory
            .as_deref()
            .map(|s| s.trim().is_empty())
            .unwrap_or(true)
    {
        let logs_dir = data_dir.join("logs");
        std::fs::create_dir_all(&logs_dir)?;
        cfg.logging.directory = Some(logs_dir.to_string_lossy().to_string());
    }

    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

// Environment variable overrides (Priority 0: highest)
fn apply_env_overrides(cfg: &mut AppConfig) {
    if let Ok(v) = std::env::var("WAVECREW_AGENT_BIN") {
        if !v.trim().is_empty() {
            cfg.runner.binary = v;
        }
    }
    if let Ok(v) = std::env::var("WAVECREW_LOG_LEVEL") {
        if !v.trim().is_empty() {
            cfg.logging.level = v;
        }
    }
}
