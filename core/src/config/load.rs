use std::path::{Path, PathBuf};

use super::types::AppConfig;

pub const ENV_BASE_URL: &str = "PLANNER_BASE_URL";
pub const ENV_WS_URL: &str = "PLANNER_WS_URL";
pub const ENV_HEALTH_URL: &str = "PLANNER_HEALTH_URL";

/// Get the default planner data directory: ~/.planner
pub fn get_planner_data_dir() -> anyhow::Result<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map_err(|_| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(PathBuf::from(home).join(".planner"))
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    let cfg = toml::from_str::<AppConfig>(&s)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {e}", path.display()))?;
    Ok(cfg)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let data_dir = get_planner_data_dir()?;

    // Priority 1: ~/.planner/config.toml (highest)
    let user_config = data_dir.join("config.toml");

    // Priority 2: ./config.toml (current directory)
    let local_config = Path::new("config.toml");

    let mut cfg = if user_config.exists() {
        load_from_path(&user_config)?
    } else if local_config.exists() {
        load_from_path(local_config)?
    } else {
        AppConfig::default()
    };

    default_log_directory(&mut cfg, &data_dir);

    // Environment variable overrides (Priority 0: highest)
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());

    tracing::debug!(
        target: "planner.config",
        base_url = %cfg.backend.base_url,
        ws_url = %cfg.backend.ws_url,
        max_attempts = cfg.reconnect.max_attempts,
        strategy = ?cfg.reconnect.strategy,
        "config loaded"
    );
    Ok(cfg)
}

/// Log files go to `<data_dir>/logs` unless the config names a directory.
/// The directory is created by whoever opens the log file.
pub fn default_log_directory(cfg: &mut AppConfig, data_dir: &Path) {
    let unset = cfg
        .logging
        .directory
        .as_deref()
        .map(|s| s.trim().is_empty())
        .unwrap_or(true);
    if unset {
        cfg.logging.directory = Some(data_dir.join("logs").to_string_lossy().to_string());
    }
}

pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty(ENV_BASE_URL) {
        cfg.backend.base_url = v;
    }
    if let Some(v) = non_empty(ENV_WS_URL) {
        cfg.backend.ws_url = v;
    }
    if let Some(v) = non_empty(ENV_HEALTH_URL) {
        cfg.backend.health_url = v;
    }
}
