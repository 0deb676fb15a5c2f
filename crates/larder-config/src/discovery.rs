//! Config file discovery and layered merging.
//!
//! Resolution order (later overrides earlier):
//! 1. `~/.config/larder/config.toml` (XDG user config)
//! 2. `./larder.toml` (project-local)
//! 3. CLI arguments (handled externally)

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::APP_NAME;
use crate::{ConfigError, LarderConfig, Result};

/// Default config filename for project-local config.
const PROJECT_CONFIG_FILE: &str = "larder.toml";

/// Default config filename within XDG config directory.
const USER_CONFIG_FILE: &str = "config.toml";

/// Environment variable to override the config directory.
///
/// When set, this takes precedence over the platform default.
const CONFIG_DIR_ENV: &str = "LARDER_CONFIG_DIR";

/// Tracks where each config layer was loaded from.
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the config file.
    pub path: PathBuf,
    /// Whether the file was found and loaded.
    pub loaded: bool,
}

/// Result of config discovery and loading.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The merged configuration.
    pub config: LarderConfig,
    /// Sources that were checked, in order of precedence (lowest first).
    pub sources: Vec<ConfigSource>,
    /// Warnings generated during loading (e.g., unparseable layers).
    pub warnings: Vec<String>,
}

impl LoadedConfig {
    /// Get paths of sources that were actually loaded.
    pub fn loaded_from(&self) -> Vec<&Path> {
        self.sources
            .iter()
            .filter(|s| s.loaded)
            .map(|s| s.path.as_path())
            .collect()
    }
}

/// Load configuration by discovering and merging all config layers.
///
/// Searches for config files in order:
/// 1. User config dir (`LARDER_CONFIG_DIR` env, or platform default)
/// 2. Project-local (`./larder.toml` or specified project dir)
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Load configuration with explicit control over the user config directory.
///
/// `config_dir` overrides both `LARDER_CONFIG_DIR` and the platform default.
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    config_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let mut config = LarderConfig::new();
    let mut sources = Vec::new();
    let mut warnings = Vec::new();

    let user_config_path = match config_dir {
        Some(dir) => Some(dir.join(USER_CONFIG_FILE)),
        None => xdg_config_path(),
    };
    if let Some(path) = user_config_path {
        let source = load_layer(&mut config, &path, &mut warnings)?;
        sources.push(source);
    }

    let project_path = project_dir
        .map(|d| d.join(PROJECT_CONFIG_FILE))
        .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG_FILE));
    let source = load_layer(&mut config, &project_path, &mut warnings)?;
    sources.push(source);

    check_thresholds(&config, &mut warnings);

    Ok(LoadedConfig {
        config,
        sources,
        warnings,
    })
}

/// Load config from a specific file path (no discovery).
pub fn load_config_file(path: &Path) -> Result<LarderConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    LarderConfig::from_toml(&contents)
}

/// Save configuration to a file.
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &LarderConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_toml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Get the XDG config file path for larder.
pub fn xdg_config_path() -> Option<PathBuf> {
    xdg_config_dir().map(|d| d.join(USER_CONFIG_FILE))
}

/// Get the XDG config directory for larder.
///
/// Checks `LARDER_CONFIG_DIR` env var first, then falls back to platform default.
pub fn xdg_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Try to load a config file and merge it into the existing config.
fn load_layer(
    config: &mut LarderConfig,
    path: &Path,
    warnings: &mut Vec<String>,
) -> Result<ConfigSource> {
    if !path.is_file() {
        return Ok(ConfigSource {
            path: path.to_path_buf(),
            loaded: false,
        });
    }

    match load_config_file(path) {
        Ok(layer) => {
            debug!(path = %path.display(), "Loaded config layer");
            config.merge(layer);
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: true,
            })
        }
        Err(e) => {
            warnings.push(format!("Failed to load {}: {}", path.display(), e));
            Ok(ConfigSource {
                path: path.to_path_buf(),
                loaded: false,
            })
        }
    }
}

/// Flag thresholds that would empty the store on every run.
fn check_thresholds(config: &LarderConfig, warnings: &mut Vec<String>) {
    let Some(ref maintenance) = config.maintenance else {
        return;
    };

    if maintenance.max_entries == Some(0) {
        warnings.push(
            "[maintenance] max_entries = 0 evicts every session on each run".to_string(),
        );
    }
    if maintenance.max_age_ms == Some(0) {
        warnings.push(
            "[maintenance] max_age_ms = 0 prunes every timestamped session on each run"
                .to_string(),
        );
    }
    if maintenance.max_bytes == Some(0) {
        warnings.push(
            "[maintenance] max_bytes = 0 rotates any non-empty store file on each run"
                .to_string(),
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
