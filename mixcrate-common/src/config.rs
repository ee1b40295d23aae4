//! Configuration loading and library root folder resolution
//!
//! The library root folder contains everything mixcrate persists:
//! `library.sqlite` plus the `covers/` directory for resolved artwork.
//!
//! Resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`MIXCRATE_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the library root folder
pub const ROOT_ENV_VAR: &str = "MIXCRATE_ROOT";

/// TOML configuration file contents
///
/// All keys are optional; absent keys fall back to the next resolution tier
/// or to compiled defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Library root folder override
    pub root_folder: Option<String>,
    /// Discogs personal access token (optional, raises Discogs rate limits)
    pub discogs_token: Option<String>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load the TOML config file from the platform config directory, if present
///
/// Looks for `~/.config/mixcrate/config.toml` (or the platform equivalent).
/// A missing file is not an error; a malformed file is.
pub fn load_toml_config() -> Result<TomlConfig> {
    let Some(path) = config_file_path() else {
        return Ok(TomlConfig::default());
    };
    if !path.exists() {
        return Ok(TomlConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Platform config file location (`<config dir>/mixcrate/config.toml`)
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mixcrate").join("config.toml"))
}

/// Resolve the library root folder
pub fn resolve_root_folder(cli_arg: Option<&str>, toml_config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return PathBuf::from(path);
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(root) = &toml_config.root_folder {
        return PathBuf::from(root);
    }

    // Priority 4: OS-dependent compiled default
    default_root_folder()
}

/// OS-dependent default root folder (`<data dir>/mixcrate`)
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("mixcrate"))
        .unwrap_or_else(|| PathBuf::from("./mixcrate"))
}

/// Ensure the root folder and its subdirectories exist
pub fn ensure_root_folder(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root)?;
    std::fs::create_dir_all(covers_dir(root))?;
    tracing::debug!(root = %root.display(), "Library root folder ready");
    Ok(())
}

/// Library database location under the root folder
pub fn database_path(root: &Path) -> PathBuf {
    root.join("library.sqlite")
}

/// Resolved cover artwork directory under the root folder
pub fn covers_dir(root: &Path) -> PathBuf {
    root.join("covers")
}
