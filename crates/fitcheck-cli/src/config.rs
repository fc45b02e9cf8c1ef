//! Configuration file management for fitcheck.
//!
//! Provides a TOML-based config file at `~/.config/fitcheck/config.toml`
//! and a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use fitcheck_store::StoreConfig;

/// Env var naming the generator backend.
pub const BACKEND_ENV: &str = "FITCHECK_BACKEND";
/// Env var holding the simulated generator latency in milliseconds.
pub const LATENCY_ENV: &str = "FITCHECK_LATENCY_MS";
/// Backend used when nothing else is configured.
pub const DEFAULT_BACKEND: &str = "offline";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub generator: GeneratorSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageSection {
    /// Directory holding persisted lists. Unset means the XDG data dir.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GeneratorSection {
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub latency_ms: u64,
}

impl Default for GeneratorSection {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            latency_ms: 0,
        }
    }
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the fitcheck config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/fitcheck` or
/// `~/.config/fitcheck`, on every platform.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("fitcheck");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("fitcheck")
}

/// Return the path to the fitcheck config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct FitcheckConfig {
    pub store_config: StoreConfig,
    pub backend: String,
    pub latency: Duration,
}

impl FitcheckConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Data dir: `cli_data_dir` > `FITCHECK_DATA_DIR` > `storage.data_dir` > XDG data dir
    /// - Backend: `cli_backend` > `FITCHECK_BACKEND` > `generator.backend` > `offline`
    /// - Latency: `FITCHECK_LATENCY_MS` > `generator.latency_ms` > 0
    pub fn resolve(cli_data_dir: Option<&str>, cli_backend: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let data_dir = if let Some(dir) = cli_data_dir {
            PathBuf::from(dir)
        } else if let Ok(dir) = std::env::var(StoreConfig::DATA_DIR_ENV) {
            PathBuf::from(dir)
        } else if let Some(dir) = file_config.as_ref().and_then(|c| c.storage.data_dir.clone()) {
            dir
        } else {
            StoreConfig::default_data_dir()
        };

        let backend = if let Some(name) = cli_backend {
            name.to_string()
        } else if let Ok(name) = std::env::var(BACKEND_ENV) {
            name
        } else if let Some(ref cfg) = file_config {
            cfg.generator.backend.clone()
        } else {
            default_backend()
        };

        let latency_ms = if let Ok(raw) = std::env::var(LATENCY_ENV) {
            raw.parse::<u64>()
                .with_context(|| format!("{LATENCY_ENV} must be a whole number of milliseconds"))?
        } else if let Some(ref cfg) = file_config {
            cfg.generator.latency_ms
        } else {
            0
        };

        Ok(Self {
            store_config: StoreConfig::new(data_dir),
            backend,
            latency: Duration::from_millis(latency_ms),
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
