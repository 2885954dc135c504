use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::PlexmetaError;
use crate::orchestrator::ReconcileOptions;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub library: LibraryConfig,
    pub overrides: OverridesConfig,
    pub reconcile: ReconcileConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub address: String,
    pub auth_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    pub name: String,
    pub required_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverridesConfig {
    pub file_name: String,
    pub library_dir_prefix: String,
    pub local_dir_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub dry_run: bool,
    pub always_modify: bool,
    pub max_episode_title_len: usize,
}

impl AppConfig {
    /// Load config: user file (if exists) merged over built-in defaults.
    pub fn load() -> Result<Self, PlexmetaError> {
        Self::load_from(&Self::config_path())
    }

    /// Load config from `path` merged over built-in defaults.
    ///
    /// A missing file yields the defaults. Keys absent from the file keep
    /// their default values.
    pub fn load_from(path: &Path) -> Result<Self, PlexmetaError> {
        let mut merged: toml::Table = toml::from_str(DEFAULT_CONFIG)
            .map_err(|e| PlexmetaError::Config(e.to_string()))?;

        if path.exists() {
            let user_str = std::fs::read_to_string(path)?;
            let user: toml::Table = toml::from_str(&user_str)
                .map_err(|e| PlexmetaError::Config(format!("{}: {e}", path.display())))?;
            merge_tables(&mut merged, user);
            tracing::debug!(path = %path.display(), "Loaded user config");
        } else {
            tracing::debug!(path = %path.display(), "No user config, using defaults");
        }

        toml::Value::Table(merged)
            .try_into()
            .map_err(|e: toml::de::Error| PlexmetaError::Config(e.to_string()))
    }

    /// Fail on settings the run cannot do without.
    pub fn validate(&self) -> Result<(), PlexmetaError> {
        if self.server.address.trim().is_empty() {
            return Err(PlexmetaError::Config("server.address must be configured".into()));
        }
        if self.server.auth_token.trim().is_empty() {
            return Err(PlexmetaError::Config(
                "server.auth_token must be configured".into(),
            ));
        }
        if self.library.name.trim().is_empty() {
            return Err(PlexmetaError::Config("library.name must be configured".into()));
        }
        if self.reconcile.max_episode_title_len == 0 {
            return Err(PlexmetaError::Config(
                "reconcile.max_episode_title_len must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            dry_run: self.reconcile.dry_run,
            always_modify: self.reconcile.always_modify,
            max_episode_title_len: self.reconcile.max_episode_title_len,
        }
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "plexmeta")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}

/// Recursively overlay `overlay` onto `base`; nested tables merge, other values replace.
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match value {
            toml::Value::Table(overlay_child) => match base.get_mut(&key) {
                Some(toml::Value::Table(base_child)) => merge_tables(base_child, overlay_child),
                _ => {
                    base.insert(key, toml::Value::Table(overlay_child));
                }
            },
            other => {
                base.insert(key, other);
            }
        }
    }
}
