use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dashboard::CONDENSED_MAX_CHARS;
use crate::permissions::ResolverConfig;

const SETTINGS_DIR_NAME: &str = "modwatch";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Could not determine config directory")]
    NoConfigDir,
    #[error("Failed to create config directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Write settings {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// How long approved-user and moderator rosters are reused before
    /// asking the platform again.
    pub permission_cache_ttl_secs: u64,

    /// After a roster fetch fails, don't retry that roster for this many seconds.
    /// Zero retries on every lookup.
    pub permission_failure_backoff_secs: u64,

    /// Character budget for the condensed (toast) dashboard line.
    pub condensed_max_chars: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            permission_cache_ttl_secs: 5 * 60,
            permission_failure_backoff_secs: 0,
            condensed_max_chars: CONDENSED_MAX_CHARS,
        }
    }
}

impl AppSettings {
    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            ttl: Duration::from_secs(self.permission_cache_ttl_secs),
            failure_backoff: Duration::from_secs(self.permission_failure_backoff_secs),
        }
    }
}

/// `<config dir>/modwatch/settings.json`
pub fn settings_path() -> Result<PathBuf, SettingsError> {
    let dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
    Ok(dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME))
}

pub fn load_settings() -> AppSettings {
    match settings_path() {
        Ok(path) => load_settings_from(&path),
        Err(e) => {
            log::warn!("Settings: {}", e);
            AppSettings::default()
        }
    }
}

/// Read settings from `path`, falling back to defaults on any problem.
pub fn load_settings_from(path: &Path) -> AppSettings {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str::<AppSettings>(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Settings: failed to parse {:?}: {}", path, e);
                AppSettings::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppSettings::default(),
        Err(e) => {
            log::warn!("Settings: failed to read {:?}: {}", path, e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(settings: &AppSettings) -> Result<(), SettingsError> {
    save_settings_to(&settings_path()?, settings)
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SettingsError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let contents = serde_json::to_string_pretty(settings)?;

    // Write to a temp file next to the target, then rename over it, so a crash
    // mid-write never leaves a truncated settings.json behind.
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &contents).map_err(|source| SettingsError::Write {
        path: tmp_path.clone(),
        source,
    })?;

    // Windows rename fails when the destination exists.
    if cfg!(windows) && path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(SettingsError::Write {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    std::fs::rename(&tmp_path, path).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Settings: saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings_from(&dir.path().join("settings.json"));
        assert_eq!(settings, AppSettings::default());
        assert_eq!(settings.permission_cache_ttl_secs, 300);
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ definitely not json").unwrap();
        assert_eq!(load_settings_from(&path), AppSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "permission_failure_backoff_secs": 30 }"#).unwrap();

        let settings = load_settings_from(&path);
        assert_eq!(settings.permission_failure_backoff_secs, 30);
        assert_eq!(settings.permission_cache_ttl_secs, 300);
        assert_eq!(settings.condensed_max_chars, CONDENSED_MAX_CHARS);
    }

    #[test]
    fn test_save_creates_directory_and_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            permission_cache_ttl_secs: 60,
            permission_failure_backoff_secs: 10,
            condensed_max_chars: 48,
        };

        save_settings_to(&path, &settings).unwrap();

        assert_eq!(load_settings_from(&path), settings);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_resolver_config_from_settings() {
        let settings = AppSettings {
            permission_cache_ttl_secs: 120,
            permission_failure_backoff_secs: 15,
            ..AppSettings::default()
        };
        let config = settings.resolver_config();
        assert_eq!(config.ttl, Duration::from_secs(120));
        assert_eq!(config.failure_backoff, Duration::from_secs(15));
    }
}
