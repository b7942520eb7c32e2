//! Configuration module for HackCheck-RS
//!
//! Handles loading and validating settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::Result;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

/// Global settings instance
static SETTINGS: OnceCell<Settings> = OnceCell::new();

/// Initialize global settings
pub fn init(settings: Settings) -> Result<&'static Settings> {
    SETTINGS
        .set(settings)
        .map_err(|_| anyhow::anyhow!("Settings already initialized"))?;
    get().ok_or_else(|| anyhow::anyhow!("Settings not initialized"))
}

/// Get a reference to the global settings
pub fn get() -> Option<&'static Settings> {
    SETTINGS.get()
}

/// Find the settings file to use.
///
/// An explicit path wins even when it does not exist, so the load reports it.
/// Then `HACKCHECK_SETTINGS_PATH`, then the usual locations.
pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var("HACKCHECK_SETTINGS_PATH") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let mut paths = vec![
        PathBuf::from("settings.yml"),
        PathBuf::from("config/settings.yml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("hackcheck-rs/settings.yml"));
    }
    paths.into_iter().find(|p| p.exists())
}

/// Load settings from `source`, or defaults when there is none.
/// Environment overrides are applied in every case.
///
/// Runs before logging is set up, so nothing here logs.
pub fn load(source: Option<&Path>) -> Result<Settings> {
    let mut settings = match source {
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };
    settings.merge_env();
    Ok(settings)
}
