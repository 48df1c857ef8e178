use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::controls::Selections;
use crate::error::{Result, TableroError};

/// Persisted session state: the last widget selections and where exports go.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub selections: Selections,
    #[serde(default = "default_export_dir")]
    pub export_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            selections: Selections::default(),
            export_dir: default_export_dir(),
        }
    }
}

fn default_export_dir() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Downloads")
        .to_string_lossy()
        .to_string()
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("tablero")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

/// Missing or unreadable settings fall back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str(&content) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("ignoring unreadable settings at {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| TableroError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    tracing::debug!("saved settings to {}", path.display());
    Ok(())
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(&settings_path(), settings)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("settings.json");
        let mut settings = Settings::default();
        settings.selections.theme = Theme::Dark;
        settings.selections.months = 18;
        settings.selections.region = Some("North".into());
        settings.export_dir = "/tmp/exports".into();
        save_settings_to(&path, &settings).unwrap();
        assert_eq!(load_settings_from(&path), settings);
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings_from(&dir.path().join("nope.json"));
        assert_eq!(s.selections, Selections::default());
        assert!(!s.export_dir.is_empty());
    }

    #[test]
    fn test_load_returns_defaults_when_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings_from(&path).selections, Selections::default());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"selections": {"year": 2022}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.selections.year, 2022);
        assert_eq!(s.selections.months, 12);
        assert!(!s.export_dir.is_empty());
    }

    #[test]
    fn test_shellexpand_path_plain() {
        assert_eq!(shellexpand_path("/tmp/x.csv"), "/tmp/x.csv");
    }
}
