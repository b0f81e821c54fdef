use log::{ debug, warn };
use serde_json::{ Map, Value as JsonValue };
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{ Arc, Mutex };
use thiserror::Error;

pub const DARK_MODE_KEY: &str = "darkMode";

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("Preference file IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Preference file is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
}

/// String key-value storage for display preferences.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Keeps preferences as a flat JSON object on disk. A missing file reads as empty.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Map<String, JsonValue>, PreferenceError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        let all = self.read_all()?;
        Ok(all.get(key).and_then(|v| v.as_str()).map(|s| s.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut all = self.read_all()?;
        all.insert(key.to_string(), JsonValue::String(value.to_string()));
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        debug!("Wrote preference {}={} to {}", key, value, self.path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    fn stored_value(&self) -> &'static str {
        match self {
            Theme::Dark => "enabled",
            Theme::Light => "disabled",
        }
    }

    fn from_stored(value: Option<&str>) -> Self {
        match value {
            Some("enabled") => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

/// Light/dark display preference, loaded once and written through on change.
#[derive(Clone)]
pub struct DisplaySettings {
    store: Arc<dyn PreferenceStore>,
    theme: Theme,
}

impl DisplaySettings {
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let theme = match store.get(DARK_MODE_KEY) {
            Ok(value) => Theme::from_stored(value.as_deref()),
            Err(e) => {
                warn!("Could not read display preference, using light theme: {}", e);
                Theme::Light
            }
        };
        Self { store, theme }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) -> Result<(), PreferenceError> {
        self.store.set(DARK_MODE_KEY, theme.stored_value())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Theme, PreferenceError> {
        let next = match self.theme {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set_theme(next)?;
        Ok(next)
    }
}
