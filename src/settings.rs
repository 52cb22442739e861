use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SleuthError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_export_dir_string")]
    pub export_dir: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub analyst_name: String,
    /// External narrative agent; `None` keeps everything offline.
    #[serde(default)]
    pub agent_command: Option<String>,
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_export_dir_string() -> String {
    default_export_dir().to_string_lossy().to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            export_dir: default_export_dir_string(),
            delimiter: default_delimiter(),
            analyst_name: String::new(),
            agent_command: None,
        }
    }
}

impl Settings {
    /// The delimiter as the single byte the parser splits on.
    pub fn delimiter_byte(&self) -> Result<u8> {
        let raw = match self.delimiter.as_str() {
            "\\t" | "tab" => "\t",
            other => other,
        };
        match raw.as_bytes() {
            [b] => Ok(*b),
            _ => Err(SleuthError::Settings(format!(
                "delimiter must be a single ASCII character, got '{}'",
                self.delimiter
            ))),
        }
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(&self.export_dir)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sleuth")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_export_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("sleuth")
        .join("exports")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing files give defaults; unreadable ones are logged and ignored.
pub fn load_settings_from(path: &Path) -> Settings {
    if path.exists() {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {e}");
            Settings::default()
        })
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    save_settings_to(settings, &settings_path())
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SleuthError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}
