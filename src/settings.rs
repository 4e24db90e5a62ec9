use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory scanned for bank exports.
    pub data_dir: String,
    /// Directory holding the category mapping documents.
    pub mapping_dir: String,
    /// Where `summary.json` and `details.json` are written.
    pub output_dir: String,
    /// Category marking money moved between the user's own accounts.
    pub transfer_category: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            mapping_dir: "mapping".to_string(),
            output_dir: ".".to_string(),
            transfer_category: "Transfer".to_string(),
        }
    }
}

impl Settings {
    pub fn data_path(&self) -> PathBuf {
        expand_path(&self.data_dir)
    }

    pub fn mapping_path(&self) -> PathBuf {
        expand_path(&self.mapping_dir)
    }

    pub fn output_path(&self) -> PathBuf {
        expand_path(&self.output_dir)
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("spendsort")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

pub fn load_settings() -> Settings {
    load_settings_from(&settings_path())
}

/// Missing file means defaults. An unreadable or malformed file is logged
/// and also falls back to defaults.
pub fn load_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
    match parsed {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Ignoring settings in {}: {e}", path.display());
            Settings::default()
        }
    }
}

/// Expand a leading `~` to the home directory. Relative paths stay
/// relative to the working directory.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest.trim_start_matches('/'));
        }
    }
    PathBuf::from(path)
}
