use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use sysdesc_export::ExportOptions;

pub const DEFAULT_STORE: &str = "~/.local/share/sysdesc";

/// Contents of `~/.config/sysdesc/config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding one sub-directory per description.
    pub store: Option<String>,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    pub description_url: Option<String>,
    pub extra_excludes: Vec<String>,
}

impl Config {
    /// Load `~/.config/sysdesc/config.toml`, falling back to defaults when
    /// it does not exist.
    pub fn load_default() -> Result<Self, String> {
        match default_config_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    /// Store directory: `flag`, else the config file, else the default.
    pub fn store_path(&self, flag: Option<&str>) -> PathBuf {
        let raw = flag
            .or(self.store.as_deref())
            .unwrap_or(DEFAULT_STORE);
        expand_tilde(raw)
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            description_url: self.export.description_url.clone(),
            extra_excludes: self.export.extra_excludes.clone(),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var("HOME").ok()?;
    Some(PathBuf::from(home).join(".config/sysdesc/config.toml"))
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
