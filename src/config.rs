use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::editor::EditorConfig;
use crate::error::ConfigError;

/// Runtime settings for the binaries.
///
/// Every field has a default, so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the unsaved-change files.
    pub storage_dir: PathBuf,
    /// Directory holding `<sheet_id>.csv` files.
    pub data_dir: PathBuf,
    pub bind_addr: String,
    pub project_name: String,
    pub privileged_roles: Vec<String>,
    pub default_sheet: String,
}

impl Default for Config {
    fn default() -> Self {
        let editor = EditorConfig::default();
        Config {
            storage_dir: PathBuf::from(".inventory"),
            data_dir: PathBuf::from("data"),
            bind_addr: "0.0.0.0:8000".to_string(),
            project_name: editor.project_name,
            privileged_roles: editor.privileged_roles,
            default_sheet: "inventory".to_string(),
        }
    }
}

impl Config {
    /// Reads a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&text)?;
        info!("loaded config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Defaults (or the file named by `INVENTORY_CONFIG`), then any
    /// `INVENTORY_*` variables on top.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = match env::var("INVENTORY_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Config::load(path.trim())?,
            _ => Config::default(),
        };
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("INVENTORY_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("INVENTORY_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("INVENTORY_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("INVENTORY_PROJECT_NAME") {
            self.project_name = v;
        }
        if let Some(v) = lookup("INVENTORY_PRIVILEGED_ROLES") {
            self.privileged_roles = v
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
        }
        if let Some(v) = lookup("INVENTORY_DEFAULT_SHEET") {
            self.default_sheet = v;
        }
    }

    pub fn editor_config(&self) -> EditorConfig {
        EditorConfig {
            project_name: self.project_name.clone(),
            privileged_roles: self.privileged_roles.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"project_name": "Project Atlas"}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.project_name, "Project Atlas");
        assert_eq!(config.privileged_roles, vec!["admin".to_string()]);
        assert_eq!(config.default_sheet, "inventory");
    }

    #[test]
    fn bad_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Json(_))));
    }

    #[test]
    fn overrides() {
        let vars: HashMap<&str, &str> = [
            ("INVENTORY_BIND_ADDR", "127.0.0.1:9000"),
            ("INVENTORY_PRIVILEGED_ROLES", "admin, manager,"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.privileged_roles, vec!["admin", "manager"]);
        assert_eq!(config.editor_config().privileged_roles.len(), 2);
    }
}
