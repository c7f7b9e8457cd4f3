//! Dispatcher configuration: loading and defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "/";

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Prefix every command line must start with. May be empty.
    pub prefix: String,
    /// Identity of the interactive console source.
    pub console: ConsoleConfig,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            console: ConsoleConfig::default(),
        }
    }
}

/// Name and permissions of the console source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub name: String,
    /// Permissions granted to the console. `"*"` grants all of them.
    pub permissions: Vec<String>,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            name: "console".to_string(),
            permissions: Vec::new(),
        }
    }
}

impl DispatcherConfig {
    /// Read and parse a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Candidate config files, highest priority first.
///
/// 1. `{working_dir}/.cmdtree/config.toml` (project-local)
/// 2. `~/.config/cmdtree/config.toml` (user-global)
pub fn config_paths(working_dir: &Path) -> Vec<PathBuf> {
    let mut paths = vec![working_dir.join(".cmdtree").join("config.toml")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("cmdtree").join("config.toml"));
    }
    paths
}

/// Load the first readable and valid config from [`config_paths`], falling
/// back to defaults. Files that exist but fail to parse are skipped.
pub fn load_config(working_dir: &Path) -> DispatcherConfig {
    config_paths(working_dir)
        .iter()
        .filter(|path| path.is_file())
        .find_map(|path| {
            DispatcherConfig::from_path(path)
                .map_err(|e| tracing::warn!("Skipping config: {e}"))
                .ok()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.prefix, "/");
        assert_eq!(config.console.name, "console");
        assert!(config.console.permissions.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: DispatcherConfig = toml::from_str("prefix = \"!\"").unwrap();
        assert_eq!(config.prefix, "!");
        assert_eq!(config.console, ConsoleConfig::default());

        let config: DispatcherConfig =
            toml::from_str("[console]\npermissions = [\"admin\"]").unwrap();
        assert_eq!(config.prefix, "/");
        assert_eq!(config.console.name, "console");
        assert_eq!(config.console.permissions, vec!["admin"]);
    }

    #[test]
    fn test_load_project_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join(".cmdtree");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.toml"),
            "prefix = \"#\"\n\n[console]\nname = \"ops\"\npermissions = [\"*\"]\n",
        )
        .unwrap();

        let config = load_config(tmp.path());
        assert_eq!(config.prefix, "#");
        assert_eq!(config.console.name, "ops");
        assert_eq!(config.console.permissions, vec!["*"]);
    }

    #[test]
    fn test_from_path_reports_parse_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "prefix = [").unwrap();

        let err = DispatcherConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = DispatcherConfig::from_path(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_config_paths_order() {
        let paths = config_paths(Path::new("/work"));
        assert_eq!(paths[0], Path::new("/work/.cmdtree/config.toml"));
    }
}
