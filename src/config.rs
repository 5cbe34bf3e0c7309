use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::Format;
use crate::error::{Result, ScriptError};
use crate::util::{app_dir, expand_tilde};

const MAX_RECENT: usize = 10;

/// Overrides the configured rule database path.
pub const RULE_DB_ENV: &str = "GRIMOIRE_RULE_DB";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentScript {
    pub path: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_db_path: Option<String>,
    #[serde(default)]
    pub default_format: Format,
    #[serde(default)]
    pub recent_scripts: Vec<RecentScript>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_opened: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            version: 1,
            rule_db_path: None,
            default_format: Format::JiShi,
            recent_scripts: vec![],
            last_opened: None,
        }
    }
}

impl EditorConfig {
    /// Moves `path` to the front of the recent list.
    pub fn record_recent(&mut self, path: &str, name: &str) {
        self.recent_scripts.retain(|entry| entry.path != path);
        self.recent_scripts.insert(
            0,
            RecentScript {
                path: path.to_string(),
                name: name.to_string(),
            },
        );
        self.recent_scripts.truncate(MAX_RECENT);
        self.last_opened = Some(path.to_string());
    }

    /// Rule database location: `$GRIMOIRE_RULE_DB`, then the configured
    /// path, then `~/.grimoire/rules.db`.
    pub fn rule_db_path(&self) -> Option<PathBuf> {
        if let Some(env) = std::env::var(RULE_DB_ENV).ok().filter(|v| !v.trim().is_empty()) {
            return Some(expand_tilde(&env));
        }
        match &self.rule_db_path {
            Some(path) if !path.trim().is_empty() => Some(expand_tilde(path)),
            _ => app_dir().map(|dir| dir.join("rules.db")),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|dir| dir.join("config.json"))
}

/// Loads the user's config, falling back to defaults when it is missing or
/// unreadable.
pub fn load_config() -> EditorConfig {
    config_path()
        .and_then(|path| load_config_from(&path).ok())
        .unwrap_or_default()
}

pub fn load_config_from(path: &Path) -> Result<EditorConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScriptError::NotFound(path.display().to_string())
        } else {
            ScriptError::Io(e)
        }
    })?;
    serde_json::from_str(&content).map_err(|e| ScriptError::Format(e.to_string()))
}

pub fn save_config(config: &EditorConfig) -> Result<()> {
    let path =
        config_path().ok_or_else(|| ScriptError::Custom("Cannot find home directory".into()))?;
    save_config_to(config, &path)
}

pub fn save_config_to(config: &EditorConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = EditorConfig {
            default_format: Format::Botc,
            rule_db_path: Some("/data/rules.db".into()),
            ..Default::default()
        };
        config.record_recent("/s/tb.json", "Trouble Brewing");
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded, config);
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"defaultFormat\": \"botc\""));
    }

    #[test]
    fn test_missing_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"version": 1}"#).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.default_format, Format::JiShi);
        assert!(loaded.recent_scripts.is_empty());

        let err = load_config_from(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[test]
    fn test_recent_is_deduplicated_and_capped() {
        let mut config = EditorConfig::default();
        for i in 0..12 {
            config.record_recent(&format!("/s/{i}.json"), "s");
        }
        config.record_recent("/s/5.json", "again");
        assert_eq!(config.recent_scripts.len(), MAX_RECENT);
        assert_eq!(config.recent_scripts[0].name, "again");
        assert_eq!(
            config
                .recent_scripts
                .iter()
                .filter(|r| r.path == "/s/5.json")
                .count(),
            1
        );
        assert_eq!(config.last_opened.as_deref(), Some("/s/5.json"));
    }

    #[test]
    fn test_configured_rule_db_path() {
        let config = EditorConfig {
            rule_db_path: Some("/data/rules.db".into()),
            ..Default::default()
        };
        if std::env::var(RULE_DB_ENV).is_err() {
            assert_eq!(config.rule_db_path(), Some(PathBuf::from("/data/rules.db")));
        }
    }
}
