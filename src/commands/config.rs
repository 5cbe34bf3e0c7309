use crate::codec::Format;
use crate::config::{self, EditorConfig};
use crate::error::Result;

#[tauri::command]
pub async fn load_config() -> EditorConfig {
    config::load_config()
}

#[tauri::command]
pub async fn save_settings(
    rule_db_path: Option<String>,
    default_format: Option<Format>,
) -> Result<EditorConfig> {
    let mut cfg = config::load_config();

    if rule_db_path.is_some() {
        cfg.rule_db_path = rule_db_path.filter(|p| !p.trim().is_empty());
    }
    if let Some(format) = default_format {
        cfg.default_format = format;
    }

    config::save_config(&cfg)?;
    Ok(cfg)
}
