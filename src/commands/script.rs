use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::codec::{self, Format, LoadReport};
use crate::config;
use crate::error::{Result, ScriptError};
use crate::rules::{JinxLookup, JinxRule, SqliteRuleStore};
use crate::script::{Script, ScriptMeta, TeamCounts};
use crate::sync::{self, SyncReport};
use crate::util::expand_tilde;

// ── State ───────────────────────────────────────────────────────────────────

/// The document being edited and where it came from.
#[derive(Default)]
pub struct Session {
    pub script: Script,
    pub path: Option<PathBuf>,
    pub format: Format,
}

/// Managed Tauri state. The mutex serializes edits, syncs and file I/O, so
/// the frontend never sees two mutations overlap.
pub struct EditorState {
    pub session: Arc<Mutex<Session>>,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::default())),
        }
    }
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenedScript {
    pub script: Script,
    pub format: Format,
    pub report: LoadReport,
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn rule_store() -> Result<SqliteRuleStore> {
    let path = config::load_config()
        .rule_db_path()
        .ok_or_else(|| ScriptError::Custom("Cannot find home directory".into()))?;
    Ok(SqliteRuleStore::new(path))
}

fn run_sync(script: &mut Script) -> Result<SyncReport> {
    let store = rule_store()?;
    sync::sync_all(script, &JinxLookup::new(&store))
}

/// Edits and re-syncs a copy of the document, keeping it only on success.
fn edit_and_sync<F>(script: &mut Script, edit: F) -> Result<SyncReport>
where
    F: FnOnce(&mut Script, &JinxLookup<'_>) -> Result<()>,
{
    let store = rule_store()?;
    let lookup = JinxLookup::new(&store);
    sync::apply_edit(script, &lookup, |staged| edit(staged, &lookup))
}

// ── Commands ────────────────────────────────────────────────────────────────

#[tauri::command]
pub async fn new_script(
    name: String,
    author: String,
    state: tauri::State<'_, EditorState>,
) -> Result<Script> {
    let mut session = state.session.lock().await;
    *session = Session {
        script: Script::new(ScriptMeta {
            name,
            author,
            ..Default::default()
        }),
        path: None,
        format: config::load_config().default_format,
    };
    Ok(session.script.clone())
}

/// Loads a script file, replacing the current document only on success.
#[tauri::command]
pub async fn open_script(
    path: String,
    state: tauri::State<'_, EditorState>,
) -> Result<OpenedScript> {
    let path = expand_tilde(&path);
    let loaded = codec::load_file(&path).await?;
    let format = Format::detect(&loaded.script);

    let mut session = state.session.lock().await;
    *session = Session {
        script: loaded.script,
        path: Some(path.clone()),
        format,
    };

    let mut cfg = config::load_config();
    cfg.record_recent(&path.to_string_lossy(), &session.script.meta.name);
    if let Err(e) = config::save_config(&cfg) {
        warn!(error = %e, "could not update recent scripts");
    }

    Ok(OpenedScript {
        script: session.script.clone(),
        format,
        report: loaded.report,
    })
}

/// Saves to `path` (or the path the script was opened from) in `format`
/// (or the format it was opened in).
#[tauri::command]
pub async fn save_script(
    path: Option<String>,
    format: Option<Format>,
    state: tauri::State<'_, EditorState>,
) -> Result<String> {
    let mut session = state.session.lock().await;
    let path = match path {
        Some(p) => expand_tilde(&p),
        None => session
            .path
            .clone()
            .ok_or_else(|| ScriptError::Custom("No file chosen for this script".into()))?,
    };
    let format = format.unwrap_or(session.format);

    codec::save_file(&session.script, &path, format).await?;
    session.path = Some(path.clone());
    session.format = format;
    Ok(path.to_string_lossy().to_string())
}

#[tauri::command]
pub async fn get_script(state: tauri::State<'_, EditorState>) -> Result<Script> {
    Ok(state.session.lock().await.script.clone())
}

#[tauri::command]
pub async fn sync_jinxes(state: tauri::State<'_, EditorState>) -> Result<SyncReport> {
    let mut session = state.session.lock().await;
    run_sync(&mut session.script)
}

/// Rules that apply to the current script but are not in it yet.
#[tauri::command]
pub async fn detect_jinxes(state: tauri::State<'_, EditorState>) -> Result<Vec<JinxRule>> {
    let session = state.session.lock().await;
    let store = rule_store()?;
    JinxLookup::new(&store).detect_applicable_rules(&session.script)
}

#[tauri::command]
pub async fn add_role_from_template(
    template_id: String,
    state: tauri::State<'_, EditorState>,
) -> Result<Script> {
    let mut session = state.session.lock().await;
    edit_and_sync(&mut session.script, |script, lookup| {
        script.add_from_template(lookup, &template_id)
    })?;
    Ok(session.script.clone())
}

#[tauri::command]
pub async fn remove_role(id: String, state: tauri::State<'_, EditorState>) -> Result<Script> {
    let mut session = state.session.lock().await;
    edit_and_sync(&mut session.script, |script, _| script.remove_role(&id).map(|_| ()))?;
    Ok(session.script.clone())
}

#[tauri::command]
pub async fn move_role(
    id: String,
    index: usize,
    state: tauri::State<'_, EditorState>,
) -> Result<Script> {
    let mut session = state.session.lock().await;
    session.script.move_role(&id, index)?;
    Ok(session.script.clone())
}

#[tauri::command]
pub async fn team_counts(state: tauri::State<'_, EditorState>) -> Result<TeamCounts> {
    Ok(state.session.lock().await.script.team_view().counts())
}
