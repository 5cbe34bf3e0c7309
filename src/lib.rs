//! Script editing core for Blood on the Clocktower style games.
//!
//! Scripts are loaded from and saved to the JiShi and BOTC JSON formats
//! ([`codec`]), edited in memory ([`script`]), and kept consistent with a
//! store of known jinx rules ([`rules`], [`sync`]).

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod rules;
pub mod script;
pub mod sync;
pub mod util;

#[cfg(feature = "desktop")]
mod commands;

pub use codec::{Format, LoadReport, Loaded};
pub use error::{Result, ScriptError};
pub use rules::{JinxLookup, JinxRule, RoleTemplate, RuleStore};
pub use script::{JinxRef, Role, Script, ScriptMeta, Team};
pub use sync::SyncReport;

#[cfg(feature = "desktop")]
pub fn run() {
    logging::init_tracing(1);

    tauri::Builder::default()
        .plugin(tauri_plugin_dialog::init())
        .plugin(tauri_plugin_fs::init())
        .manage(commands::script::EditorState::default())
        .invoke_handler(tauri::generate_handler![
            commands::script::new_script,
            commands::script::open_script,
            commands::script::save_script,
            commands::script::get_script,
            commands::script::sync_jinxes,
            commands::script::detect_jinxes,
            commands::script::add_role_from_template,
            commands::script::remove_role,
            commands::script::move_role,
            commands::script::team_counts,
            commands::config::load_config,
            commands::config::save_settings,
        ])
        .run(tauri::generate_context!())
        .expect("failed to run Grimoire");
}
