use serde::Serialize;
use std::path::PathBuf;

/// All errors that can occur while loading, editing, syncing or saving a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Rule store error: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Duplicate role id: {0}")]
    DuplicateId(String),

    #[error("Failed to load {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: Box<ScriptError>,
    },

    #[error("Failed to save {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: Box<ScriptError>,
    },

    #[error("{0}")]
    Custom(String),
}

impl ScriptError {
    pub(crate) fn load(path: impl Into<PathBuf>, source: ScriptError) -> Self {
        ScriptError::Load {
            path: path.into(),
            source: Box::new(source),
        }
    }

    pub(crate) fn save(path: impl Into<PathBuf>, source: ScriptError) -> Self {
        ScriptError::Save {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// The innermost cause, looking through `Load`/`Save` wrappers.
    pub fn root(&self) -> &ScriptError {
        match self {
            ScriptError::Load { source, .. } | ScriptError::Save { source, .. } => source.root(),
            other => other,
        }
    }
}

// Tauri requires error types to implement Serialize for IPC transport.
impl Serialize for ScriptError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;
