//! Reading and writing script files in the JiShi and BOTC JSON formats.
//!
//! Both formats are a single JSON array whose `_meta` element carries the
//! metadata. They differ in two places: JiShi writes `image` as a bare string
//! and keeps jinxes as standalone `"a jinxed"` entries, while BOTC writes
//! `image` as a list and embeds jinxes on each role.

mod jinx_name;

pub use jinx_name::{counterpart, jinx_name, parse_jinx_name, JINX_SEPARATORS};

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{Result, ScriptError};
use crate::script::{Role, Script, ScriptMeta};

pub const META_ID: &str = "_meta";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    JiShi,
    Botc,
}

impl Format {
    /// Best guess at which format a loaded document came from: embedded jinx
    /// lists or BOTC-only metadata mean BOTC, anything else is treated as JiShi.
    pub fn detect(script: &Script) -> Format {
        let meta = &script.meta;
        let botc_meta =
            meta.hide_title.is_some() || meta.background.is_some() || meta.almanac.is_some();
        let embedded = script.roles().iter().any(|r| r.jinxes.is_some());
        let multi_image = script.roles().iter().any(|r| r.image.len() > 1);
        if botc_meta || embedded || multi_image {
            Format::Botc
        } else {
            Format::JiShi
        }
    }
}

impl FromStr for Format {
    type Err = ScriptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jishi" => Ok(Format::JiShi),
            "botc" => Ok(Format::Botc),
            other => Err(ScriptError::Format(format!("unknown script format `{other}`"))),
        }
    }
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Format::JiShi => "jishi",
            Format::Botc => "botc",
        })
    }
}

// ── Load ────────────────────────────────────────────────────────────────────

/// Why an element of the input array did not make it into the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DropCause {
    Malformed { message: String },
    DuplicateId,
    UnparseableJinx,
    DanglingJinx { missing: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedEntry {
    pub index: usize,
    pub id: Option<String>,
    pub cause: DropCause,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    pub kept: usize,
    pub dropped: Vec<DroppedEntry>,
}

#[derive(Clone, Debug)]
pub struct Loaded {
    pub script: Script,
    pub report: LoadReport,
}

/// Parses a script document from raw JSON bytes.
///
/// Only a non-array top level (or unreadable `_meta`) is fatal. Individual
/// entries that cannot be used are dropped, logged, and listed in the report.
pub fn parse_script(bytes: &[u8]) -> Result<Loaded> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| ScriptError::Format(format!("invalid JSON: {e}")))?;
    let Value::Array(elements) = value else {
        return Err(ScriptError::Format(
            "top-level value must be a JSON array".into(),
        ));
    };

    let mut meta: Option<ScriptMeta> = None;
    let mut report = LoadReport::default();
    let mut candidates: Vec<(usize, Role)> = Vec::with_capacity(elements.len());
    let mut seen_ids: HashSet<String> = HashSet::new();

    for (index, element) in elements.into_iter().enumerate() {
        let id = element.get("id").and_then(Value::as_str).map(str::to_string);

        if id.as_deref() == Some(META_ID) && meta.is_none() {
            meta = Some(parse_meta(element)?);
            continue;
        }

        let mut role = match serde_json::from_value::<Role>(element) {
            Ok(role) => role,
            Err(e) => {
                warn!(index, id = ?id, error = %e, "dropping malformed script entry");
                report.dropped.push(DroppedEntry {
                    index,
                    id,
                    cause: DropCause::Malformed {
                        message: e.to_string(),
                    },
                });
                continue;
            }
        };

        if role.id == META_ID || !seen_ids.insert(role.id.clone()) {
            warn!(index, id = %role.id, "dropping entry with duplicate id");
            report.dropped.push(DroppedEntry {
                index,
                id: Some(role.id),
                cause: DropCause::DuplicateId,
            });
            continue;
        }

        if role.jinxes.as_ref().is_some_and(Vec::is_empty) {
            role.jinxes = None;
        }
        candidates.push((index, role));
    }

    let names: HashSet<String> = candidates
        .iter()
        .filter(|(_, r)| !r.is_jinx())
        .map(|(_, r)| r.name.clone())
        .collect();

    let mut roles = Vec::with_capacity(candidates.len());
    for (index, mut role) in candidates {
        if role.is_jinx() {
            if let Err(cause) = canonicalize_jinx(&mut role, &names) {
                warn!(index, id = %role.id, name = %role.name, cause = ?cause, "dropping jinx entry");
                report.dropped.push(DroppedEntry {
                    index,
                    id: Some(role.id),
                    cause,
                });
                continue;
            }
        }
        roles.push(role);
    }

    report.kept = roles.len();
    Ok(Loaded {
        script: Script::from_parts(meta.unwrap_or_default(), roles),
        report,
    })
}

fn parse_meta(element: Value) -> Result<ScriptMeta> {
    let mut fields = match element {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    fields.remove("id");
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ScriptError::Format(format!("invalid _meta entry: {e}")))
}

/// Rewrites a jinx entry's name to `"Left&Right"`, or reports why it must go.
fn canonicalize_jinx(role: &mut Role, names: &HashSet<String>) -> std::result::Result<(), DropCause> {
    let (left, right) = parse_jinx_name(&role.name).ok_or(DropCause::UnparseableJinx)?;
    for side in [left, right] {
        if !names.contains(side) {
            return Err(DropCause::DanglingJinx {
                missing: side.to_string(),
            });
        }
    }
    role.name = jinx_name(left, right);
    Ok(())
}

/// Reads and parses a script file. Failures are wrapped with the path.
pub async fn load_file(path: &Path) -> Result<Loaded> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        let cause = if e.kind() == std::io::ErrorKind::NotFound {
            ScriptError::NotFound(path.display().to_string())
        } else {
            ScriptError::Io(e)
        };
        ScriptError::load(path, cause)
    })?;
    let loaded = parse_script(&bytes).map_err(|e| ScriptError::load(path, e))?;
    info!(
        path = %path.display(),
        roles = loaded.report.kept,
        dropped = loaded.report.dropped.len(),
        "loaded script"
    );
    Ok(loaded)
}

// ── Save ────────────────────────────────────────────────────────────────────

/// Serializes a document into the given format as pretty-printed JSON.
pub fn render_script(script: &Script, format: Format) -> Result<Vec<u8>> {
    let mut elements = Vec::with_capacity(script.len() + 1);

    let mut meta = Map::new();
    meta.insert("id".into(), Value::String(META_ID.into()));
    if let Value::Object(fields) = serde_json::to_value(&script.meta)? {
        meta.extend(fields);
    }
    elements.push(Value::Object(meta));

    for role in script.roles() {
        let mut value = serde_json::to_value(role)?;
        if format == Format::JiShi {
            if let Value::Object(fields) = &mut value {
                to_jishi_shape(fields);
            }
        }
        elements.push(value);
    }

    Ok(serde_json::to_vec_pretty(&Value::Array(elements))?)
}

/// JiShi keeps a single image as a bare string and has no embedded jinxes.
fn to_jishi_shape(fields: &mut Map<String, Value>) {
    let first = match fields.get("image") {
        Some(Value::Array(urls)) => Some(urls.first().cloned()),
        _ => None,
    };
    match first {
        Some(Some(url)) => {
            fields.insert("image".into(), url);
        }
        Some(None) => {
            fields.shift_remove("image");
        }
        None => {}
    }
    fields.shift_remove("jinxes");
}

/// Writes the document to `path`. The write is direct, not atomic.
pub async fn save_file(script: &Script, path: &Path, format: Format) -> Result<()> {
    let bytes = render_script(script, format).map_err(|e| ScriptError::save(path, e))?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ScriptError::save(path, ScriptError::Io(e)))?;
    info!(path = %path.display(), format = %format, roles = script.len(), "saved script");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::{JinxRef, Team};
    use serde_json::json;

    fn bytes(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    fn jishi_sample() -> Value {
        json!([
            {
                "id": "_meta",
                "name": "暗流涌动",
                "author": "someone",
                "townsfolk": "镇民",
                "status": [{"name": "醉酒", "skill": "你的能力失效"}]
            },
            {"id": "fanggu", "name": "方古", "team": "demon", "ability": "...", "image": "http://x/fg.png",
             "setup": true, "firstNight": 0, "otherNight": 40, "reminders": ["死亡"], "remindersGlobal": []},
            {"id": "scarletwoman", "name": "紅唇女郎", "team": "minion", "ability": "...", "image": "http://x/sw.png",
             "setup": false, "firstNight": 0, "otherNight": 20, "reminders": [], "remindersGlobal": []},
            {"id": "j_fg_sw", "name": "方古 + 紅唇女郎", "team": "a jinxed", "ability": "rule text"},
            {"id": "j_bad", "name": "方古&鬼魂", "team": "a jinxed", "ability": "dangling"},
            {"id": "j_worse", "name": "nothing here", "team": "a jinxed", "ability": "?"}
        ])
    }

    #[test]
    fn test_rejects_non_array() {
        let err = parse_script(br#"{"id": "_meta"}"#).unwrap_err();
        assert!(matches!(err, ScriptError::Format(_)));
        let err = parse_script(b"not json").unwrap_err();
        assert!(matches!(err, ScriptError::Format(_)));
    }

    #[test]
    fn test_load_jishi_document() {
        let loaded = parse_script(&bytes(jishi_sample())).unwrap();
        let script = &loaded.script;

        assert_eq!(script.meta.name, "暗流涌动");
        assert_eq!(script.meta.townsfolk.as_deref(), Some("镇民"));
        assert_eq!(script.meta.status.len(), 1);
        assert_eq!(script.len(), 3);
        assert_eq!(loaded.report.kept, 3);

        let jinx = script.role("j_fg_sw").unwrap();
        assert_eq!(jinx.name, "方古&紅唇女郎");
        assert_eq!(script.role("fanggu").unwrap().image, vec!["http://x/fg.png"]);

        let causes: Vec<_> = loaded.report.dropped.iter().map(|d| d.cause.clone()).collect();
        assert_eq!(
            causes,
            vec![
                DropCause::DanglingJinx {
                    missing: "鬼魂".into()
                },
                DropCause::UnparseableJinx,
            ]
        );
    }

    #[test]
    fn test_dangling_jinx_dropped() {
        let doc = json!([
            {"id": "x", "name": "X", "team": "townsfolk"},
            {"id": "xy", "name": "X&Y", "team": "a jinxed", "ability": "?"}
        ]);
        let loaded = parse_script(&bytes(doc)).unwrap();
        assert_eq!(loaded.script.len(), 1);
        assert!(loaded.script.role("xy").is_none());
    }

    #[test]
    fn test_three_part_name_splits_once() {
        let doc = json!([
            {"id": "a", "name": "A", "team": "townsfolk"},
            {"id": "bc", "name": "B-C", "team": "minion"},
            {"id": "j", "name": "A-B-C", "team": "a jinxed"}
        ]);
        let loaded = parse_script(&bytes(doc)).unwrap();
        assert_eq!(loaded.script.role("j").unwrap().name, "A&B-C");
    }

    #[test]
    fn test_malformed_and_duplicate_entries_isolated() {
        let doc = json!([
            {"id": "a", "name": "A", "team": "townsfolk"},
            {"id": "a", "name": "A again", "team": "townsfolk"},
            {"name": "no id", "team": "townsfolk"},
            {"id": "b", "name": "B", "team": "villager"},
            "washerwoman",
            {"id": "c", "name": "C", "team": "outsider"}
        ]);
        let loaded = parse_script(&bytes(doc)).unwrap();
        assert_eq!(loaded.script.len(), 2);
        assert_eq!(loaded.report.dropped.len(), 4);
        assert_eq!(loaded.report.dropped[0].cause, DropCause::DuplicateId);
        assert_eq!(loaded.report.dropped[2].id.as_deref(), Some("b"));
        assert!(loaded.script.meta.name.is_empty());
    }

    #[test]
    fn test_image_array_kept() {
        let doc = json!([{"id": "a", "name": "A", "team": "fabled", "image": ["a", "b"]}]);
        let loaded = parse_script(&bytes(doc)).unwrap();
        assert_eq!(loaded.script.role("a").unwrap().image, vec!["a", "b"]);
        assert_eq!(loaded.script.role("a").unwrap().team, Team::Fabled);
    }

    #[test]
    fn test_jishi_output_flattens_image() {
        let mut script = Script::default();
        let mut one = Role::new("one", "One", Team::Townsfolk);
        one.image = vec!["http://x/a.png".into(), "http://x/b.png".into()];
        one.jinxes = Some(vec![JinxRef {
            id: "none".into(),
            reason: "r".into(),
        }]);
        script.add_role(one).unwrap();
        script.add_role(Role::new("two", "Two", Team::Minion)).unwrap();

        let out: Value = serde_json::from_slice(&render_script(&script, Format::JiShi).unwrap()).unwrap();
        assert_eq!(out[0]["id"], "_meta");
        assert_eq!(out[1]["image"], json!("http://x/a.png"));
        assert!(out[1].get("jinxes").is_none());
        assert!(out[2].get("image").is_none());

        let out: Value = serde_json::from_slice(&render_script(&script, Format::Botc).unwrap()).unwrap();
        assert_eq!(out[1]["image"], json!(["http://x/a.png", "http://x/b.png"]));
        assert_eq!(out[1]["jinxes"][0]["reason"], "r");
    }

    #[test]
    fn test_meta_passthrough_in_both_formats() {
        let doc = json!([
            {"id": "_meta", "name": "S", "author": "A", "hideTitle": true, "almanac": "http://a",
             "minion": "爪牙", "status": [{"name": "n", "skill": "s"}], "bootlegger": ["x"]}
        ]);
        let script = parse_script(&bytes(doc)).unwrap().script;
        for format in [Format::JiShi, Format::Botc] {
            let out: Value = serde_json::from_slice(&render_script(&script, format).unwrap()).unwrap();
            assert_eq!(out[0]["hideTitle"], json!(true));
            assert_eq!(out[0]["minion"], "爪牙");
            assert_eq!(out[0]["status"][0]["skill"], "s");
            assert_eq!(out[0]["bootlegger"], json!(["x"]));
        }
    }

    #[test]
    fn test_jishi_round_trip() {
        let first = parse_script(&bytes(jishi_sample())).unwrap().script;
        let rendered = render_script(&first, Format::JiShi).unwrap();
        let second = parse_script(&rendered).unwrap();
        assert!(second.report.dropped.is_empty());
        assert_eq!(second.script, first);
    }

    #[test]
    fn test_format_parse_and_detect() {
        assert_eq!("BOTC".parse::<Format>().unwrap(), Format::Botc);
        assert_eq!("jishi".parse::<Format>().unwrap(), Format::JiShi);
        assert!("xml".parse::<Format>().is_err());

        let script = parse_script(&bytes(jishi_sample())).unwrap().script;
        assert_eq!(Format::detect(&script), Format::JiShi);
        let mut botc = script.clone();
        botc.meta.background = Some("http://bg".into());
        assert_eq!(Format::detect(&botc), Format::Botc);
    }

    #[tokio::test]
    async fn test_file_errors_are_wrapped() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = load_file(&missing).await.unwrap_err();
        assert!(matches!(err, ScriptError::Load { .. }));
        assert!(matches!(err.root(), ScriptError::NotFound(_)));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{}").unwrap();
        let err = load_file(&bad).await.unwrap_err();
        assert!(matches!(err.root(), ScriptError::Format(_)));

        let unwritable = dir.path().join("no-such-dir").join("out.json");
        let err = save_file(&Script::default(), &unwritable, Format::JiShi)
            .await
            .unwrap_err();
        assert!(matches!(err, ScriptError::Save { .. }));
        assert!(matches!(err.root(), ScriptError::Io(_)));
    }
}
