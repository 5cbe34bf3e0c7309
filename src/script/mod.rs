//! In-memory script document: metadata plus an ordered role list.
//!
//! Team groupings and counts are projections recomputed from the role list
//! on every call to [`Script::team_view`]; nothing derived is stored.

mod lenient;
mod role;

pub use role::{JinxRef, Role, Team};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, ScriptError};
use crate::rules::JinxLookup;

use lenient::null_default;

/// A `{name, skill}` entry of the metadata `status` list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub skill: String,
}

/// The `_meta` element. JiShi team-name overrides and the BOTC-only fields
/// are both kept regardless of the output format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptMeta {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub townsfolk: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outsider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traveler: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabled: Option<String>,
    #[serde(rename = "a jinxed", default, skip_serializing_if = "Option::is_none")]
    pub jinxed: Option<String>,
    #[serde(default, deserialize_with = "null_default", skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<StatusEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_title: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub almanac: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScriptMeta {
    /// The script's display name for a team, falling back to the English name.
    pub fn team_name(&self, team: Team) -> &str {
        let overridden = match team {
            Team::Townsfolk => self.townsfolk.as_deref(),
            Team::Outsider => self.outsider.as_deref(),
            Team::Minion => self.minion.as_deref(),
            Team::Demon => self.demon.as_deref(),
            Team::Traveler => self.traveler.as_deref(),
            Team::Fabled => self.fabled.as_deref(),
            Team::Jinxed => self.jinxed.as_deref(),
            Team::Loric => None,
        };
        overridden
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| team.display_name())
    }
}

/// Script document. Role identifiers are unique; every mutating method keeps
/// it that way.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub meta: ScriptMeta,
    roles: Vec<Role>,
}

/// Why a role was not taken over by [`Script::import_roles`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SkipCause {
    DuplicateId,
    JinxEntry,
    Rejected { message: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: Vec<(String, SkipCause)>,
}

impl Script {
    pub fn new(meta: ScriptMeta) -> Self {
        Script {
            meta,
            roles: Vec::new(),
        }
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    pub fn role(&self, id: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.id == id)
    }

    /// First non-Jinxed role with the given display name.
    pub fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| !r.is_jinx() && r.name == name)
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.role(id).is_some()
    }

    pub fn add_role(&mut self, role: Role) -> Result<()> {
        if self.contains_id(&role.id) {
            return Err(ScriptError::DuplicateId(role.id));
        }
        self.roles.push(role);
        Ok(())
    }

    pub fn remove_role(&mut self, id: &str) -> Result<Role> {
        let index = self.position(id)?;
        Ok(self.roles.remove(index))
    }

    /// Moves a role to `index`, clamped to the end of the list.
    pub fn move_role(&mut self, id: &str, index: usize) -> Result<()> {
        let from = self.position(id)?;
        let role = self.roles.remove(from);
        let to = index.min(self.roles.len());
        self.roles.insert(to, role);
        Ok(())
    }

    /// Applies `edit` to one role. The identifier may change, but not to one
    /// already used by another role.
    pub fn update_role<F>(&mut self, id: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Role),
    {
        let index = self.position(id)?;
        let mut updated = self.roles[index].clone();
        edit(&mut updated);
        if updated.id != id && self.contains_id(&updated.id) {
            return Err(ScriptError::DuplicateId(updated.id));
        }
        self.roles[index] = updated;
        Ok(())
    }

    /// Adds a role built from the template table.
    pub fn add_from_template(&mut self, lookup: &JinxLookup<'_>, template_id: &str) -> Result<()> {
        let template = lookup
            .find_template(template_id)?
            .ok_or_else(|| ScriptError::NotFound(format!("role template {template_id}")))?;
        self.add_role(template.into_role())
    }

    /// Merges another document's roles, isolating each failure. Jinx entries
    /// are left out; they are recomputed by the synchronizer.
    pub fn import_roles(&mut self, other: Script) -> ImportReport {
        let mut report = ImportReport::default();
        for role in other.roles {
            if role.is_jinx() {
                report.skipped.push((role.id, SkipCause::JinxEntry));
                continue;
            }
            let id = role.id.clone();
            match self.add_role(role) {
                Ok(()) => report.imported += 1,
                Err(ScriptError::DuplicateId(_)) => {
                    warn!(id = %id, "skipping imported role with duplicate id");
                    report.skipped.push((id, SkipCause::DuplicateId));
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "skipping imported role");
                    report.skipped.push((
                        id,
                        SkipCause::Rejected {
                            message: e.to_string(),
                        },
                    ));
                }
            }
        }
        report
    }

    pub fn team_view(&self) -> TeamView<'_> {
        let mut groups: [Vec<&Role>; 8] = Default::default();
        for role in &self.roles {
            groups[role.team.index()].push(role);
        }
        TeamView { groups }
    }

    /// Names of every non-Jinxed role, in document order.
    pub fn character_names(&self) -> impl Iterator<Item = &str> {
        self.roles
            .iter()
            .filter(|r| !r.is_jinx())
            .map(|r| r.name.as_str())
    }

    pub(crate) fn from_parts(meta: ScriptMeta, roles: Vec<Role>) -> Self {
        Script { meta, roles }
    }

    pub(crate) fn roles_mut(&mut self) -> &mut Vec<Role> {
        &mut self.roles
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.roles
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| ScriptError::NotFound(format!("role {id}")))
    }
}

/// Per-team grouping of a script's roles, in document order.
pub struct TeamView<'a> {
    groups: [Vec<&'a Role>; 8],
}

impl<'a> TeamView<'a> {
    pub fn team(&self, team: Team) -> &[&'a Role] {
        &self.groups[team.index()]
    }

    pub fn counts(&self) -> TeamCounts {
        let count = |team: Team| self.groups[team.index()].len();
        TeamCounts {
            townsfolk: count(Team::Townsfolk),
            outsider: count(Team::Outsider),
            minion: count(Team::Minion),
            demon: count(Team::Demon),
            traveler: count(Team::Traveler),
            fabled: count(Team::Fabled),
            loric: count(Team::Loric),
            jinxed: count(Team::Jinxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamCounts {
    pub townsfolk: usize,
    pub outsider: usize,
    pub minion: usize,
    pub demon: usize,
    pub traveler: usize,
    pub fabled: usize,
    pub loric: usize,
    pub jinxed: usize,
}

impl TeamCounts {
    /// Characters a player can be dealt (no Fabled, Loric or jinx entries).
    pub fn playable(&self) -> usize {
        self.townsfolk + self.outsider + self.minion + self.demon + self.traveler
    }
}
