use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::lenient::{image_list, night_order, null_default};

/// Team a role belongs to. `Jinxed` is the pseudo-team used for standalone
/// jinx entries; `Loric` is recognised but has no special handling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Team {
    Townsfolk,
    Outsider,
    Minion,
    Demon,
    Traveler,
    Fabled,
    Loric,
    Jinxed,
}

impl Team {
    pub const ALL: [Team; 8] = [
        Team::Townsfolk,
        Team::Outsider,
        Team::Minion,
        Team::Demon,
        Team::Traveler,
        Team::Fabled,
        Team::Loric,
        Team::Jinxed,
    ];

    /// Token written to the `team` field of a role object.
    pub fn wire_token(self) -> &'static str {
        match self {
            Team::Townsfolk => "townsfolk",
            Team::Outsider => "outsider",
            Team::Minion => "minion",
            Team::Demon => "demon",
            Team::Traveler => "traveler",
            Team::Fabled => "fabled",
            Team::Loric => "loric",
            Team::Jinxed => "a jinxed",
        }
    }

    /// Parses a wire token, case-insensitively, with the common aliases.
    pub fn from_token(token: &str) -> Option<Team> {
        match token.trim().to_lowercase().as_str() {
            "townsfolk" => Some(Team::Townsfolk),
            "outsider" => Some(Team::Outsider),
            "minion" => Some(Team::Minion),
            "demon" => Some(Team::Demon),
            "traveler" | "traveller" => Some(Team::Traveler),
            "fabled" => Some(Team::Fabled),
            "loric" => Some(Team::Loric),
            "a jinxed" | "jinxed" => Some(Team::Jinxed),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Team::Townsfolk => "Townsfolk",
            Team::Outsider => "Outsider",
            Team::Minion => "Minion",
            Team::Demon => "Demon",
            Team::Traveler => "Traveler",
            Team::Fabled => "Fabled",
            Team::Loric => "Loric",
            Team::Jinxed => "Jinxed",
        }
    }

    pub fn is_jinxed(self) -> bool {
        self == Team::Jinxed
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl Serialize for Team {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.wire_token())
    }
}

impl<'de> Deserialize<'de> for Team {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Team::from_token(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown team `{raw}`")))
    }
}

/// An embedded jinx reference (BOTC shape): the other role's id and the rule text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JinxRef {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub reason: String,
}

/// A single character entry of a script.
///
/// `image` is always a list in memory; the codec flattens it for JiShi output.
/// `jinxes` is owned by the synchronizer: `None` means "no jinxes" (or not yet
/// computed) and is never stored as an empty list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    pub team: Team,
    #[serde(default, deserialize_with = "null_default")]
    pub ability: String,
    #[serde(
        default,
        deserialize_with = "image_list",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub image: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub setup: bool,
    #[serde(default, with = "night_order")]
    pub first_night: f64,
    #[serde(default, with = "night_order")]
    pub other_night: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub reminders: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub reminders_global: Vec<String>,
    #[serde(rename = "name_eng", default, skip_serializing_if = "Option::is_none")]
    pub name_eng: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_night_reminder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_night_reminder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jinxes: Option<Vec<JinxRef>>,
    /// Fields this editor does not model, carried through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>, team: Team) -> Self {
        Role {
            id: id.into(),
            name: name.into(),
            team,
            ability: String::new(),
            image: Vec::new(),
            edition: None,
            setup: false,
            first_night: 0.0,
            other_night: 0.0,
            reminders: Vec::new(),
            reminders_global: Vec::new(),
            name_eng: None,
            flavor: None,
            first_night_reminder: None,
            other_night_reminder: None,
            jinxes: None,
            extra: Map::new(),
        }
    }

    pub fn with_ability(mut self, ability: impl Into<String>) -> Self {
        self.ability = ability.into();
        self
    }

    pub fn is_jinx(&self) -> bool {
        self.team.is_jinxed()
    }

    /// 0 means the role does not act on the first night.
    pub fn acts_first_night(&self) -> bool {
        self.first_night != 0.0
    }

    pub fn acts_other_nights(&self) -> bool {
        self.other_night != 0.0
    }
}
