//! Known jinx rules and role templates, read from an external store.
//!
//! The store is a capability: anything that can answer a [`RuleQuery`] or a
//! [`TemplateQuery`]. [`JinxLookup`] layers the name matching the editor
//! needs on top of it and does no caching of its own.

mod memory;
mod sqlite;

pub use memory::MemoryRuleStore;
pub use sqlite::SqliteRuleStore;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::{counterpart, jinx_name, parse_jinx_name};
use crate::error::Result;
use crate::script::{Role, Script, Team};

/// A stored jinx rule. `name` is the compound `"RoleA&RoleB"` form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JinxRule {
    pub id: String,
    pub name: String,
    pub ability: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl JinxRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, ability: impl Into<String>) -> Self {
        JinxRule {
            id: id.into(),
            name: name.into(),
            ability: ability.into(),
            image: None,
        }
    }

    /// The two role names the rule joins, if its name parses.
    pub fn role_names(&self) -> Option<(&str, &str)> {
        parse_jinx_name(&self.name)
    }

    /// Whether `name` is exactly one side of this rule.
    pub fn mentions(&self, name: &str) -> bool {
        self.role_names()
            .map(|(left, right)| left == name || right == name)
            .unwrap_or(false)
    }

    /// The standalone `Jinxed` entry used by the JiShi format.
    /// The name is written in canonical `"Left&Right"` form.
    pub fn to_role(&self) -> Role {
        let name = match self.role_names() {
            Some((left, right)) => jinx_name(left, right),
            None => self.name.clone(),
        };
        let mut role = Role::new(self.id.clone(), name, Team::Jinxed)
            .with_ability(self.ability.clone());
        role.image = self.image.iter().cloned().collect();
        role
    }
}

/// A stored role template that can be added to a script.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleTemplate {
    pub id: String,
    pub name: String,
    pub team: Team,
    pub ability: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub edition: Option<String>,
    pub setup: bool,
    pub first_night: f64,
    pub other_night: f64,
    #[serde(default)]
    pub reminders: Vec<String>,
    #[serde(default)]
    pub reminders_global: Vec<String>,
}

impl RoleTemplate {
    pub fn into_role(self) -> Role {
        let mut role = Role::new(self.id, self.name, self.team).with_ability(self.ability);
        role.image = self.image.into_iter().collect();
        role.edition = self.edition;
        role.setup = self.setup;
        role.first_night = self.first_night;
        role.other_night = self.other_night;
        role.reminders = self.reminders;
        role.reminders_global = self.reminders_global;
        role
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleQuery {
    All,
    ById(String),
    /// Rules whose compound name contains the text anywhere. Callers refine
    /// the result with exact side matching.
    NameContains(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TemplateQuery {
    All,
    ById(String),
    ByName(String),
    ByTeam(Team),
}

/// Read access to the rule and template tables.
pub trait RuleStore {
    fn query_rules(&self, query: &RuleQuery) -> Result<Vec<JinxRule>>;

    fn query_templates(&self, query: &TemplateQuery) -> Result<Vec<RoleTemplate>>;
}

/// Name-level queries over a [`RuleStore`].
#[derive(Clone, Copy)]
pub struct JinxLookup<'a> {
    store: &'a dyn RuleStore,
}

impl<'a> JinxLookup<'a> {
    pub fn new(store: &'a dyn RuleStore) -> Self {
        JinxLookup { store }
    }

    /// The rule joining `a` and `b`, in either order.
    pub fn find_rule(&self, a: &str, b: &str) -> Result<Option<JinxRule>> {
        let rules = self.query_parseable(&RuleQuery::NameContains(a.to_string()))?;
        Ok(rules
            .into_iter()
            .find(|rule| counterpart(&rule.name, a) == Some(b)))
    }

    /// Every rule where `name` is exactly one of the two sides.
    pub fn find_all_rules_for_name(&self, name: &str) -> Result<Vec<JinxRule>> {
        let rules = self.query_parseable(&RuleQuery::NameContains(name.to_string()))?;
        Ok(rules.into_iter().filter(|rule| rule.mentions(name)).collect())
    }

    /// Every stored rule whose two roles are both characters of the script.
    pub fn applicable_rules(&self, script: &Script) -> Result<Vec<JinxRule>> {
        let names: HashSet<&str> = script.character_names().collect();
        let rules = self.query_parseable(&RuleQuery::All)?;
        Ok(rules
            .into_iter()
            .filter(|rule| {
                rule.role_names()
                    .map(|(left, right)| names.contains(left) && names.contains(right))
                    .unwrap_or(false)
            })
            .collect())
    }

    /// Applicable rules not yet present as a `Jinxed` entry (matched by id).
    pub fn detect_applicable_rules(&self, script: &Script) -> Result<Vec<JinxRule>> {
        let existing: HashSet<&str> = script
            .roles()
            .iter()
            .filter(|r| r.is_jinx())
            .map(|r| r.id.as_str())
            .collect();
        let detected: Vec<JinxRule> = self
            .applicable_rules(script)?
            .into_iter()
            .filter(|rule| !existing.contains(rule.id.as_str()))
            .collect();
        debug!(count = detected.len(), "detected new jinx rules");
        Ok(detected)
    }

    pub fn find_template(&self, id: &str) -> Result<Option<RoleTemplate>> {
        Ok(self
            .store
            .query_templates(&TemplateQuery::ById(id.to_string()))?
            .into_iter()
            .next())
    }

    pub fn templates_for_team(&self, team: Team) -> Result<Vec<RoleTemplate>> {
        self.store.query_templates(&TemplateQuery::ByTeam(team))
    }

    /// Runs a rule query, skipping (and logging) rules whose name has no
    /// usable separator.
    fn query_parseable(&self, query: &RuleQuery) -> Result<Vec<JinxRule>> {
        let rules = self.store.query_rules(query)?;
        debug!(query = ?query, count = rules.len(), "queried jinx rules");
        Ok(rules
            .into_iter()
            .filter(|rule| {
                let ok = rule.role_names().is_some();
                if !ok {
                    warn!(id = %rule.id, name = %rule.name, "skipping stored jinx with unparseable name");
                }
                ok
            })
            .collect())
    }
}
