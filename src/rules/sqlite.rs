//! SQLite-backed rule store.
//!
//! The database is opened read-only for each query and closed when the query
//! returns; no connection outlives a single operation.
//!
//! # Schema
//!
//! `jinxes(id, name, ability, image)` and `roles(id, name, team, ability,
//! image, edition, setup, first_night, other_night, reminders,
//! reminders_global)`. `team` holds the wire token and the two reminder
//! columns hold JSON string arrays.

use std::path::{Path, PathBuf};

use rusqlite::{params_from_iter, Connection, OpenFlags, Row};
use tracing::{debug, warn};

use crate::error::{Result, ScriptError};
use crate::script::Team;

use super::{JinxRule, RoleTemplate, RuleQuery, RuleStore, TemplateQuery};

const RULE_COLUMNS: &str = "SELECT id, name, ability, image FROM jinxes";
const TEMPLATE_COLUMNS: &str = "SELECT id, name, team, ability, image, edition, setup, \
     first_night, other_night, reminders, reminders_global FROM roles";

#[derive(Clone, Debug)]
pub struct SqliteRuleStore {
    path: PathBuf,
}

impl SqliteRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteRuleStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection> {
        if !self.path.exists() {
            return Err(ScriptError::NotFound(format!(
                "rule database {}",
                self.path.display()
            )));
        }
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(conn)
    }
}

/// Raw `roles` row before team and reminder columns are decoded.
struct TemplateRow {
    id: String,
    name: String,
    team: String,
    ability: Option<String>,
    image: Option<String>,
    edition: Option<String>,
    setup: Option<bool>,
    first_night: Option<f64>,
    other_night: Option<f64>,
    reminders: Option<String>,
    reminders_global: Option<String>,
}

impl TemplateRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(TemplateRow {
            id: row.get(0)?,
            name: row.get(1)?,
            team: row.get(2)?,
            ability: row.get(3)?,
            image: row.get(4)?,
            edition: row.get(5)?,
            setup: row.get(6)?,
            first_night: row.get(7)?,
            other_night: row.get(8)?,
            reminders: row.get(9)?,
            reminders_global: row.get(10)?,
        })
    }

    fn decode(self) -> std::result::Result<RoleTemplate, String> {
        let team = Team::from_token(&self.team).ok_or_else(|| format!("unknown team `{}`", self.team))?;
        Ok(RoleTemplate {
            team,
            ability: self.ability.unwrap_or_default(),
            image: self.image.filter(|url| !url.is_empty()),
            edition: self.edition,
            setup: self.setup.unwrap_or(false),
            first_night: self.first_night.unwrap_or(0.0),
            other_night: self.other_night.unwrap_or(0.0),
            reminders: decode_list(self.reminders.as_deref())?,
            reminders_global: decode_list(self.reminders_global.as_deref())?,
            id: self.id,
            name: self.name,
        })
    }
}

fn decode_list(raw: Option<&str>) -> std::result::Result<Vec<String>, String> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text).map_err(|e| format!("bad reminder list: {e}")),
    }
}

impl RuleStore for SqliteRuleStore {
    fn query_rules(&self, query: &RuleQuery) -> Result<Vec<JinxRule>> {
        let (filter, args): (&str, Vec<String>) = match query {
            RuleQuery::All => ("", vec![]),
            RuleQuery::ById(id) => (" WHERE id = ?1", vec![id.clone()]),
            RuleQuery::NameContains(text) => (" WHERE instr(name, ?1) > 0", vec![text.clone()]),
        };
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("{RULE_COLUMNS}{filter} ORDER BY rowid"))?;
        let rows = stmt.query_map(params_from_iter(args.iter()), |row| {
            Ok(JinxRule {
                id: row.get(0)?,
                name: row.get(1)?,
                ability: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                image: row.get::<_, Option<String>>(3)?.filter(|url| !url.is_empty()),
            })
        })?;
        let rules = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(path = %self.path.display(), count = rules.len(), "read jinx rules");
        Ok(rules)
    }

    fn query_templates(&self, query: &TemplateQuery) -> Result<Vec<RoleTemplate>> {
        let (filter, args): (&str, Vec<String>) = match query {
            TemplateQuery::All => ("", vec![]),
            TemplateQuery::ById(id) => (" WHERE id = ?1", vec![id.clone()]),
            TemplateQuery::ByName(name) => (" WHERE name = ?1", vec![name.clone()]),
            TemplateQuery::ByTeam(team) => (
                " WHERE lower(team) = ?1",
                vec![team.wire_token().to_string()],
            ),
        };
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("{TEMPLATE_COLUMNS}{filter} ORDER BY rowid"))?;
        let rows = stmt.query_map(params_from_iter(args.iter()), TemplateRow::from_row)?;

        let mut templates = Vec::new();
        for row in rows {
            let row = row?;
            let id = row.id.clone();
            match row.decode() {
                Ok(template) => templates.push(template),
                Err(reason) => warn!(id = %id, reason = %reason, "skipping unreadable role template"),
            }
        }
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::JinxLookup;

    const SCHEMA: &str = "
        CREATE TABLE jinxes (id TEXT PRIMARY KEY, name TEXT NOT NULL, ability TEXT, image TEXT);
        CREATE TABLE roles (
            id TEXT PRIMARY KEY, name TEXT NOT NULL, team TEXT NOT NULL, ability TEXT,
            image TEXT, edition TEXT, setup INTEGER, first_night REAL, other_night REAL,
            reminders TEXT, reminders_global TEXT
        );
        INSERT INTO jinxes VALUES ('j1', 'Spy&Magician', 'spy text', NULL);
        INSERT INTO jinxes VALUES ('j2', 'Spy&Poppy Grower', 'pg text', 'http://x/j2.png');
        INSERT INTO jinxes VALUES ('j3', 'Lil Monsta+Vizier', 'lm text', '');
        INSERT INTO roles VALUES ('imp', 'Imp', 'demon', 'kill', NULL, 'tb', 0, 0, 24, '[\"Dead\"]', '[]');
        INSERT INTO roles VALUES ('odd', 'Odd', 'villager', '', NULL, NULL, 0, 0, 0, NULL, NULL);
        INSERT INTO roles VALUES ('baron', 'Baron', 'minion', '+2 outsiders', NULL, 'tb', 1, 0, 0, NULL, '');
    ";

    fn fixture() -> (tempfile::TempDir, SqliteRuleStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        drop(conn);
        (dir, SqliteRuleStore::new(path))
    }

    #[test]
    fn test_missing_database_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRuleStore::new(dir.path().join("absent.db"));
        let err = store.query_rules(&RuleQuery::All).unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[test]
    fn test_rule_queries() {
        let (_dir, store) = fixture();
        assert_eq!(store.query_rules(&RuleQuery::All).unwrap().len(), 3);

        let by_id = store.query_rules(&RuleQuery::ById("j2".into())).unwrap();
        assert_eq!(by_id[0].image.as_deref(), Some("http://x/j2.png"));

        let spy = store
            .query_rules(&RuleQuery::NameContains("Spy".into()))
            .unwrap();
        assert_eq!(spy.len(), 2);

        let lm = store.query_rules(&RuleQuery::ById("j3".into())).unwrap();
        assert_eq!(lm[0].image, None);
    }

    #[test]
    fn test_lookup_over_sqlite() {
        let (_dir, store) = fixture();
        let lookup = JinxLookup::new(&store);
        let rule = lookup.find_rule("Vizier", "Lil Monsta").unwrap().unwrap();
        assert_eq!(rule.ability, "lm text");
    }

    #[test]
    fn test_template_queries_skip_bad_rows() {
        let (_dir, store) = fixture();
        let all = store.query_templates(&TemplateQuery::All).unwrap();
        let ids: Vec<_> = all.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["imp", "baron"]);

        let imp = &all[0];
        assert_eq!(imp.team, Team::Demon);
        assert_eq!(imp.other_night, 24.0);
        assert_eq!(imp.reminders, vec!["Dead"]);
        assert!(all[1].setup);
        assert!(all[1].reminders_global.is_empty());

        let minions = store
            .query_templates(&TemplateQuery::ByTeam(Team::Minion))
            .unwrap();
        assert_eq!(minions.len(), 1);
        let by_name = store
            .query_templates(&TemplateQuery::ByName("Imp".into()))
            .unwrap();
        assert_eq!(by_name[0].id, "imp");
    }
}
