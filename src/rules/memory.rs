use crate::error::Result;

use super::{JinxRule, RoleTemplate, RuleQuery, RuleStore, TemplateQuery};

/// In-process rule store, for rules that come from somewhere other than the
/// SQLite database (and for tests).
#[derive(Clone, Debug, Default)]
pub struct MemoryRuleStore {
    rules: Vec<JinxRule>,
    templates: Vec<RoleTemplate>,
}

impl MemoryRuleStore {
    pub fn new(rules: Vec<JinxRule>, templates: Vec<RoleTemplate>) -> Self {
        MemoryRuleStore { rules, templates }
    }

    pub fn with_rule(mut self, rule: JinxRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_template(mut self, template: RoleTemplate) -> Self {
        self.templates.push(template);
        self
    }
}

impl RuleStore for MemoryRuleStore {
    fn query_rules(&self, query: &RuleQuery) -> Result<Vec<JinxRule>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| match query {
                RuleQuery::All => true,
                RuleQuery::ById(id) => &rule.id == id,
                RuleQuery::NameContains(text) => rule.name.contains(text.as_str()),
            })
            .cloned()
            .collect())
    }

    fn query_templates(&self, query: &TemplateQuery) -> Result<Vec<RoleTemplate>> {
        Ok(self
            .templates
            .iter()
            .filter(|template| match query {
                TemplateQuery::All => true,
                TemplateQuery::ById(id) => &template.id == id,
                TemplateQuery::ByName(name) => &template.name == name,
                TemplateQuery::ByTeam(team) => template.team == *team,
            })
            .cloned()
            .collect())
    }
}
