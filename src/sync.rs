//! Keeps a script's two jinx representations in line with the rule store.
//!
//! - [`sync_embedded`] recomputes each character's `jinxes` list (BOTC shape).
//! - [`sync_standalone`] adds and removes `Jinxed` entries (JiShi shape).
//!
//! The first pass only reads non-Jinxed roles and the second only touches
//! Jinxed ones, so they can run in either order. Both are idempotent: a second
//! run with no edit in between changes nothing. Run them after any edit that
//! changes role names or membership.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::codec::counterpart;
use crate::error::Result;
use crate::rules::JinxLookup;
use crate::script::{JinxRef, Script};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Characters whose embedded jinx list changed.
    pub roles_updated: usize,
    /// Ids of `Jinxed` entries added.
    pub added: Vec<String>,
    /// Ids of `Jinxed` entries removed.
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn is_unchanged(&self) -> bool {
        self.roles_updated == 0 && self.added.is_empty() && self.removed.is_empty()
    }

    fn merge(mut self, other: SyncReport) -> SyncReport {
        self.roles_updated += other.roles_updated;
        self.added.extend(other.added);
        self.removed.extend(other.removed);
        self
    }
}

/// Rebuilds every character's embedded jinx references from the store.
///
/// A rule whose other role is not in the script yields nothing. An empty
/// result clears the field to `None`.
pub fn sync_embedded(script: &mut Script, lookup: &JinxLookup<'_>) -> Result<SyncReport> {
    let mut computed: Vec<Option<Option<Vec<JinxRef>>>> = Vec::with_capacity(script.len());

    for role in script.roles() {
        if role.is_jinx() {
            computed.push(None);
            continue;
        }
        let mut refs = Vec::new();
        for rule in lookup.find_all_rules_for_name(&role.name)? {
            let Some(other_name) = counterpart(&rule.name, &role.name) else {
                continue;
            };
            if let Some(other) = script.role_by_name(other_name) {
                refs.push(JinxRef {
                    id: other.id.clone(),
                    reason: rule.ability.clone(),
                });
            }
        }
        computed.push(Some((!refs.is_empty()).then_some(refs)));
    }

    let mut report = SyncReport::default();
    for (role, jinxes) in script.roles_mut().iter_mut().zip(computed) {
        let Some(jinxes) = jinxes else { continue };
        if role.jinxes != jinxes {
            debug!(id = %role.id, count = jinxes.as_ref().map_or(0, Vec::len), "updated embedded jinxes");
            role.jinxes = jinxes;
            report.roles_updated += 1;
        }
    }
    Ok(report)
}

/// Makes the script's `Jinxed` entries match the applicable stored rules.
///
/// Missing rules are appended in store order; entries whose id is not an
/// applicable rule are removed. Other roles keep their relative order.
pub fn sync_standalone(script: &mut Script, lookup: &JinxLookup<'_>) -> Result<SyncReport> {
    let target = lookup.applicable_rules(script)?;
    let target_ids: HashSet<&str> = target.iter().map(|rule| rule.id.as_str()).collect();

    let mut report = SyncReport::default();
    script.roles_mut().retain(|role| {
        let keep = !role.is_jinx() || target_ids.contains(role.id.as_str());
        if !keep {
            report.removed.push(role.id.clone());
        }
        keep
    });

    for rule in &target {
        if let Some(existing) = script.role(&rule.id) {
            if !existing.is_jinx() {
                debug!(id = %rule.id, "jinx id already used by a character; not adding");
            }
            continue;
        }
        script.roles_mut().push(rule.to_role());
        report.added.push(rule.id.clone());
    }
    Ok(report)
}

/// Runs both passes on a copy and swaps it in only when both succeed, so a
/// store failure leaves `script` untouched.
pub fn sync_all(script: &mut Script, lookup: &JinxLookup<'_>) -> Result<SyncReport> {
    let mut staged = script.clone();
    let embedded = sync_embedded(&mut staged, lookup)?;
    let standalone = sync_standalone(&mut staged, lookup)?;
    *script = staged;
    let report = embedded.merge(standalone);
    info!(
        roles_updated = report.roles_updated,
        added = report.added.len(),
        removed = report.removed.len(),
        "synchronized jinxes"
    );
    Ok(report)
}

/// Applies `edit` and then [`sync_all`] to a copy of `script`. The copy
/// replaces `script` only if both succeed.
pub fn apply_edit<F>(script: &mut Script, lookup: &JinxLookup<'_>, edit: F) -> Result<SyncReport>
where
    F: FnOnce(&mut Script) -> Result<()>,
{
    let mut staged = script.clone();
    edit(&mut staged)?;
    let report = sync_all(&mut staged, lookup)?;
    *script = staged;
    Ok(report)
}
