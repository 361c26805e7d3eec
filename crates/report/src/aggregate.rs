//! The aggregation engine: skeleton seeding, base pass with override
//! substitution, classification, the inclusion pass, and priority sort.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Datelike;
use tracing::debug;

use ledgerline_model::{fingerprint, ReportLine};
use ledgerline_ordering::Positions;
use ledgerline_store::Store;

use crate::adjust::ActiveAdjustments;
use crate::classify::{cost_center_digits, Hierarchy, Rule};
use crate::config::EngineConfig;
use crate::error::EngineError;

/// Report invocation parameters.
#[derive(Debug, Clone, Default)]
pub struct ReportParams {
    /// Restrict to one origin system.
    pub origin: Option<String>,
    /// Split lines per cost-center instead of merging across them.
    pub by_cost_center: bool,
    /// Restrict to one cost-center (digit-compared).
    pub cost_center: Option<String>,
}

/// Grouping identity of one report line. `BTreeMap` keyed by this gives the
/// engine a deterministic pre-sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    kind: String,
    virtual_root: Option<i64>,
    path: String,
    title: String,
    account: String,
    cost_center: Option<String>,
}

#[derive(Debug, Default)]
struct Acc {
    months: [i64; 12],
    total: i64,
    root_id: Option<i64>,
    origin: Option<String>,
    /// False for skeleton-only lines no row ever reached.
    touched: bool,
}

impl Acc {
    fn seeded(root_id: Option<i64>) -> Self {
        Self {
            root_id,
            ..Self::default()
        }
    }
}

/// Produce the ordered monthly report.
///
/// Row-level anomalies (bad cost-center strings, unclassifiable accounts)
/// drop the row and never fail the report; structural failures (store,
/// ordering) abort.
pub fn generate_report(
    store: &Store,
    hierarchy: &Hierarchy,
    adjustments: &ActiveAdjustments,
    positions: &Positions<'_>,
    params: &ReportParams,
    config: &EngineConfig,
) -> Result<Vec<ReportLine>, EngineError> {
    let mut groups: BTreeMap<GroupKey, Acc> = BTreeMap::new();

    // Cost-center display names, digit-keyed; consulted only when grouping.
    let cc_names: HashMap<String, String> = if params.by_cost_center {
        store
            .cost_centers()?
            .into_iter()
            .filter_map(|cc| cost_center_digits(&cc.code).map(|d| (d, cc.name)))
            .collect()
    } else {
        HashMap::new()
    };

    // 1. Skeleton: every configured (account, rule) renders even when empty.
    for (account, rules) in &hierarchy.rules {
        for rule in rules {
            let key = group_key(rule, account, None, None);
            groups
                .entry(key)
                .or_insert_with(|| Acc::seeded(rule.root_id));
        }
    }

    let wanted_cc = params.cost_center.as_deref().and_then(cost_center_digits);

    // 2+3. Base pass: fingerprint, substitute, classify, accumulate.
    for entry in store.ledger_entries(params.origin.as_deref())? {
        if let Some(wanted) = &wanted_cc {
            let row_cc = entry.cost_center.as_deref().and_then(cost_center_digits);
            if row_cc.as_ref() != Some(wanted) {
                continue;
            }
        }

        let fp = fingerprint(&entry);
        if adjustments.invalidated.contains(&fp) {
            // Invalidated override: the row leaves the report entirely.
            continue;
        }

        let (account, cost_center, title, date, value, origin) =
            match adjustments.overrides.get(&fp) {
                Some(adj) => (
                    adj.account.clone().unwrap_or_else(|| entry.account.clone()),
                    adj.cost_center.clone().or_else(|| entry.cost_center.clone()),
                    adj.title.clone().unwrap_or_else(|| entry.title.clone()),
                    adj.date.unwrap_or(entry.date),
                    if adj.show_balance { adj.signed_cents() } else { 0 },
                    adj.origin.clone().unwrap_or_else(|| entry.origin.clone()),
                ),
                None => (
                    entry.account.clone(),
                    entry.cost_center.clone(),
                    entry.title.clone(),
                    entry.date,
                    entry.signed_cents(),
                    entry.origin.clone(),
                ),
            };

        let Some(rule) = hierarchy.match_rule(&account, cost_center.as_deref()) else {
            debug!(%account, "dropping unclassified ledger row");
            continue;
        };

        let cc_display = cc_display(params, cost_center.as_deref(), &cc_names);
        let key = group_key(rule, &account, Some(&title), cc_display);
        accumulate(&mut groups, key, rule.root_id, date.month(), value, origin);
    }

    // 4. Inclusion pass: synthetic rows through the same classification.
    for adj in &adjustments.inclusions {
        if let Some(origin) = params.origin.as_deref() {
            if adj.origin.as_deref() != Some(origin) {
                continue;
            }
        }
        if let Some(wanted) = &wanted_cc {
            let adj_cc = adj.cost_center.as_deref().and_then(cost_center_digits);
            if adj_cc.as_ref() != Some(wanted) {
                continue;
            }
        }
        let Some(account) = adj.account.as_deref() else {
            debug!(id = adj.id, "inclusion without account");
            continue;
        };
        let Some(date) = adj.date else {
            debug!(id = adj.id, "inclusion without date");
            continue;
        };
        let Some(rule) = hierarchy.match_rule(account, adj.cost_center.as_deref()) else {
            debug!(%account, "dropping unclassified inclusion");
            continue;
        };

        let title = adj.title.clone().unwrap_or_else(|| account.to_string());
        let value = if adj.show_balance { adj.signed_cents() } else { 0 };
        let cc_display = cc_display(params, adj.cost_center.as_deref(), &cc_names);
        let key = group_key(rule, account, Some(&title), cc_display);
        accumulate(
            &mut groups,
            key,
            rule.root_id,
            date.month(),
            value,
            adj.origin.clone().unwrap_or_default(),
        );
    }

    // A skeleton line is superseded when rows landed on the same account
    // under a row-supplied title; keep it only while it stands alone.
    let touched: HashSet<(String, Option<i64>, String, String, Option<String>)> = groups
        .iter()
        .filter(|(_, acc)| acc.touched)
        .map(|(k, _)| shape_of(k))
        .collect();
    groups.retain(|key, acc| acc.touched || !touched.contains(&shape_of(key)));

    // 5. Stable priority sort over the deterministic group order.
    let mut lines = Vec::with_capacity(groups.len());
    for (key, acc) in groups {
        let priority = positions.priority_for(
            key.virtual_root,
            acc.root_id,
            &key.kind,
            config.default_priority,
        )?;
        lines.push(ReportLine {
            kind: key.kind,
            virtual_root_id: key.virtual_root,
            path: key.path,
            account: key.account,
            title: key.title,
            origin: acc.origin,
            cost_center: key.cost_center,
            months: acc.months,
            total_cents: acc.total,
            priority,
        });
    }
    if params.by_cost_center {
        lines.sort_by(|a, b| {
            (a.priority, a.cost_center.as_deref()).cmp(&(b.priority, b.cost_center.as_deref()))
        });
    } else {
        lines.sort_by_key(|l| l.priority);
    }
    Ok(lines)
}

fn shape_of(key: &GroupKey) -> (String, Option<i64>, String, String, Option<String>) {
    (
        key.kind.clone(),
        key.virtual_root,
        key.path.clone(),
        key.account.clone(),
        key.cost_center.clone(),
    )
}

fn group_key(
    rule: &Rule,
    account: &str,
    row_title: Option<&str>,
    cost_center: Option<String>,
) -> GroupKey {
    // The configured label wins over whatever the row carries; accounts with
    // neither fall back to their code.
    let title = rule
        .label
        .clone()
        .or_else(|| row_title.map(str::to_string))
        .unwrap_or_else(|| account.to_string());
    GroupKey {
        kind: rule.kind.clone(),
        virtual_root: rule.virtual_root.as_ref().map(|(id, _)| *id),
        path: rule.path.clone(),
        title,
        account: account.to_string(),
        cost_center,
    }
}

fn cc_display(
    params: &ReportParams,
    cost_center: Option<&str>,
    cc_names: &HashMap<String, String>,
) -> Option<String> {
    if !params.by_cost_center {
        return None;
    }
    let raw = cost_center?;
    match cost_center_digits(raw).and_then(|d| cc_names.get(&d).cloned()) {
        Some(name) => Some(name),
        None => Some(raw.to_string()),
    }
}

fn accumulate(
    groups: &mut BTreeMap<GroupKey, Acc>,
    key: GroupKey,
    root_id: Option<i64>,
    month: u32,
    value: i64,
    origin: String,
) {
    let acc = groups.entry(key).or_insert_with(|| Acc::seeded(root_id));
    let bucket = (month as usize).saturating_sub(1).min(11);
    acc.months[bucket] += value;
    acc.total += value;
    acc.touched = true;
    if acc.root_id.is_none() {
        acc.root_id = root_id;
    }
    if acc.origin.is_none() && !origin.is_empty() {
        acc.origin = Some(origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(path: &str, label: Option<&str>) -> Rule {
        Rule {
            node_id: Some(1),
            root_id: Some(1),
            path: path.into(),
            kind: "operational".into(),
            virtual_root: None,
            cost_center: None,
            label: label.map(Into::into),
        }
    }

    #[test]
    fn configured_label_wins_over_row_title() {
        let key = group_key(&rule("Revenue", Some("Product sales")), "3.1.01", Some("Raw"), None);
        assert_eq!(key.title, "Product sales");

        let key = group_key(&rule("Revenue", None), "3.1.01", Some("Raw"), None);
        assert_eq!(key.title, "Raw");

        let key = group_key(&rule("Revenue", None), "3.1.01", None, None);
        assert_eq!(key.title, "3.1.01");
    }

    #[test]
    fn accumulate_merges_same_key() {
        let mut groups = BTreeMap::new();
        let key = group_key(&rule("Revenue", None), "3.1.01", Some("Sales"), None);
        accumulate(&mut groups, key.clone(), Some(1), 3, 500, "erp".into());
        accumulate(&mut groups, key.clone(), Some(1), 3, 250, "erp".into());
        accumulate(&mut groups, key.clone(), Some(1), 7, -100, "erp".into());
        let acc = &groups[&key];
        assert_eq!(acc.months[2], 750);
        assert_eq!(acc.months[6], -100);
        assert_eq!(acc.total, 650);
        assert!(acc.touched);
    }

    #[test]
    fn skeleton_shape_matches_row_shape() {
        // Same account, different title: the skeleton line must be
        // recognized as superseded by the row-titled line.
        let skeleton = group_key(&rule("Revenue", None), "3.1.01", None, None);
        let row = group_key(&rule("Revenue", None), "3.1.01", Some("Sales"), None);
        assert_ne!(skeleton, row);
        assert_eq!(shape_of(&skeleton), shape_of(&row));
    }
}
