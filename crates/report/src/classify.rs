//! Classification resolution: the materialized hierarchy and per-account
//! binding rules.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use ledgerline_store::Store;

use crate::error::EngineError;
use ledgerline_model::RootContext;

/// A tree node after the walk: materialized path plus the effective (own or
/// inherited) root context.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    /// `::`-joined names from the root down to this node.
    pub path: String,
    pub context: Option<RootContext>,
    pub root_id: i64,
}

/// One way an account can reach the report: through a tree node or straight
/// to a virtual node.
#[derive(Debug, Clone)]
pub struct Rule {
    pub node_id: Option<i64>,
    pub root_id: Option<i64>,
    pub path: String,
    /// Primary grouping kind (cost-center kind, or `"virtual"`).
    pub kind: String,
    pub virtual_root: Option<(i64, String)>,
    /// Declared cost-center; compared digit-to-digit against row values.
    pub cost_center: Option<String>,
    pub label: Option<String>,
}

/// The classification hierarchy, built once per report run from a single
/// batch read of the node, binding, and override tables.
#[derive(Debug, Default)]
pub struct Hierarchy {
    pub nodes: HashMap<i64, ResolvedNode>,
    /// Account → rules, in source order (binding ordinals first, then label
    /// overrides).
    pub rules: HashMap<String, Vec<Rule>>,
}

/// Digit-only normalization of a cost-center value. `None` when nothing
/// numeric is left; malformed values degrade to "no specific match".
pub(crate) fn cost_center_digits(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        Some(digits)
    }
}

impl Hierarchy {
    pub fn build(store: &Store) -> Result<Self, EngineError> {
        let raw_nodes = store.classification_nodes()?;
        let bindings = store.account_bindings()?;
        let overrides = store.label_overrides()?;

        // Arena + child index; the tree is walked iteratively from the roots.
        let mut children_of: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut by_id: HashMap<i64, &ledgerline_model::ClassificationNode> = HashMap::new();
        for node in &raw_nodes {
            by_id.insert(node.id, node);
            if let Some(parent) = node.parent_id {
                children_of.entry(parent).or_default().push(node.id);
            }
        }

        let mut nodes: HashMap<i64, ResolvedNode> = HashMap::new();
        let mut stack: Vec<(i64, String, Option<RootContext>, i64)> = raw_nodes
            .iter()
            .filter(|n| n.parent_id.is_none())
            .map(|n| (n.id, String::new(), None, n.id))
            .collect();

        while let Some((id, parent_path, inherited, root_id)) = stack.pop() {
            let raw = by_id[&id];
            let path = if parent_path.is_empty() {
                raw.name.clone()
            } else {
                format!("{parent_path}::{}", raw.name)
            };
            // Own context wins; descendants without one inherit.
            let context = raw.context.clone().or(inherited);
            for child in children_of.get(&id).into_iter().flatten() {
                stack.push((*child, path.clone(), context.clone(), root_id));
            }
            nodes.insert(
                id,
                ResolvedNode {
                    id,
                    name: raw.name.clone(),
                    parent_id: raw.parent_id,
                    path,
                    context,
                    root_id,
                },
            );
        }

        if nodes.len() != raw_nodes.len() {
            warn!(
                resolved = nodes.len(),
                total = raw_nodes.len(),
                "classification nodes unreachable from any root"
            );
        }

        // Account definitions: bindings first (source order), then labels
        // bound to a node, then labels bound straight to a virtual node.
        let mut label_by_key: HashMap<(i64, &str), &str> = HashMap::new();
        for o in &overrides {
            if let Some(node_id) = o.node_id {
                label_by_key.insert((node_id, o.account.as_str()), o.label.as_str());
            }
        }

        let mut rules: HashMap<String, Vec<Rule>> = HashMap::new();
        let mut consumed_labels: HashSet<(i64, &str)> = HashSet::new();

        for b in &bindings {
            let Some(node) = nodes.get(&b.node_id) else {
                warn!(binding = b.id, node = b.node_id, "binding to unknown node");
                continue;
            };
            let label = label_by_key
                .get(&(b.node_id, b.account.as_str()))
                .map(|l| l.to_string());
            if label.is_some() {
                consumed_labels.insert((b.node_id, b.account.as_str()));
            }
            rules
                .entry(b.account.clone())
                .or_default()
                .push(node_rule(node, b.cost_center.clone(), label));
        }

        for o in &overrides {
            match (o.node_id, o.virtual_id) {
                (Some(node_id), _) => {
                    if consumed_labels.contains(&(node_id, o.account.as_str())) {
                        continue;
                    }
                    let Some(node) = nodes.get(&node_id) else {
                        warn!(label = o.id, node = node_id, "label bound to unknown node");
                        continue;
                    };
                    rules
                        .entry(o.account.clone())
                        .or_default()
                        .push(node_rule(node, None, Some(o.label.clone())));
                }
                (None, Some(virtual_id)) => {
                    rules.entry(o.account.clone()).or_default().push(Rule {
                        node_id: None,
                        root_id: None,
                        path: o.label.clone(),
                        kind: "virtual".into(),
                        virtual_root: Some((virtual_id, o.label.clone())),
                        cost_center: None,
                        label: Some(o.label.clone()),
                    });
                }
                (None, None) => {
                    warn!(label = o.id, "label override bound to nothing");
                }
            }
        }

        Ok(Self { nodes, rules })
    }

    /// Resolve an account + cost-center to its rule.
    ///
    /// Zero bindings means the row is unclassified and the caller drops it.
    /// With several, a rule declared for the row's cost-center (digits
    /// compared) wins; otherwise the first rule in source order applies.
    pub fn match_rule(&self, account: &str, cost_center: Option<&str>) -> Option<&Rule> {
        let rules = self.rules.get(account)?;
        if rules.is_empty() {
            return None;
        }
        if let Some(wanted) = cost_center.and_then(cost_center_digits) {
            if let Some(specific) = rules.iter().find(|r| {
                r.cost_center
                    .as_deref()
                    .and_then(cost_center_digits)
                    .is_some_and(|d| d == wanted)
            }) {
                return Some(specific);
            }
        }
        rules.first()
    }
}

fn node_rule(node: &ResolvedNode, cost_center: Option<String>, label: Option<String>) -> Rule {
    let kind = node
        .context
        .as_ref()
        .map(|c| c.kind().to_string())
        .unwrap_or_default();
    let virtual_root = node.context.as_ref().and_then(|c| match c {
        RootContext::Virtual { id, name } => Some((*id, name.clone())),
        RootContext::CostCenter(_) => None,
    });
    Rule {
        node_id: Some(node.id),
        root_id: Some(node.root_id),
        path: node.path.clone(),
        kind,
        virtual_root,
        cost_center,
        label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerline_model::CostCenter;

    fn cc(code: &str, kind: &str) -> RootContext {
        RootContext::CostCenter(CostCenter {
            code: code.into(),
            kind: kind.into(),
            name: format!("CC {code}"),
        })
    }

    fn store_with_tree() -> (Store, i64, i64, i64) {
        let store = Store::open_in_memory().unwrap();
        let revenue = store
            .insert_node("Revenue", None, Some(&cc("200", "operational")))
            .unwrap();
        let domestic = store.insert_node("Domestic", Some(revenue), None).unwrap();
        let export = store.insert_node("Export", Some(domestic), None).unwrap();
        (store, revenue, domestic, export)
    }

    #[test]
    fn paths_and_inherited_context() {
        let (store, revenue, domestic, export) = store_with_tree();
        let hierarchy = Hierarchy::build(&store).unwrap();

        assert_eq!(hierarchy.nodes[&revenue].path, "Revenue");
        assert_eq!(hierarchy.nodes[&domestic].path, "Revenue::Domestic");
        assert_eq!(hierarchy.nodes[&export].path, "Revenue::Domestic::Export");
        // context flows down to descendants lacking their own
        assert_eq!(
            hierarchy.nodes[&export].context.as_ref().map(|c| c.kind()),
            Some("operational")
        );
        assert_eq!(hierarchy.nodes[&export].root_id, revenue);
    }

    #[test]
    fn own_context_wins_over_inherited() {
        let (store, revenue, _, _) = store_with_tree();
        let override_node = store
            .insert_node("Overhead", Some(revenue), Some(&cc("300", "administrative")))
            .unwrap();
        let hierarchy = Hierarchy::build(&store).unwrap();
        assert_eq!(
            hierarchy.nodes[&override_node]
                .context
                .as_ref()
                .map(|c| c.kind()),
            Some("administrative")
        );
    }

    #[test]
    fn unknown_account_is_unclassified() {
        let (store, _, _, _) = store_with_tree();
        let hierarchy = Hierarchy::build(&store).unwrap();
        assert!(hierarchy.match_rule("9.9.99", Some("200")).is_none());
    }

    #[test]
    fn cost_center_specific_rule_wins() {
        let (store, revenue, domestic, _) = store_with_tree();
        store.insert_binding(revenue, "3.1.01", None, 0).unwrap();
        store
            .insert_binding(domestic, "3.1.01", Some("CC-200"), 1)
            .unwrap();
        let hierarchy = Hierarchy::build(&store).unwrap();

        // digits of "200" match the rule declared as "CC-200"
        let rule = hierarchy.match_rule("3.1.01", Some("200")).unwrap();
        assert_eq!(rule.node_id, Some(domestic));

        // no cost-center → first rule in source order
        let rule = hierarchy.match_rule("3.1.01", None).unwrap();
        assert_eq!(rule.node_id, Some(revenue));

        // malformed cost-center value degrades to the fallback
        let rule = hierarchy.match_rule("3.1.01", Some("N/A")).unwrap();
        assert_eq!(rule.node_id, Some(revenue));
    }

    #[test]
    fn label_merges_into_binding_rule() {
        let (store, revenue, _, _) = store_with_tree();
        store.insert_binding(revenue, "3.1.01", None, 0).unwrap();
        store
            .insert_label_override("3.1.01", "Product sales", Some(revenue), None)
            .unwrap();
        let hierarchy = Hierarchy::build(&store).unwrap();

        let rules = &hierarchy.rules["3.1.01"];
        assert_eq!(rules.len(), 1, "label must not duplicate the binding rule");
        assert_eq!(rules[0].label.as_deref(), Some("Product sales"));
    }

    #[test]
    fn virtual_label_builds_a_direct_rule() {
        let (store, _, _, _) = store_with_tree();
        store
            .insert_label_override("9.9.01", "Manual KPI", None, Some(7))
            .unwrap();
        let hierarchy = Hierarchy::build(&store).unwrap();

        let rule = hierarchy.match_rule("9.9.01", None).unwrap();
        assert_eq!(rule.kind, "virtual");
        assert_eq!(rule.virtual_root, Some((7, "Manual KPI".into())));
        assert_eq!(rule.node_id, None);
    }
}
