//! Ordered presentation tree: the ordering table joined back to reference
//! data and expanded recursively from the root scope.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::{OrderingError, Positions, ROOT_CTX};

#[derive(Debug, Clone, Serialize)]
pub struct TreeNode {
    pub kind: String,
    pub node_ref: String,
    pub label: String,
    pub position: i64,
    pub children: Vec<TreeNode>,
}

struct Labels {
    nodes: HashMap<i64, String>,
    virtuals: HashMap<i64, String>,
    /// (node id, account) → custom label.
    node_accounts: HashMap<(i64, String), String>,
    /// (virtual id, account) → custom label.
    virtual_accounts: HashMap<(i64, String), String>,
}

pub(crate) fn build(positions: &Positions) -> Result<Vec<TreeNode>, OrderingError> {
    let store = positions.store();

    let mut labels = Labels {
        nodes: HashMap::new(),
        virtuals: HashMap::new(),
        node_accounts: HashMap::new(),
        virtual_accounts: HashMap::new(),
    };
    for node in store.classification_nodes()? {
        labels.nodes.insert(node.id, node.name);
    }
    for v in store.virtual_nodes()? {
        labels.virtuals.insert(v.id, v.name);
    }
    for o in store.label_overrides()? {
        if let Some(node_id) = o.node_id {
            labels
                .node_accounts
                .insert((node_id, o.account.clone()), o.label.clone());
        }
        if let Some(virtual_id) = o.virtual_id {
            labels
                .virtual_accounts
                .insert((virtual_id, o.account), o.label);
        }
    }

    let mut visited = HashSet::new();
    expand(positions, &labels, ROOT_CTX, &mut visited)
}

fn expand(
    positions: &Positions,
    labels: &Labels,
    context: &str,
    visited: &mut HashSet<String>,
) -> Result<Vec<TreeNode>, OrderingError> {
    if !visited.insert(context.to_string()) {
        return Ok(Vec::new());
    }

    let mut out = Vec::new();
    for slot in positions.siblings(context)? {
        let Some(label) = resolve_label(labels, &slot.kind, &slot.node_ref, context) else {
            // Entry referencing data that no longer exists: skip, do not fail.
            debug!(kind = %slot.kind, node_ref = %slot.node_ref, "skipping orphan ordering entry");
            continue;
        };

        let children = if is_leaf(&slot.kind) {
            Vec::new()
        } else {
            expand(positions, labels, &slot.child_context(), visited)?
        };

        out.push(TreeNode {
            kind: slot.kind,
            node_ref: slot.node_ref,
            label,
            position: slot.position,
            children,
        });
    }
    Ok(out)
}

fn is_leaf(kind: &str) -> bool {
    matches!(kind, "account" | "cc_kind")
}

fn resolve_label(labels: &Labels, kind: &str, node_ref: &str, context: &str) -> Option<String> {
    match kind {
        "group" | "subgroup" => {
            let id: i64 = node_ref.parse().ok()?;
            labels.nodes.get(&id).cloned()
        }
        "virtual" => {
            let id: i64 = node_ref.parse().ok()?;
            labels.virtuals.get(&id).cloned()
        }
        "account" => {
            // The owning scope decides where the custom label comes from.
            if let Some((owner_kind, owner_ref)) = context.rsplit_once('_') {
                if let Ok(owner_id) = owner_ref.parse::<i64>() {
                    let key = (owner_id, node_ref.to_string());
                    let custom = match owner_kind {
                        "virtual" => labels.virtual_accounts.get(&key),
                        _ => labels.node_accounts.get(&key),
                    };
                    if let Some(label) = custom {
                        return Some(label.clone());
                    }
                }
            }
            Some(node_ref.to_string())
        }
        // Unknown kinds keep their reference as the label.
        _ => Some(node_ref.to_string()),
    }
}
