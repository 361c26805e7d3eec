//! `ledgerline-ordering` — explicit display ordering for every report node.
//!
//! Each node occupies an integer position inside a named parent context (a
//! sibling scope). Positions are gap-spaced so single moves rarely force a
//! renumber; `normalize` restores the clean progression when they do.
//!
//! Concurrent writers against the same context race (last write wins); the
//! callers serialize edits externally.

mod error;
mod tree;

pub use error::OrderingError;
pub use tree::TreeNode;

use std::collections::{HashMap, HashSet};

use tracing::debug;

use ledgerline_model::OrderSlot;
use ledgerline_store::Store;

/// Sibling scope holding top-level report nodes.
pub const ROOT_CTX: &str = "root";
/// Sibling scope holding cost-center kinds; used only for priority fallback,
/// never rendered in the tree.
pub const KINDS_CTX: &str = "kinds";

pub const DEFAULT_GAP: i64 = 10;

/// Relative placement for a move.
#[derive(Debug, Clone)]
pub enum Anchor {
    Before { kind: String, node_ref: String },
    After { kind: String, node_ref: String },
    Inside { kind: String, node_ref: String },
}

/// Where a new node lands in its context.
#[derive(Debug, Clone, Copy)]
pub enum Placement {
    Start,
    End,
    At(i64),
}

/// Position store operations over one [`Store`].
pub struct Positions<'a> {
    store: &'a Store,
    gap: i64,
}

impl<'a> Positions<'a> {
    pub fn new(store: &'a Store, gap: i64) -> Self {
        Self { store, gap }
    }

    pub(crate) fn store(&self) -> &Store {
        self.store
    }

    // -----------------------------------------------------------------------
    // Seeding
    // -----------------------------------------------------------------------

    /// Deterministically seed every known node kind across every known
    /// context, gap-spaced. Existing triples are skipped (computed as an
    /// explicit diff against the in-memory key set), so repeated calls insert
    /// nothing new. One batched write.
    pub fn initialize(&self, reset: bool) -> Result<usize, OrderingError> {
        if reset {
            self.store.clear_slots()?;
        }

        let desired = self.desired_slots()?;
        let existing = self.store.slot_keys()?;
        let missing: Vec<OrderSlot> = desired
            .into_iter()
            .filter(|s| {
                !existing.contains(&(s.kind.clone(), s.node_ref.clone(), s.context.clone()))
            })
            .collect();

        let inserted = self.store.insert_slots(&missing)?;
        debug!(inserted, reset, "ordering initialize");
        Ok(inserted)
    }

    /// The full deterministic slot layout for the current reference data.
    fn desired_slots(&self) -> Result<Vec<OrderSlot>, OrderingError> {
        let gap = self.gap;
        let mut desired: Vec<OrderSlot> = Vec::new();

        // Cost-center kinds, in their own scope.
        let mut kinds: Vec<String> = self
            .store
            .cost_centers()?
            .into_iter()
            .map(|cc| cc.kind)
            .collect();
        kinds.sort();
        kinds.dedup();
        for (i, kind) in kinds.iter().enumerate() {
            let mut slot = OrderSlot::new("cc_kind", kind.clone(), KINDS_CTX, gap * (i as i64 + 1));
            slot.path = Some(KINDS_CTX.to_string());
            desired.push(slot);
        }

        let virtuals = self.store.virtual_nodes()?;
        let nodes = self.store.classification_nodes()?;
        let bindings = self.store.account_bindings()?;
        let overrides = self.store.label_overrides()?;

        let mut children_of: HashMap<i64, Vec<&ledgerline_model::ClassificationNode>> =
            HashMap::new();
        for node in &nodes {
            if let Some(parent) = node.parent_id {
                children_of.entry(parent).or_default().push(node);
            }
        }
        let mut bindings_of: HashMap<i64, Vec<&ledgerline_model::AccountBinding>> = HashMap::new();
        for b in &bindings {
            bindings_of.entry(b.node_id).or_default().push(b);
        }

        // Root scope: virtual nodes first, then root classification groups.
        let mut pos = 0;
        for v in &virtuals {
            pos += gap;
            let mut slot = OrderSlot::new("virtual", v.id.to_string(), ROOT_CTX, pos);
            slot.path = Some(ROOT_CTX.to_string());
            desired.push(slot);
        }
        let roots: Vec<_> = nodes.iter().filter(|n| n.parent_id.is_none()).collect();
        for root in &roots {
            pos += gap;
            let mut slot = OrderSlot::new("group", root.id.to_string(), ROOT_CTX, pos);
            slot.path = Some(ROOT_CTX.to_string());
            desired.push(slot);
        }

        // Per-node scopes, walked iteratively from the roots.
        let mut stack: Vec<(i64, String, i64, String)> = roots
            .iter()
            .map(|r| {
                let ctx = format!("group_{}", r.id);
                (r.id, ctx.clone(), 1, format!("{ROOT_CTX}::{ctx}"))
            })
            .collect();
        while let Some((node_id, ctx, depth, path)) = stack.pop() {
            let mut pos = 0;
            for child in children_of.get(&node_id).into_iter().flatten() {
                pos += gap;
                let mut slot = OrderSlot::new("subgroup", child.id.to_string(), ctx.clone(), pos);
                slot.depth = depth;
                slot.path = Some(path.clone());
                desired.push(slot);

                let child_ctx = format!("subgroup_{}", child.id);
                stack.push((
                    child.id,
                    child_ctx.clone(),
                    depth + 1,
                    format!("{path}::{child_ctx}"),
                ));
            }
            let mut seen_accounts: HashSet<&str> = HashSet::new();
            for b in bindings_of.get(&node_id).into_iter().flatten() {
                if !seen_accounts.insert(b.account.as_str()) {
                    continue;
                }
                pos += gap;
                let mut slot = OrderSlot::new("account", b.account.clone(), ctx.clone(), pos);
                slot.depth = depth;
                slot.path = Some(path.clone());
                desired.push(slot);
            }
        }

        // Accounts labeled directly under a virtual node.
        for v in &virtuals {
            let ctx = format!("virtual_{}", v.id);
            let path = format!("{ROOT_CTX}::{ctx}");
            let mut pos = 0;
            let mut seen: HashSet<&str> = HashSet::new();
            for o in overrides.iter().filter(|o| o.virtual_id == Some(v.id)) {
                if !seen.insert(o.account.as_str()) {
                    continue;
                }
                pos += gap;
                let mut slot = OrderSlot::new("account", o.account.clone(), ctx.clone(), pos);
                slot.depth = 1;
                slot.path = Some(path.clone());
                desired.push(slot);
            }
        }

        Ok(desired)
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn position(
        &self,
        kind: &str,
        node_ref: &str,
        context: &str,
    ) -> Result<Option<i64>, OrderingError> {
        Ok(self.store.slot(kind, node_ref, context)?.map(|s| s.position))
    }

    /// Entries of one context, ascending by position.
    pub fn siblings(&self, context: &str) -> Result<Vec<OrderSlot>, OrderingError> {
        Ok(self.store.slots_in(context)?)
    }

    /// Sort priority for an aggregated report line: virtual-node position,
    /// else root-group position, else cost-center-kind position, else the
    /// caller's sentinel.
    pub fn priority_for(
        &self,
        virtual_root: Option<i64>,
        root_group: Option<i64>,
        kind: &str,
        default: i64,
    ) -> Result<i64, OrderingError> {
        if let Some(vid) = virtual_root {
            if let Some(pos) = self.position("virtual", &vid.to_string(), ROOT_CTX)? {
                return Ok(pos);
            }
        }
        if let Some(gid) = root_group {
            if let Some(pos) = self.position("group", &gid.to_string(), ROOT_CTX)? {
                return Ok(pos);
            }
        }
        if let Some(pos) = self.position("cc_kind", kind, KINDS_CTX)? {
            return Ok(pos);
        }
        Ok(default)
    }

    /// Priority of a virtual node itself (derived-line evaluation order).
    pub fn virtual_priority(&self, virtual_id: i64, default: i64) -> Result<i64, OrderingError> {
        Ok(self
            .position("virtual", &virtual_id.to_string(), ROOT_CTX)?
            .unwrap_or(default))
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Relocate one entry. With an anchor, the position derives from the
    /// anchor: before/after land a half-gap off it; inside switches the
    /// target to the anchor's child context and appends at the end.
    pub fn move_entry(
        &self,
        kind: &str,
        node_ref: &str,
        from_ctx: &str,
        to_ctx: &str,
        new_pos: Option<i64>,
        anchor: Option<&Anchor>,
    ) -> Result<OrderSlot, OrderingError> {
        if self.store.slot(kind, node_ref, from_ctx)?.is_none() {
            return Err(OrderingError::UnknownEntry {
                kind: kind.to_string(),
                node_ref: node_ref.to_string(),
                context: from_ctx.to_string(),
            });
        }

        let delta = (self.gap / 2).max(1);
        let (target_ctx, position) = match anchor {
            Some(Anchor::Inside {
                kind: ak,
                node_ref: ar,
            }) => {
                if self.store.find_slots(ak, ar)?.is_empty() {
                    return Err(OrderingError::UnknownAnchor {
                        kind: ak.clone(),
                        node_ref: ar.clone(),
                    });
                }
                let ctx = format!("{ak}_{ar}");
                let end = self.end_position(&ctx)?;
                (ctx, end)
            }
            Some(Anchor::Before {
                kind: ak,
                node_ref: ar,
            }) => {
                let a = self.anchor_slot(ak, ar, to_ctx)?;
                (to_ctx.to_string(), a.position - delta)
            }
            Some(Anchor::After {
                kind: ak,
                node_ref: ar,
            }) => {
                let a = self.anchor_slot(ak, ar, to_ctx)?;
                (to_ctx.to_string(), a.position + delta)
            }
            None => {
                let pos = match new_pos {
                    Some(p) => p,
                    None => self.end_position(to_ctx)?,
                };
                (to_ctx.to_string(), pos)
            }
        };

        self.store.delete_slots(kind, node_ref, Some(from_ctx))?;
        let slot = self.place(kind, node_ref, &target_ctx, position)?;
        debug!(
            kind,
            node_ref,
            from = from_ctx,
            to = %slot.context,
            position = slot.position,
            "moved ordering entry"
        );
        Ok(slot)
    }

    /// Upsert every listed position of one context in a single batched pass.
    pub fn bulk_reorder(
        &self,
        context: &str,
        entries: &[(String, String, i64)],
    ) -> Result<usize, OrderingError> {
        let (depth, path) = self.context_meta(context)?;
        let slots: Vec<OrderSlot> = entries
            .iter()
            .map(|(kind, node_ref, position)| {
                let mut s = OrderSlot::new(kind.clone(), node_ref.clone(), context, *position);
                s.depth = depth;
                s.path = path.clone();
                s
            })
            .collect();
        Ok(self.store.upsert_slots(&slots)?)
    }

    /// Renumber a context's siblings to a clean gap progression.
    pub fn normalize(&self, context: &str) -> Result<usize, OrderingError> {
        let mut siblings = self.store.slots_in(context)?;
        for (i, slot) in siblings.iter_mut().enumerate() {
            slot.position = self.gap * (i as i64 + 1);
        }
        Ok(self.store.upsert_slots(&siblings)?)
    }

    /// Slot a new node into a context without disturbing existing order.
    pub fn add_node(
        &self,
        kind: &str,
        node_ref: &str,
        context: &str,
        placement: Placement,
    ) -> Result<OrderSlot, OrderingError> {
        let siblings = self.store.slots_in(context)?;
        let position = match placement {
            Placement::At(p) => p,
            Placement::End => match siblings.last() {
                Some(last) => last.position + self.gap,
                None => self.gap,
            },
            Placement::Start => match siblings.first() {
                Some(first) => (first.position - self.gap).max(1),
                None => self.gap,
            },
        };
        self.place(kind, node_ref, context, position)
    }

    /// Drop a node's slots, in one context or everywhere. Called when the
    /// underlying classification node goes away.
    pub fn remove_node(
        &self,
        kind: &str,
        node_ref: &str,
        context: Option<&str>,
    ) -> Result<usize, OrderingError> {
        Ok(self.store.delete_slots(kind, node_ref, context)?)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn anchor_slot(
        &self,
        kind: &str,
        node_ref: &str,
        context: &str,
    ) -> Result<OrderSlot, OrderingError> {
        self.store
            .slot(kind, node_ref, context)?
            .ok_or(OrderingError::UnknownAnchor {
                kind: kind.to_string(),
                node_ref: node_ref.to_string(),
            })
    }

    fn end_position(&self, context: &str) -> Result<i64, OrderingError> {
        let siblings = self.store.slots_in(context)?;
        Ok(match siblings.last() {
            Some(last) => last.position + self.gap,
            None => self.gap,
        })
    }

    fn place(
        &self,
        kind: &str,
        node_ref: &str,
        context: &str,
        position: i64,
    ) -> Result<OrderSlot, OrderingError> {
        let (depth, path) = self.context_meta(context)?;
        let mut slot = OrderSlot::new(kind, node_ref, context, position);
        slot.depth = depth;
        slot.path = path;
        self.store.upsert_slots(std::slice::from_ref(&slot))?;
        Ok(slot)
    }

    /// Depth and materialized context chain for entries of a context,
    /// resolved by walking up through the context's owning entry. Unknown
    /// parents degrade to a root-level scope.
    fn context_meta(&self, context: &str) -> Result<(i64, Option<String>), OrderingError> {
        if context == ROOT_CTX || context == KINDS_CTX {
            return Ok((0, Some(context.to_string())));
        }
        if let Some((kind, node_ref)) = context.rsplit_once('_') {
            if let Some(owner) = self.store.find_slots(kind, node_ref)?.into_iter().next() {
                let base = owner.path.unwrap_or_else(|| owner.context.clone());
                return Ok((owner.depth + 1, Some(format!("{base}::{context}"))));
            }
        }
        Ok((0, Some(context.to_string())))
    }

    /// The full ordered presentation tree, expanded from the root scope.
    pub fn build_tree(&self) -> Result<Vec<TreeNode>, OrderingError> {
        tree::build(self)
    }
}

#[cfg(test)]
mod tests;
