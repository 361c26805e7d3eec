use std::collections::HashSet;

use rusqlite::params;
use tracing::debug;

use ledgerline_model::OrderSlot;

use crate::{Store, StoreError};

fn slot_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderSlot> {
    Ok(OrderSlot {
        kind: row.get(0)?,
        node_ref: row.get(1)?,
        context: row.get(2)?,
        position: row.get(3)?,
        depth: row.get(4)?,
        path: row.get(5)?,
    })
}

const SLOT_COLS: &str = "node_kind, node_ref, parent_ctx, position, depth, ctx_path";

impl Store {
    /// Every slot in one sibling scope, ascending by position (kind and ref
    /// break position ties so the order is total).
    pub fn slots_in(&self, context: &str) -> Result<Vec<OrderSlot>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLOT_COLS} FROM ordering_slots WHERE parent_ctx = ?1 \
             ORDER BY position, node_kind, node_ref"
        ))?;
        let slots = stmt
            .query_map(params![context], slot_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(slots)
    }

    pub fn slot(
        &self,
        kind: &str,
        node_ref: &str,
        context: &str,
    ) -> Result<Option<OrderSlot>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLOT_COLS} FROM ordering_slots \
             WHERE node_kind = ?1 AND node_ref = ?2 AND parent_ctx = ?3"
        ))?;
        let mut rows = stmt.query_map(params![kind, node_ref, context], slot_from_row)?;
        match rows.next() {
            Some(slot) => Ok(Some(slot?)),
            None => Ok(None),
        }
    }

    /// Every context a node currently occupies.
    pub fn find_slots(&self, kind: &str, node_ref: &str) -> Result<Vec<OrderSlot>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SLOT_COLS} FROM ordering_slots \
             WHERE node_kind = ?1 AND node_ref = ?2 ORDER BY parent_ctx"
        ))?;
        let slots = stmt
            .query_map(params![kind, node_ref], slot_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        Ok(slots)
    }

    /// All existing (kind, ref, context) triples: the in-memory set the
    /// seeding diff runs against.
    pub fn slot_keys(&self) -> Result<HashSet<(String, String, String)>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT node_kind, node_ref, parent_ctx FROM ordering_slots")?;
        let keys = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(keys)
    }

    /// Plain batched insert. Callers diff against [`Store::slot_keys`] first;
    /// a duplicate triple here is a conflict, not an upsert.
    pub fn insert_slots(&self, slots: &[OrderSlot]) -> Result<usize, StoreError> {
        if slots.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        let mut inserted = 0;
        {
            let mut stmt = conn.prepare(
                "INSERT INTO ordering_slots \
                 (node_kind, node_ref, parent_ctx, position, depth, ctx_path) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for s in slots {
                inserted += stmt.execute(params![
                    s.kind, s.node_ref, s.context, s.position, s.depth, s.path
                ])?;
            }
        }
        conn.execute("COMMIT", [])?;
        debug!(count = inserted, "inserted ordering slots");
        Ok(inserted)
    }

    /// Batched insert-or-overwrite on the slot triple.
    pub fn upsert_slots(&self, slots: &[OrderSlot]) -> Result<usize, StoreError> {
        if slots.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        let mut written = 0;
        {
            let mut stmt = conn.prepare(
                "INSERT INTO ordering_slots \
                 (node_kind, node_ref, parent_ctx, position, depth, ctx_path) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) \
                 ON CONFLICT (node_kind, node_ref, parent_ctx) \
                 DO UPDATE SET position = excluded.position, depth = excluded.depth, \
                               ctx_path = excluded.ctx_path",
            )?;
            for s in slots {
                written += stmt.execute(params![
                    s.kind, s.node_ref, s.context, s.position, s.depth, s.path
                ])?;
            }
        }
        conn.execute("COMMIT", [])?;
        Ok(written)
    }

    /// Remove slots for a node, in one context or everywhere.
    pub fn delete_slots(
        &self,
        kind: &str,
        node_ref: &str,
        context: Option<&str>,
    ) -> Result<usize, StoreError> {
        let removed = match context {
            Some(ctx) => self.conn().execute(
                "DELETE FROM ordering_slots \
                 WHERE node_kind = ?1 AND node_ref = ?2 AND parent_ctx = ?3",
                params![kind, node_ref, ctx],
            )?,
            None => self.conn().execute(
                "DELETE FROM ordering_slots WHERE node_kind = ?1 AND node_ref = ?2",
                params![kind, node_ref],
            )?,
        };
        Ok(removed)
    }

    /// Wipe the ordering table (`initialize(reset = true)`).
    pub fn clear_slots(&self) -> Result<usize, StoreError> {
        let removed = self.conn().execute("DELETE FROM ordering_slots", [])?;
        Ok(removed)
    }
}
