use chrono::NaiveDate;
use rusqlite::params;
use tracing::debug;

use ledgerline_model::{AdjustmentKind, AdjustmentRecord, AdjustmentStatus, AuditEntry};

use crate::{Store, StoreError};

const ADJ_COLS: &str = "id, kind, status, invalid, fingerprint, origin, account, title, \
                        adj_date, document, branch, cost_center, item, debit_cents, \
                        credit_cents, show_balance, created_by, created_at, approved_by, \
                        approved_at";

struct RawAdjustment {
    id: i64,
    kind: String,
    status: String,
    invalid: bool,
    fingerprint: Option<String>,
    origin: Option<String>,
    account: Option<String>,
    title: Option<String>,
    date: Option<String>,
    document: Option<String>,
    branch: Option<String>,
    cost_center: Option<String>,
    item: Option<String>,
    debit_cents: i64,
    credit_cents: i64,
    show_balance: bool,
    created_by: String,
    created_at: String,
    approved_by: Option<String>,
    approved_at: Option<String>,
}

fn raw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAdjustment> {
    Ok(RawAdjustment {
        id: row.get(0)?,
        kind: row.get(1)?,
        status: row.get(2)?,
        invalid: row.get::<_, i64>(3)? != 0,
        fingerprint: row.get(4)?,
        origin: row.get(5)?,
        account: row.get(6)?,
        title: row.get(7)?,
        date: row.get(8)?,
        document: row.get(9)?,
        branch: row.get(10)?,
        cost_center: row.get(11)?,
        item: row.get(12)?,
        debit_cents: row.get(13)?,
        credit_cents: row.get(14)?,
        show_balance: row.get::<_, i64>(15)? != 0,
        created_by: row.get(16)?,
        created_at: row.get(17)?,
        approved_by: row.get(18)?,
        approved_at: row.get(19)?,
    })
}

impl RawAdjustment {
    fn decode(self) -> Result<AdjustmentRecord, StoreError> {
        let kind = AdjustmentKind::parse(&self.kind).ok_or(StoreError::Malformed {
            entity: "adjustment",
            detail: format!("unknown kind '{}' (id {})", self.kind, self.id),
        })?;
        let status = AdjustmentStatus::parse(&self.status).ok_or(StoreError::Malformed {
            entity: "adjustment",
            detail: format!("unknown status '{}' (id {})", self.status, self.id),
        })?;
        // An unparseable date on an adjustment is a data anomaly on one
        // record, not a structural failure: the record keeps a None date and
        // falls out of month bucketing downstream.
        let date = self
            .date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        Ok(AdjustmentRecord {
            id: self.id,
            kind,
            status,
            invalid: self.invalid,
            fingerprint: self.fingerprint,
            origin: self.origin,
            account: self.account,
            title: self.title,
            date,
            document: self.document,
            branch: self.branch,
            cost_center: self.cost_center,
            item: self.item,
            debit_cents: self.debit_cents,
            credit_cents: self.credit_cents,
            show_balance: self.show_balance,
            created_by: self.created_by,
            created_at: self.created_at,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
        })
    }
}

/// The mirrored ledger fields tracked by the audit diff.
fn mirrored_fields(rec: &AdjustmentRecord) -> Vec<(&'static str, Option<String>)> {
    vec![
        ("origin", rec.origin.clone()),
        ("account", rec.account.clone()),
        ("title", rec.title.clone()),
        ("date", rec.date.map(|d| d.format("%Y-%m-%d").to_string())),
        ("document", rec.document.clone()),
        ("branch", rec.branch.clone()),
        ("cost_center", rec.cost_center.clone()),
        ("item", rec.item.clone()),
        ("debit_cents", Some(rec.debit_cents.to_string())),
        ("credit_cents", Some(rec.credit_cents.to_string())),
        ("show_balance", Some(rec.show_balance.to_string())),
    ]
}

impl Store {
    /// Every non-rejected adjustment, including invalidated records; the
    /// resolver partitions those into the invalidated set.
    pub fn adjustments_for_resolution(&self) -> Result<Vec<AdjustmentRecord>, StoreError> {
        self.query_adjustments("WHERE status != 'rejected'")
    }

    /// Full adjustment listing, newest first.
    pub fn list_adjustments(&self) -> Result<Vec<AdjustmentRecord>, StoreError> {
        self.query_adjustments("ORDER BY id DESC")
    }

    pub fn adjustment(&self, id: i64) -> Result<AdjustmentRecord, StoreError> {
        let mut found = self.query_adjustments(&format!("WHERE id = {id}"))?;
        found.pop().ok_or(StoreError::NotFound {
            entity: "adjustment",
            key: id.to_string(),
        })
    }

    fn query_adjustments(&self, tail: &str) -> Result<Vec<AdjustmentRecord>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {ADJ_COLS} FROM adjustments {tail}"))?;
        let raws: Vec<RawAdjustment> = stmt
            .query_map([], raw_from_row)?
            .collect::<rusqlite::Result<_>>()?;
        raws.into_iter().map(RawAdjustment::decode).collect()
    }

    /// Create one adjustment, returning its id.
    pub fn create_adjustment(&self, rec: &AdjustmentRecord) -> Result<i64, StoreError> {
        self.insert_adjustments(std::slice::from_ref(rec))?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Batch-insert adjustments in one transaction (the auto-adjustment
    /// sweep persists its synthesized records this way).
    pub fn insert_adjustments(&self, recs: &[AdjustmentRecord]) -> Result<usize, StoreError> {
        if recs.is_empty() {
            return Ok(0);
        }
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        let mut inserted = 0;
        {
            let mut stmt = conn.prepare(
                "INSERT INTO adjustments \
                 (kind, status, invalid, fingerprint, origin, account, title, adj_date, \
                  document, branch, cost_center, item, debit_cents, credit_cents, \
                  show_balance, created_by, created_at, approved_by, approved_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, \
                         ?16, ?17, ?18, ?19)",
            )?;
            for rec in recs {
                inserted += stmt.execute(params![
                    rec.kind.as_str(),
                    rec.status.as_str(),
                    rec.invalid as i64,
                    rec.fingerprint,
                    rec.origin,
                    rec.account,
                    rec.title,
                    rec.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    rec.document,
                    rec.branch,
                    rec.cost_center,
                    rec.item,
                    rec.debit_cents,
                    rec.credit_cents,
                    rec.show_balance as i64,
                    rec.created_by,
                    rec.created_at,
                    rec.approved_by,
                    rec.approved_at,
                ])?;
            }
        }
        conn.execute("COMMIT", [])?;
        debug!(count = inserted, "inserted adjustments");
        Ok(inserted)
    }

    /// Apply a user edit to the mirrored fields, appending one audit row per
    /// changed field. Update and audit land in the same transaction.
    pub fn edit_adjustment(
        &self,
        id: i64,
        updated: &AdjustmentRecord,
        changed_by: &str,
    ) -> Result<usize, StoreError> {
        let existing = self.adjustment(id)?;
        let now = Self::now();

        let before = mirrored_fields(&existing);
        let after = mirrored_fields(updated);
        let diffs: Vec<(&'static str, Option<String>, Option<String>)> = before
            .into_iter()
            .zip(after)
            .filter(|((_, old), (_, new))| old != new)
            .map(|((field, old), (_, new))| (field, old, new))
            .collect();
        if diffs.is_empty() {
            return Ok(0);
        }

        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        conn.execute(
            "UPDATE adjustments SET origin = ?1, account = ?2, title = ?3, adj_date = ?4, \
             document = ?5, branch = ?6, cost_center = ?7, item = ?8, debit_cents = ?9, \
             credit_cents = ?10, show_balance = ?11 WHERE id = ?12",
            params![
                updated.origin,
                updated.account,
                updated.title,
                updated.date.map(|d| d.format("%Y-%m-%d").to_string()),
                updated.document,
                updated.branch,
                updated.cost_center,
                updated.item,
                updated.debit_cents,
                updated.credit_cents,
                updated.show_balance as i64,
                id,
            ],
        )?;
        {
            let mut stmt = conn.prepare(
                "INSERT INTO adjustment_audit \
                 (adjustment_id, field, old_value, new_value, changed_by, changed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for (field, old, new) in &diffs {
                stmt.execute(params![id, field, old, new, changed_by, now])?;
            }
        }
        conn.execute("COMMIT", [])?;
        Ok(diffs.len())
    }

    /// Move an adjustment through its approval lifecycle.
    pub fn set_adjustment_status(
        &self,
        id: i64,
        status: AdjustmentStatus,
        actor: &str,
    ) -> Result<(), StoreError> {
        let existing = self.adjustment(id)?;
        let now = Self::now();
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        conn.execute(
            "UPDATE adjustments SET status = ?1, approved_by = ?2, approved_at = ?3 \
             WHERE id = ?4",
            params![status.as_str(), actor, now, id],
        )?;
        conn.execute(
            "INSERT INTO adjustment_audit \
             (adjustment_id, field, old_value, new_value, changed_by, changed_at) \
             VALUES (?1, 'status', ?2, ?3, ?4, ?5)",
            params![id, existing.status.as_str(), status.as_str(), actor, now],
        )?;
        conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Flip the soft-delete flag.
    pub fn set_adjustment_invalid(
        &self,
        id: i64,
        invalid: bool,
        actor: &str,
    ) -> Result<(), StoreError> {
        let existing = self.adjustment(id)?;
        if existing.invalid == invalid {
            return Ok(());
        }
        let now = Self::now();
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        conn.execute(
            "UPDATE adjustments SET invalid = ?1 WHERE id = ?2",
            params![invalid as i64, id],
        )?;
        conn.execute(
            "INSERT INTO adjustment_audit \
             (adjustment_id, field, old_value, new_value, changed_by, changed_at) \
             VALUES (?1, 'invalid', ?2, ?3, ?4, ?5)",
            params![
                id,
                existing.invalid.to_string(),
                invalid.to_string(),
                actor,
                now
            ],
        )?;
        conn.execute("COMMIT", [])?;
        Ok(())
    }

    /// Audit trail for one adjustment, oldest first.
    pub fn audit_for(&self, adjustment_id: i64) -> Result<Vec<AuditEntry>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, adjustment_id, field, old_value, new_value, changed_by, changed_at \
             FROM adjustment_audit WHERE adjustment_id = ?1 ORDER BY id",
        )?;
        let entries = stmt
            .query_map(params![adjustment_id], |row| {
                Ok(AuditEntry {
                    id: row.get(0)?,
                    adjustment_id: row.get(1)?,
                    field: row.get(2)?,
                    old_value: row.get(3)?,
                    new_value: row.get(4)?,
                    changed_by: row.get(5)?,
                    changed_at: row.get(6)?,
                })
            })?
            .collect::<rusqlite::Result<_>>()?;
        Ok(entries)
    }
}
