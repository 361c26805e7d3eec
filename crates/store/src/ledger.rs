use chrono::NaiveDate;
use rusqlite::params;
use tracing::warn;

use ledgerline_model::LedgerEntry;

use crate::{Store, StoreError};

/// Raw row shape before date validation.
struct RawEntry {
    id: i64,
    origin: String,
    account: String,
    title: String,
    date: String,
    document: Option<String>,
    branch: Option<String>,
    cost_center: Option<String>,
    item: Option<String>,
    debit_cents: i64,
    credit_cents: i64,
}

impl RawEntry {
    /// Rows with an unparseable date are excluded, never fatal.
    fn decode(self) -> Option<LedgerEntry> {
        let date = match NaiveDate::parse_from_str(&self.date, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                warn!(id = self.id, date = %self.date, "skipping ledger row with bad date");
                return None;
            }
        };
        Some(LedgerEntry {
            id: self.id,
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
        })
    }
}

const ENTRY_COLS: &str = "id, origin, account, title, entry_date, document, branch, \
                          cost_center, item, debit_cents, credit_cents";

fn raw_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawEntry> {
    Ok(RawEntry {
        id: row.get(0)?,
        origin: row.get(1)?,
        account: row.get(2)?,
        title: row.get(3)?,
        date: row.get(4)?,
        document: row.get(5)?,
        branch: row.get(6)?,
        cost_center: row.get(7)?,
        item: row.get(8)?,
        debit_cents: row.get(9)?,
        credit_cents: row.get(10)?,
    })
}

impl Store {
    /// Batch-insert ledger facts (import pipeline entry point). The `id`
    /// field of the input is ignored; SQLite assigns row ids.
    pub fn insert_entries(&self, entries: &[LedgerEntry]) -> Result<usize, StoreError> {
        let conn = self.conn();
        conn.execute("BEGIN TRANSACTION", [])?;
        let mut inserted = 0;
        {
            let mut stmt = conn.prepare(
                "INSERT INTO ledger_entries \
                 (origin, account, title, entry_date, document, branch, cost_center, item, \
                  debit_cents, credit_cents) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for e in entries {
                inserted += stmt.execute(params![
                    e.origin,
                    e.account,
                    e.title,
                    e.date.format("%Y-%m-%d").to_string(),
                    e.document,
                    e.branch,
                    e.cost_center,
                    e.item,
                    e.debit_cents,
                    e.credit_cents,
                ])?;
            }
        }
        conn.execute("COMMIT", [])?;
        Ok(inserted)
    }

    /// The ledger fact view, optionally filtered by origin system. One
    /// set-oriented read; finer filters belong to the engine.
    pub fn ledger_entries(&self, origin: Option<&str>) -> Result<Vec<LedgerEntry>, StoreError> {
        let conn = self.conn();
        let raws: Vec<RawEntry> = match origin {
            Some(origin) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLS} FROM ledger_entries WHERE origin = ?1 ORDER BY id"
                ))?;
                let iter = stmt.query_map(params![origin], raw_from_row)?;
                iter.collect::<rusqlite::Result<_>>()?
            }
            None => {
                let mut stmt = conn
                    .prepare(&format!("SELECT {ENTRY_COLS} FROM ledger_entries ORDER BY id"))?;
                let iter = stmt.query_map([], raw_from_row)?;
                iter.collect::<rusqlite::Result<_>>()?
            }
        };
        Ok(raws.into_iter().filter_map(RawEntry::decode).collect())
    }

    /// Ledger rows carrying a specific item marker (the auto-adjustment
    /// sweep reads these).
    pub fn ledger_entries_by_item(&self, item: &str) -> Result<Vec<LedgerEntry>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENTRY_COLS} FROM ledger_entries WHERE item = ?1 ORDER BY id"
        ))?;
        let iter = stmt.query_map(params![item], raw_from_row)?;
        let raws: Vec<RawEntry> = iter.collect::<rusqlite::Result<_>>()?;
        Ok(raws.into_iter().filter_map(RawEntry::decode).collect())
    }
}
