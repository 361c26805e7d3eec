use chrono::NaiveDate;

use crate::fingerprint::RowIdentity;

/// A posted accounting transaction line. Immutable fact: created only by the
/// import pipeline, never edited in place; corrections go through
/// adjustments.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: i64,
    pub origin: String,
    pub account: String,
    pub title: String,
    pub date: NaiveDate,
    pub document: Option<String>,
    pub branch: Option<String>,
    pub cost_center: Option<String>,
    pub item: Option<String>,
    pub debit_cents: i64,
    pub credit_cents: i64,
}

impl LedgerEntry {
    /// Signed value in the report's credit-positive convention.
    pub fn signed_cents(&self) -> i64 {
        self.credit_cents - self.debit_cents
    }
}

impl RowIdentity for LedgerEntry {
    fn origin(&self) -> Option<&str> {
        Some(&self.origin)
    }
    fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }
    fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
    fn item(&self) -> Option<&str> {
        self.item.as_deref()
    }
    fn account(&self) -> Option<&str> {
        Some(&self.account)
    }
    fn date(&self) -> Option<NaiveDate> {
        Some(self.date)
    }
}
