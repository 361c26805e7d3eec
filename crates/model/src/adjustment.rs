use chrono::NaiveDate;

use crate::fingerprint::RowIdentity;

/// What an adjustment does to the report.
///
/// `Edit` and `AutoNonoperating` attach to an existing ledger row by
/// fingerprint; `Include` and `AutoIntergroup` are wholly synthetic rows with
/// no ledger counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdjustmentKind {
    Edit,
    Include,
    AutoIntergroup,
    AutoNonoperating,
}

impl AdjustmentKind {
    /// True for kinds that must carry a fingerprint link.
    pub fn is_override(&self) -> bool {
        matches!(self, Self::Edit | Self::AutoNonoperating)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Include => "include",
            Self::AutoIntergroup => "auto_intergroup",
            Self::AutoNonoperating => "auto_nonoperating",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "edit" => Some(Self::Edit),
            "include" => Some(Self::Include),
            "auto_intergroup" => Some(Self::AutoIntergroup),
            "auto_nonoperating" => Some(Self::AutoNonoperating),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval lifecycle state. Pending adjustments still apply to the report;
/// only rejection removes one from play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentStatus {
    Pending,
    Approved,
    Rejected,
}

impl AdjustmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for AdjustmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A human-approved override of, or addition to, ledger data.
///
/// The mirrored ledger fields hold the values the report should see instead
/// of (or in addition to) the underlying fact. After creation only `status`
/// and `invalid` change; records are never hard-deleted.
#[derive(Debug, Clone)]
pub struct AdjustmentRecord {
    pub id: i64,
    pub kind: AdjustmentKind,
    pub status: AdjustmentStatus,
    /// Soft-delete flag, independent of approval status. An invalid override
    /// removes its ledger row from the report entirely.
    pub invalid: bool,
    /// Required for override kinds, absent for inclusion kinds.
    pub fingerprint: Option<String>,
    pub origin: Option<String>,
    pub account: Option<String>,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    pub document: Option<String>,
    pub branch: Option<String>,
    pub cost_center: Option<String>,
    pub item: Option<String>,
    pub debit_cents: i64,
    pub credit_cents: i64,
    /// When false the row still renders but contributes zero.
    pub show_balance: bool,
    pub created_by: String,
    pub created_at: String,
    pub approved_by: Option<String>,
    pub approved_at: Option<String>,
}

impl AdjustmentRecord {
    /// Signed value in the report's credit-positive convention.
    pub fn signed_cents(&self) -> i64 {
        self.credit_cents - self.debit_cents
    }

    /// True when the record participates in report resolution at all.
    pub fn is_active(&self) -> bool {
        self.status != AdjustmentStatus::Rejected && !self.invalid
    }
}

impl RowIdentity for AdjustmentRecord {
    fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
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
        self.account.as_deref()
    }
    fn date(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// One field-level change on an adjustment. Append-only.
#[derive(Debug, Clone)]
pub struct AuditEntry {
    pub id: i64,
    pub adjustment_id: i64,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub changed_by: String,
    pub changed_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_roundtrip() {
        for kind in [
            AdjustmentKind::Edit,
            AdjustmentKind::Include,
            AdjustmentKind::AutoIntergroup,
            AdjustmentKind::AutoNonoperating,
        ] {
            assert_eq!(AdjustmentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(AdjustmentKind::parse("unknown"), None);
    }

    #[test]
    fn override_kinds() {
        assert!(AdjustmentKind::Edit.is_override());
        assert!(AdjustmentKind::AutoNonoperating.is_override());
        assert!(!AdjustmentKind::Include.is_override());
        assert!(!AdjustmentKind::AutoIntergroup.is_override());
    }
}
