//! `ledgerline-model` — Domain types for the reporting core.
//!
//! Pure data crate: ledger facts, adjustment records, the classification
//! hierarchy, virtual nodes, report lines, and the row-identity fingerprint.
//! No I/O dependencies.

pub mod adjustment;
pub mod fingerprint;
pub mod hierarchy;
pub mod ledger;
pub mod ordering;
pub mod report;

pub use adjustment::{AdjustmentKind, AdjustmentRecord, AdjustmentStatus, AuditEntry};
pub use fingerprint::{fingerprint, RowIdentity};
pub use hierarchy::{
    AccountBinding, ClassificationNode, CostCenter, Formula, FormulaOp, LabelOverride, OperandRef,
    OperandScope, RootContext, VirtualNode,
};
pub use ledger::LedgerEntry;
pub use ordering::OrderSlot;
pub use report::{ReportEnvelope, ReportLine, ReportMeta};
