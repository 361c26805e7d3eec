//! `ledgerline-report` — the reporting engine.
//!
//! Merges ledger facts with the human-approved adjustment layer, routes every
//! row through the classification hierarchy, accumulates monthly report
//! lines, evaluates formula-based virtual lines, and sorts everything by the
//! ordering subsystem's priorities.

pub mod adjust;
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;

pub use adjust::{resolve_adjustments, ActiveAdjustments};
pub use aggregate::{generate_report, ReportParams};
pub use classify::Hierarchy;
pub use config::EngineConfig;
pub use derived::evaluate_virtual_nodes;
pub use engine::run;
pub use error::EngineError;
