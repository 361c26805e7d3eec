use std::fmt;

use ledgerline_ordering::OrderingError;
use ledgerline_store::StoreError;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Missing required input (e.g. a mandatory classification).
    Validation(String),
    /// Reference to a nonexistent node or adjustment.
    NotFound(String),
    /// Duplicate ordering slot or binding key.
    Integrity(String),
    /// Unparseable numeric/date value in a source row. Row-level anomalies
    /// are handled locally; this variant surfaces only where a whole
    /// operation depends on the value.
    Anomaly { context: String, value: String },
    /// Propagated persistence failure.
    Store(StoreError),
    /// Propagated ordering-subsystem failure.
    Ordering(OrderingError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::Validation(msg) => write!(f, "validation error: {msg}"),
            Self::NotFound(what) => write!(f, "not found: {what}"),
            Self::Integrity(msg) => write!(f, "integrity conflict: {msg}"),
            Self::Anomaly { context, value } => {
                write!(f, "data anomaly in {context}: cannot parse '{value}'")
            }
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::Ordering(err) => write!(f, "ordering error: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, key } => Self::NotFound(format!("{entity} {key}")),
            StoreError::Conflict(msg) => Self::Integrity(msg),
            other => Self::Store(other),
        }
    }
}

impl From<OrderingError> for EngineError {
    fn from(err: OrderingError) -> Self {
        Self::Ordering(err)
    }
}
