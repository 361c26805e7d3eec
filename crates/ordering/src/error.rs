use std::fmt;

use ledgerline_store::StoreError;

#[derive(Debug)]
pub enum OrderingError {
    /// Persistence failure.
    Store(StoreError),
    /// The entry being moved does not exist in its source context.
    UnknownEntry {
        kind: String,
        node_ref: String,
        context: String,
    },
    /// The relative anchor of a move does not exist.
    UnknownAnchor { kind: String, node_ref: String },
}

impl fmt::Display for OrderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "store error: {err}"),
            Self::UnknownEntry {
                kind,
                node_ref,
                context,
            } => write!(f, "no ordering entry for {kind}/{node_ref} in '{context}'"),
            Self::UnknownAnchor { kind, node_ref } => {
                write!(f, "unknown move anchor {kind}/{node_ref}")
            }
        }
    }
}

impl std::error::Error for OrderingError {}

impl From<StoreError> for OrderingError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}
