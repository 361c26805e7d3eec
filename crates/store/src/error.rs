use std::fmt;

#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite failure.
    Sqlite(String),
    /// Reference to a row that does not exist.
    NotFound { entity: &'static str, key: String },
    /// Uniqueness violation (duplicate ordering slot, binding key).
    Conflict(String),
    /// A persisted row that cannot be decoded (bad kind/status/formula).
    Malformed { entity: &'static str, detail: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(msg) => write!(f, "sqlite error: {msg}"),
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::Conflict(msg) => write!(f, "integrity conflict: {msg}"),
            Self::Malformed { entity, detail } => {
                write!(f, "malformed {entity} row: {detail}")
            }
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Self::Conflict(err.to_string())
            }
            _ => Self::Sqlite(err.to_string()),
        }
    }
}
