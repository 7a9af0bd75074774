use thiserror::Error;

/// Core error type shared across seedsheet crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Schema facts contradict each other (second FK on a column, dangling reference).
    #[error("schema inconsistency: {0}")]
    SchemaInconsistency(String),
    /// The table set violates internal invariants (duplicates, empty names).
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    /// Database error or reader failure.
    #[error("database error: {0}")]
    Db(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by seedsheet crates.
pub type Result<T> = std::result::Result<T, Error>;
