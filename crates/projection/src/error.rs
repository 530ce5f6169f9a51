//! Projection errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProjectionError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Corrupt projection row: {0}")]
    Corrupt(String),
}

/// SQLite integers are signed; ids and timestamps above `i64::MAX` are
/// refused rather than wrapped.
pub(crate) fn to_sql_int(value: u64, column: &str) -> Result<i64, ProjectionError> {
    i64::try_from(value).map_err(|_| ProjectionError::Corrupt(format!("{column} = {value} exceeds i64")))
}

pub(crate) fn from_sql_int(value: i64, column: &str) -> Result<u64, ProjectionError> {
    u64::try_from(value).map_err(|_| ProjectionError::Corrupt(format!("{column} = {value} is negative")))
}
