use sea_orm::{DbErr, RuntimeErr, SqlErr};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from sea-orm.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    /// Record not found.
    #[error("Record not found: {context}")]
    NotFound { context: String },
}

impl StoreError {
    /// Create a NotFound error for a UUID lookup.
    pub fn not_found_by_id(id: Uuid) -> Self {
        Self::NotFound {
            context: format!("id={}", id),
        }
    }

    /// Whether this error is a unique-constraint violation.
    ///
    /// Two workers can race to discover the same natural key from overlapping
    /// pages; the loser's insert fails on the unique index, which is the
    /// expected benign outcome and must not fail the task.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Self::Database(db_err) => {
                if matches!(db_err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                    return true;
                }
                // sql_err() does not classify every backend's duplicate-key
                // error; fall back to matching the message.
                if let DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e)) =
                    db_err
                {
                    let msg = e.to_string().to_ascii_lowercase();
                    return msg.contains("unique") || msg.contains("duplicate key");
                }
                false
            }
            _ => false,
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
