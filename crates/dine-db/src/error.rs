//! Storage errors.
//!
//! Two UNIQUE indexes carry business meaning and callers branch on them:
//! `orders.bill_number` (the bill allocator retries with the next number)
//! and the active-order index on `orders.table_no` (a racing save re-reads
//! the table). Everything else is opaque to the HTTP layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is SQLite's column list, e.g. `orders.bill_number`.
    #[error("Duplicate value for {field}")]
    UniqueViolation { field: String },

    /// CHECK, NOT NULL or FOREIGN KEY rejected the row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored row no longer decodes (bad enum text, malformed items JSON).
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Timed out waiting for a database connection")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when a UNIQUE index covering `column` rejected the write.
    ///
    /// ```rust
    /// use dine_db::DbError;
    ///
    /// let err = DbError::UniqueViolation { field: "orders.bill_number".into() };
    /// assert!(err.is_unique_violation_on("bill_number"));
    /// assert!(!err.is_unique_violation_on("table_no"));
    /// ```
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        let DbError::UniqueViolation { field } = self else {
            return false;
        };
        field.split(',').map(str::trim).any(|qualified| {
            qualified
                .rsplit_once('.')
                .map_or(qualified, |(_, name)| name)
                == column
        })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) => {
                let message = db_err.message();
                // SQLite reports "UNIQUE constraint failed: orders.bill_number"
                if let Some(field) = message.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                    }
                } else if message.starts_with("CHECK constraint failed")
                    || message.starts_with("NOT NULL constraint failed")
                    || message.starts_with("FOREIGN KEY constraint failed")
                {
                    DbError::ConstraintViolation(message.to_string())
                } else {
                    DbError::QueryFailed(message.to_string())
                }
            }
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool closed".to_string()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                DbError::Corrupt(err.to_string())
            }
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Corrupt(err.to_string())
    }
}
