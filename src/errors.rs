use sea_orm::{
    error::{DbErr, RuntimeErr, SqlErr},
    sqlx,
};

/// Error returned by every catalog service call.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Unique-key violation, or a delete blocked by rows that still reference the target.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Foreign key that does not resolve to an existing row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Bulk load error: {0}")]
    BulkLoadError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => ServiceError::Conflict(msg),
            Some(SqlErr::ForeignKeyConstraintViolation(msg)) => {
                ServiceError::ConstraintViolation(msg)
            }
            _ => match sqlite_restrict_violation(&err) {
                Some(msg) => ServiceError::ConstraintViolation(msg),
                None => ServiceError::DatabaseError(err),
            },
        }
    }
}

/// SQLite reports `ON DELETE/UPDATE RESTRICT` as SQLITE_CONSTRAINT_TRIGGER (1811)
/// rather than SQLITE_CONSTRAINT_FOREIGNKEY (787), which `sql_err` does not map.
fn sqlite_restrict_violation(err: &DbErr) -> Option<String> {
    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => {
            (e.code().as_deref() == Some(SQLITE_CONSTRAINT_TRIGGER)).then(|| e.message().to_string())
        }
        _ => None,
    }
}

const SQLITE_CONSTRAINT_TRIGGER: &str = "1811";

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        let record = err
            .position()
            .map(|pos| format!(" (line {})", pos.line()))
            .unwrap_or_default();
        ServiceError::BulkLoadError(format!("{}{}", err, record))
    }
}

impl ServiceError {
    /// Classifies an engine error. Usable directly in `map_err`.
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::from(error)
    }

    /// Constraint violations caused by the caller's data rather than the engine.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::ConstraintViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn custom_db_errors_stay_database_errors() {
        let err = ServiceError::db_error(DbErr::Custom("connection reset".into()));
        assert_matches!(err, ServiceError::DatabaseError(DbErr::Custom(msg)) if msg == "connection reset");
    }

    #[test]
    fn display_includes_context() {
        let err = ServiceError::InvalidStatus("Sold -> InStock".into());
        assert_eq!(err.to_string(), "Invalid status: Sold -> InStock");
        assert!(!err.is_constraint_violation());
        assert!(ServiceError::Conflict("sku".into()).is_constraint_violation());
    }
}
