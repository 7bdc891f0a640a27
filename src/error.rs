use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CheckinError>;

#[derive(Debug, Error)]
pub enum CheckinError {
    #[error("target date {target_date} must be after start date {start_date}")]
    InvalidRange {
        start_date: NaiveDate,
        target_date: NaiveDate,
    },

    #[error("target value must be a non-zero finite number")]
    InvalidTarget,

    #[error("current value {0} is not a finite number")]
    InvalidCurrent(f64),

    #[error("overall rating {0} is outside 1..=10")]
    InvalidRating(i32),

    /// A uniqueness constraint rejected the insert; a concurrent writer got there first.
    #[error("{entity} already exists for {key}")]
    Conflict { entity: &'static str, key: String },

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),
}

impl CheckinError {
    /// Sorts a driver error into the conflict signal or a plain I/O failure.
    pub fn from_store(err: sqlx::Error, entity: &'static str, key: impl Into<String>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return CheckinError::Conflict {
                    entity,
                    key: key.into(),
                };
            }
        }
        CheckinError::StoreUnavailable(err)
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CheckinError::Conflict { .. })
    }
}

impl From<sqlx::Error> for CheckinError {
    fn from(err: sqlx::Error) -> Self {
        CheckinError::StoreUnavailable(err)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::error::{DatabaseError, ErrorKind};

    use super::*;

    #[test]
    fn non_database_errors_are_unavailable() {
        let err = CheckinError::from_store(sqlx::Error::PoolTimedOut, "weekly session", "2026-01-06");
        assert!(matches!(err, CheckinError::StoreUnavailable(_)));
        assert!(!err.is_conflict());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("{message}")]
    struct FakeDbError {
        message: &'static str,
        unique: bool,
    }

    impl DatabaseError for FakeDbError {
        fn message(&self) -> &str {
            self.message
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            if self.unique {
                ErrorKind::UniqueViolation
            } else {
                ErrorKind::ForeignKeyViolation
            }
        }
    }

    fn database_error(unique: bool) -> sqlx::Error {
        sqlx::Error::Database(Box::new(FakeDbError {
            message: "constraint violated",
            unique,
        }))
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err = CheckinError::from_store(database_error(true), "check-in", "u/s");
        assert!(err.is_conflict());
        match err {
            CheckinError::Conflict { entity, key } => {
                assert_eq!(entity, "check-in");
                assert_eq!(key, "u/s");
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn foreign_key_violation_stays_unavailable() {
        let err = CheckinError::from_store(database_error(false), "check-in", "u/s");
        assert!(!err.is_conflict());
        assert!(matches!(err, CheckinError::StoreUnavailable(sqlx::Error::Database(_))));
    }

    #[test]
    fn conflict_message_names_entity_and_key() {
        let err = CheckinError::Conflict {
            entity: "weekly session",
            key: "2026-01-06".to_string(),
        };
        assert_eq!(err.to_string(), "weekly session already exists for 2026-01-06");
        assert!(err.is_conflict());
    }
}
