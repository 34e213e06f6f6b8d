//! Error taxonomy surfaced by every public operation.

use rusqlite::ErrorCode;
use thiserror::Error;

use crate::db::DbError;
use crate::models::Role;
use crate::policy::Operation;

/// Errors returned by the core.
#[derive(Error, Debug)]
pub enum CareError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Conflict: {0}")]
    Conflict(#[from] Conflict),

    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub type CareResult<T> = Result<T, CareError>;

/// Malformed input. Each variant names the rule that was violated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("credential rejected: {0}")]
    CredentialShape(String),

    #[error("phone number must be exactly 10 digits")]
    PhoneShape,

    #[error("email address `{0}` is not valid")]
    EmailShape(String),

    #[error("unknown role `{0}`")]
    UnknownRole(String),

    #[error("`{0}` is not a registered doctor")]
    UnknownDoctor(String),

    #[error("`{0}` is not a registered nurse")]
    UnknownNurse(String),

    #[error("`{0}` is not a registered patient")]
    UnknownPatient(String),

    #[error("patient `{patient}` is not under doctor `{doctor}`")]
    NotAssignedDoctor { patient: String, doctor: String },

    #[error("time {hour}:{minute:02} is out of range")]
    TimeOutOfRange { hour: u8, minute: u8 },

    #[error("`{0}` is not a valid date (expected YYYY-MM-DD)")]
    DateShape(String),

    #[error("an account cannot delete itself")]
    SelfDeletion,
}

/// Named conflicts. The operation was aborted with no partial writes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),

    #[error("an identical appointment is already booked")]
    DuplicateSlot,

    #[error("patient `{patient}` already has an entry dated {date}")]
    DuplicateDate { patient: String, date: String },

    #[error("doctor `{doctor}` still has {nurses} nurse(s) and {patients} patient(s)")]
    DependentsExist {
        doctor: String,
        nurses: usize,
        patients: usize,
    },
}

/// Authentication and authorization failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown user and wrong credential are deliberately indistinguishable.
    #[error("Invalid username or credential")]
    InvalidCredentials,

    #[error("Role {role} may not perform {operation:?}")]
    Unauthorized { role: Role, operation: Operation },

    #[error("Session has been closed")]
    SessionClosed,
}

impl From<DbError> for CareError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Sqlite(err) => classify_sqlite(err),
            DbError::Constraint(msg) => CareError::Integrity(msg),
            DbError::Timeout(msg) => CareError::StorageUnavailable(msg),
        }
    }
}

impl From<rusqlite::Error> for CareError {
    fn from(e: rusqlite::Error) -> Self {
        classify_sqlite(e)
    }
}

fn classify_sqlite(err: rusqlite::Error) -> CareError {
    match &err {
        rusqlite::Error::SqliteFailure(code, _) => match code.code {
            ErrorCode::DatabaseBusy
            | ErrorCode::DatabaseLocked
            | ErrorCode::CannotOpen
            | ErrorCode::SystemIoFailure
            | ErrorCode::NotADatabase
            | ErrorCode::DiskFull
            | ErrorCode::DatabaseCorrupt => {
                tracing::warn!(error = %err, "storage unavailable");
                CareError::StorageUnavailable(err.to_string())
            }
            ErrorCode::ConstraintViolation => CareError::Integrity(err.to_string()),
            _ => CareError::StorageUnavailable(err.to_string()),
        },
        rusqlite::Error::FromSqlConversionFailure(..)
        | rusqlite::Error::InvalidColumnType(..)
        | rusqlite::Error::IntegralValueOutOfRange(..) => CareError::Integrity(err.to_string()),
        _ => CareError::StorageUnavailable(err.to_string()),
    }
}

impl CareError {
    /// The conflict carried by this error, if any.
    pub fn conflict(&self) -> Option<&Conflict> {
        match self {
            CareError::Conflict(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CareError::Auth(AuthError::Unauthorized { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::ffi;

    #[test]
    fn test_busy_maps_to_storage_unavailable() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_BUSY), None);
        assert!(matches!(
            CareError::from(err),
            CareError::StorageUnavailable(_)
        ));
    }

    #[test]
    fn test_constraint_maps_to_integrity() {
        let err = rusqlite::Error::SqliteFailure(ffi::Error::new(ffi::SQLITE_CONSTRAINT), None);
        assert!(matches!(CareError::from(err), CareError::Integrity(_)));
    }

    #[test]
    fn test_conflict_accessor() {
        let err: CareError = Conflict::DuplicateSlot.into();
        assert_eq!(err.conflict(), Some(&Conflict::DuplicateSlot));
        assert!(!err.is_unauthorized());
    }
}
