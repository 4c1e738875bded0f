//! Conversions from external infrastructure errors into domain errors.

use leadsync_common::storage::StorageError;
use leadsync_domain::LeadSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub LeadSyncError);

impl From<InfraError> for LeadSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<LeadSyncError> for InfraError {
    fn from(value: LeadSyncError) -> Self {
        Self(value)
    }
}

/// Explicit conversion into [`LeadSyncError`], usable in `map_err`.
pub trait IntoLeadSyncError {
    fn into_leadsync(self) -> LeadSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for SqlError {
    fn into_leadsync(self) -> LeadSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => LeadSyncError::Store("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        LeadSyncError::Store("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        LeadSyncError::Store(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        LeadSyncError::Store("foreign key constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        LeadSyncError::Store(format!("check constraint violation: {message}"))
                    }
                    _ => LeadSyncError::Store(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => LeadSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                LeadSyncError::Store(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                LeadSyncError::Store(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => LeadSyncError::Store("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidQuery => LeadSyncError::Store("invalid SQL query".into()),
            other => LeadSyncError::Store(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        Self(value.into_leadsync())
    }
}

/* -------------------------------------------------------------------------- */
/* StorageError → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for StorageError {
    fn into_leadsync(self) -> LeadSyncError {
        match self {
            StorageError::Rusqlite(err) => err.into_leadsync(),
            StorageError::InvalidConfig(msg) => LeadSyncError::Config(msg),
            StorageError::PoolExhausted => {
                LeadSyncError::Store("connection pool exhausted".into())
            }
            other => LeadSyncError::Store(other.to_string()),
        }
    }
}

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        Self(value.into_leadsync())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → LeadSyncError */
/* -------------------------------------------------------------------------- */

impl IntoLeadSyncError for HttpError {
    fn into_leadsync(self) -> LeadSyncError {
        if self.is_timeout() {
            return LeadSyncError::Provider("HTTP request timed out".into());
        }

        if self.is_connect() {
            return LeadSyncError::Provider("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 => LeadSyncError::Auth(message),
                _ => LeadSyncError::Provider(message),
            };
        }

        if self.is_decode() {
            return LeadSyncError::Provider(format!("malformed provider response: {self}"));
        }

        LeadSyncError::Provider(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        Self(value.into_leadsync())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
