//! Translation of driver errors into the shared error kinds. Nothing outside
//! this crate ever sees a `rusqlite::Error`.

use courier_types::error::{Error, Result};
use rusqlite::ErrorCode;
use rusqlite::ffi;
use tracing::error;

/// Which constraint a failed statement tripped over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Unique,
    ForeignKey,
    Other,
}

/// Classify a constraint violation, or `None` for any other failure.
pub fn constraint_of(err: &rusqlite::Error) -> Option<Constraint> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
            Some(match e.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Constraint::Unique
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Constraint::ForeignKey,
                _ => Constraint::Other,
            })
        }
        _ => None,
    }
}

/// Fallback mapping for failures that have no more specific meaning to the
/// caller.
pub fn unavailable(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
        {
            error!("Store busy past timeout: {}", err);
            Error::StoreUnavailable("timed out waiting for the store".into())
        }
        _ => {
            error!("Store failure: {}", err);
            Error::StoreUnavailable(err.to_string())
        }
    }
}

/// Extension trait for driver results
pub trait StoreResultExt<T> {
    /// Map any failure to `StoreUnavailable`.
    fn store(self) -> Result<T>;

    /// Turn "no rows" into `None`, everything else as `store`.
    fn optional(self) -> Result<Option<T>>;
}

impl<T> StoreResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn store(self) -> Result<T> {
        self.map_err(unavailable)
    }

    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(unavailable(e)),
        }
    }
}
