use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds shared by the stores, the access policy and the session
/// issuer. The HTTP layer owns the single mapping from these to statuses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    DuplicateIdentity(String),

    #[error("unknown referenced user: {0}")]
    ReferentialViolation(String),

    #[error("forbidden")]
    Forbidden,

    #[error("unauthenticated")]
    Unauthenticated,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures caused by the server side rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::StoreUnavailable(_) | Error::Internal(_))
    }
}
