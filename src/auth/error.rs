use axum::http::StatusCode;

/// Failures surfaced by the credential store, hasher and token issuer.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user already exists")]
    DuplicateUser,

    /// Covers both an unknown email and a wrong password.
    #[error("invalid credentials")]
    AuthenticationFailed,

    #[error("credential store unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
}

impl AuthError {
    /// Maps a driver error, turning a UNIQUE violation into `DuplicateUser`.
    pub(crate) fn from_insert(e: sqlx::Error) -> Self {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AuthError::DuplicateUser;
            }
        }
        AuthError::StorageUnavailable(e)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateUser => StatusCode::CONFLICT,
            AuthError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            AuthError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Hashing(_) | AuthError::Token(_) | AuthError::ExpiryOutOfRange => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::StorageUnavailable(e)
    }
}
