use thiserror::Error;

/// Failures of the session layer and the stores behind it.
///
/// `InvalidToken` deliberately covers malformed, forged, unknown and revoked
/// tokens alike. `ExpiredToken` is kept apart so a client can refresh
/// silently instead of sending the user back to the login form.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("username already exists")]
    UsernameTaken,
    #[error("user no longer exists")]
    IdentityNotFound,
    #[error("token store failure: {0}")]
    StoreFailure(String),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("signing secret is not configured")]
    MissingSecret,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<sqlx::Error> for AuthError {
    fn from(error: sqlx::Error) -> Self {
        AuthError::StoreFailure(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AuthError::PasswordHash(error.to_string())
    }
}
