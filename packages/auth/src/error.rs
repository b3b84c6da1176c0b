// ABOUTME: Error types for session and token management
// ABOUTME: Separates exchange, lookup, persistence and profile failures so callers can pick a policy

use dorxl_security::EncryptionError;
use dorxl_storage::StorageError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Exchange endpoint rejected the refresh token or could not be reached
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("No account found for number {0}")]
    AccountNotFound(u64),

    #[error("Persistence backend unavailable: {0}")]
    PersistenceUnavailable(String),

    /// Profile lookup failed after a successful exchange; the tokens are still usable
    #[error("Profile lookup failed: {0}")]
    ProfileFetch(String),

    #[error("No active session")]
    NoActiveSession,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => AuthError::PersistenceUnavailable(msg),
            other => AuthError::Storage(other),
        }
    }
}

impl AuthError {
    /// Failures worth offering the user a retry for
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExchange(_) | AuthError::ProfileFetch(_) | AuthError::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_storage_maps_to_persistence_unavailable() {
        let err: AuthError = StorageError::Unavailable("no config".to_string()).into();
        assert!(matches!(err, AuthError::PersistenceUnavailable(_)));

        let err: AuthError = StorageError::InvalidData("bad".to_string()).into();
        assert!(matches!(err, AuthError::Storage(_)));
    }

    #[test]
    fn test_retryable_errors() {
        assert!(AuthError::TokenExchange("401".to_string()).is_retryable());
        assert!(!AuthError::AccountNotFound(1).is_retryable());
        assert!(!AuthError::NoActiveSession.is_retryable());
    }
}
