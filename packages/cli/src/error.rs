// ABOUTME: Error type for CLI setup
// ABOUTME: Bad settings and user input, plus auth failures hit while wiring the session manager

use dorxl_auth::AuthError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

/// True when any cause in the chain is an auth failure worth retrying
pub fn is_retryable(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<AuthError>()
            .is_some_and(AuthError::is_retryable)
            || matches!(cause.downcast_ref::<CliError>(), Some(CliError::Auth(e)) if e.is_retryable())
    })
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Unknown store backend '{0}' (expected sqlite, json or memory)")]
    UnknownStore(String),

    #[error("Invalid phone number '{0}': expected 628 followed by digits, 10-14 digits total")]
    InvalidNumber(String),

    #[error("'{0}' is not a subscriber number")]
    NotANumber(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}
