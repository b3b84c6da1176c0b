use crate::error::{is_retryable, CliError};
use anyhow::{anyhow, Context};
use dorxl_auth::AuthError;

#[test]
fn test_exchange_failures_are_retryable() {
    let err = anyhow::Error::from(AuthError::TokenExchange("status 503".to_string()));
    assert!(is_retryable(&err));

    let wrapped = anyhow::Error::from(CliError::Auth(AuthError::ProfileFetch(
        "timeout".to_string(),
    )));
    assert!(is_retryable(&wrapped));
}

#[test]
fn test_retryable_cause_found_under_context() {
    let result: Result<(), AuthError> = Err(AuthError::TokenExchange("status 502".to_string()));
    let err = result.context("Failed to switch account").unwrap_err();
    assert!(is_retryable(&err));
}

#[test]
fn test_user_errors_are_not_retryable() {
    assert!(!is_retryable(&anyhow::Error::from(AuthError::AccountNotFound(628))));
    assert!(!is_retryable(&anyhow::Error::from(CliError::NotANumber(
        "abc".to_string()
    ))));
    assert!(!is_retryable(&anyhow!("No active session")));
}
