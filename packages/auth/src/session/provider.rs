// ABOUTME: Seams to the external identity provider
// ABOUTME: TokenExchange trades a refresh token for a grant; ProfileService resolves subscriber identity

use async_trait::async_trait;

use crate::{
    error::AuthResult,
    session::types::{SubscriberProfile, TokenGrant, TokenSet},
};

#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Exchange `refresh_token` for a new token grant
    ///
    /// `subscriber_hint` may be empty (first login for a number). Any failure,
    /// including transport errors, is reported as `AuthError::TokenExchange`.
    async fn exchange(&self, refresh_token: &str, subscriber_hint: &str)
        -> AuthResult<TokenGrant>;
}

#[async_trait]
pub trait ProfileService: Send + Sync {
    /// Look up the subscriber behind `tokens`; failures are `AuthError::ProfileFetch`
    async fn fetch_profile(&self, tokens: &TokenSet) -> AuthResult<SubscriberProfile>;
}
