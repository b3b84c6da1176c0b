// ABOUTME: Core type definitions for subscriber sessions
// ABOUTME: Token sets, exchange grants, profiles, the active session and its durable snapshot

use dorxl_core::SubscriptionType;
use serde::{Deserialize, Serialize};

/// Live credentials for the active account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    pub id_token: String,
    pub refresh_token: String,
    /// Unix timestamp, already shortened by the refresh margin
    pub expires_at: i64,
}

impl TokenSet {
    /// Built from a fresh grant issued at `issued_at`
    ///
    /// `expires_at = issued_at + max(margin, expires_in - margin)`. A grant without
    /// a refresh token keeps `previous_refresh_token`.
    pub fn from_grant(
        grant: TokenGrant,
        previous_refresh_token: &str,
        issued_at: i64,
        margin_secs: i64,
    ) -> Self {
        let lifetime = grant.expires_in.saturating_sub(margin_secs).max(margin_secs);
        let refresh_token = grant
            .refresh_token
            .filter(|token| !token.is_empty())
            .unwrap_or_else(|| previous_refresh_token.to_string());

        Self {
            access_token: grant.access_token,
            id_token: grant.id_token,
            refresh_token,
            expires_at: issued_at.saturating_add(lifetime),
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }

    /// True while more than `margin_secs` remain before `expires_at`
    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at.saturating_sub(now) > margin_secs
    }
}

/// Successful response from the token exchange service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub id_token: String,
    /// Providers may rotate the refresh token on every exchange
    pub refresh_token: Option<String>,
    /// Declared lifetime in seconds
    pub expires_in: i64,
}

/// Subscriber identity resolved from valid tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberProfile {
    pub subscriber_id: String,
    pub subscription_type: SubscriptionType,
}

/// The selected account plus its live tokens
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub number: u64,
    pub subscriber_id: String,
    pub subscription_type: SubscriptionType,
    pub tokens: TokenSet,
}

/// What menus show about the active account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub number: u64,
    pub subscription_type: SubscriptionType,
}

/// Durable copy of the active session, used to skip a refresh right after restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub number: u64,
    #[serde(default)]
    pub subscriber_id: String,
    #[serde(default)]
    pub subscription_type: SubscriptionType,
    pub tokens: TokenSet,
    pub expires_at: i64,
}

impl SessionSnapshot {
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at.min(self.tokens.expires_at) <= now
    }

    pub fn into_session(self) -> ActiveSession {
        ActiveSession {
            number: self.number,
            subscriber_id: self.subscriber_id,
            subscription_type: self.subscription_type,
            tokens: self.tokens,
        }
    }
}

impl From<&ActiveSession> for SessionSnapshot {
    fn from(session: &ActiveSession) -> Self {
        Self {
            number: session.number,
            subscriber_id: session.subscriber_id.clone(),
            subscription_type: session.subscription_type.clone(),
            tokens: session.tokens.clone(),
            expires_at: session.tokens.expires_at,
        }
    }
}

/// Result of removing an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// No account had that number
    NotFound,
    /// An inactive account was removed
    Removed,
    /// The active account was removed and the next one took over
    Promoted(u64),
    /// The active account was removed; the next one could not be activated
    PromotionFailed { number: u64, reason: String },
    /// The last account was removed; the caller should acknowledge this with the user
    NoAccountsLeft,
}
