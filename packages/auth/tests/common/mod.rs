// ABOUTME: Shared fakes for session manager integration tests
// ABOUTME: Scripted token exchange and profile services that record every call

#![allow(dead_code)]

use async_trait::async_trait;
use dorxl_auth::{
    AuthError, AuthResult, ManualClock, ProfileService, SessionCache, SessionManager,
    SessionSettings, SubscriberProfile, TokenExchange, TokenGrant, TokenSet,
};
use dorxl_core::SubscriptionType;
use dorxl_security::TokenEncryption;
use dorxl_storage::MemoryStore;
use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
};

pub const START: i64 = 1_700_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeCall {
    pub refresh_token: String,
    pub subscriber_hint: String,
}

/// Token exchange that replays queued outcomes, then issues numbered grants
#[derive(Default)]
pub struct FakeExchange {
    scripted: Mutex<VecDeque<Result<TokenGrant, String>>>,
    calls: Mutex<Vec<ExchangeCall>>,
    failing: Mutex<bool>,
}

impl FakeExchange {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_grant(&self, grant: TokenGrant) {
        self.scripted.lock().unwrap().push_back(Ok(grant));
    }

    pub fn push_failure(&self, reason: &str) {
        self.scripted.lock().unwrap().push_back(Err(reason.to_string()));
    }

    /// Fail every unscripted call until reset
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn calls(&self) -> Vec<ExchangeCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenExchange for FakeExchange {
    async fn exchange(
        &self,
        refresh_token: &str,
        subscriber_hint: &str,
    ) -> AuthResult<TokenGrant> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ExchangeCall {
                refresh_token: refresh_token.to_string(),
                subscriber_hint: subscriber_hint.to_string(),
            });
            calls.len()
        };

        if let Some(outcome) = self.scripted.lock().unwrap().pop_front() {
            return outcome.map_err(AuthError::TokenExchange);
        }
        if *self.failing.lock().unwrap() {
            return Err(AuthError::TokenExchange("status 401".to_string()));
        }

        Ok(grant(
            &format!("access-{}", call_number),
            &format!("rt-{}", call_number),
            3600,
        ))
    }
}

/// Profile service that replays queued outcomes, then returns a default profile
#[derive(Default)]
pub struct FakeProfiles {
    scripted: Mutex<VecDeque<Result<SubscriberProfile, String>>>,
    seen_access_tokens: Mutex<Vec<String>>,
}

impl FakeProfiles {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_profile(&self, subscriber_id: &str, subscription_type: &str) {
        self.scripted.lock().unwrap().push_back(Ok(SubscriberProfile {
            subscriber_id: subscriber_id.to_string(),
            subscription_type: SubscriptionType::from(subscription_type),
        }));
    }

    pub fn push_failure(&self, reason: &str) {
        self.scripted.lock().unwrap().push_back(Err(reason.to_string()));
    }

    pub fn call_count(&self) -> usize {
        self.seen_access_tokens.lock().unwrap().len()
    }
}

#[async_trait]
impl ProfileService for FakeProfiles {
    async fn fetch_profile(&self, tokens: &TokenSet) -> AuthResult<SubscriberProfile> {
        self.seen_access_tokens
            .lock()
            .unwrap()
            .push(tokens.access_token.clone());

        match self.scripted.lock().unwrap().pop_front() {
            Some(outcome) => outcome.map_err(AuthError::ProfileFetch),
            None => Ok(SubscriberProfile {
                subscriber_id: "SUB-DEFAULT".to_string(),
                subscription_type: SubscriptionType::Prepaid,
            }),
        }
    }
}

pub fn grant(access_token: &str, refresh_token: &str, expires_in: i64) -> TokenGrant {
    TokenGrant {
        access_token: access_token.to_string(),
        id_token: format!("id-{}", access_token),
        refresh_token: Some(refresh_token.to_string()),
        expires_in,
    }
}

pub fn test_cache(dir: &Path) -> SessionCache {
    let encryption = TokenEncryption::with_key(&[9u8; 32]).unwrap();
    SessionCache::new(dir.join("active_session.enc"), encryption)
}

/// Everything a test needs to drive and inspect a manager
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub exchange: Arc<FakeExchange>,
    pub profiles: Arc<FakeProfiles>,
    pub clock: Arc<ManualClock>,
    pub cache: Option<SessionCache>,
}

impl Harness {
    pub fn new(store: MemoryStore) -> Self {
        Self {
            store: Arc::new(store),
            exchange: FakeExchange::new(),
            profiles: FakeProfiles::new(),
            clock: Arc::new(ManualClock::new(START)),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: SessionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// A fresh manager over the same store, cache and fakes, as after a restart
    pub fn manager(&self) -> SessionManager {
        let mut builder = SessionManager::builder(
            Box::new(self.store.clone()),
            self.exchange.clone(),
            self.profiles.clone(),
        )
        .settings(SessionSettings::default())
        .clock(self.clock.clone());
        if let Some(cache) = &self.cache {
            builder = builder.cache(cache.clone());
        }
        builder.build()
    }
}
