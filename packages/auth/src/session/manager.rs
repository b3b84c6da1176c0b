// ABOUTME: SessionManager owns the linked accounts and the single active session
// ABOUTME: Handles activation, throttled refresh, removal promotion and restore after restart

use dorxl_core::AccountEntry;
use dorxl_storage::AccountStore;
use std::{collections::HashSet, sync::Arc};
use tracing::{debug, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    session::{
        cache::SessionCache,
        clock::{Clock, SystemClock},
        provider::{ProfileService, TokenExchange},
        settings::SessionSettings,
        types::{
            AccountSummary, ActiveSession, RemoveOutcome, SessionSnapshot, TokenGrant, TokenSet,
        },
    },
};

/// Builder for [`SessionManager`]
pub struct SessionManagerBuilder {
    store: Box<dyn AccountStore>,
    exchange: Arc<dyn TokenExchange>,
    profiles: Arc<dyn ProfileService>,
    cache: Option<SessionCache>,
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
}

impl SessionManagerBuilder {
    /// Keep an encrypted snapshot of the active session on disk
    pub fn cache(mut self, cache: SessionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Build an empty manager; call [`SessionManager::initialize`] to load state
    pub fn build(self) -> SessionManager {
        SessionManager {
            accounts: Vec::new(),
            active: None,
            last_refresh_at: None,
            store: self.store,
            exchange: self.exchange,
            profiles: self.profiles,
            cache: self.cache,
            settings: self.settings,
            clock: self.clock,
        }
    }
}

/// Linked subscriber accounts plus at most one active session
///
/// Mutating operations take `&mut self`; hosts that share the manager across
/// tasks wrap it in a `tokio::sync::Mutex`. Persistence is write-through but
/// best-effort: a failed write is logged and the in-memory state stays ahead of
/// the backend until the next successful write.
pub struct SessionManager {
    accounts: Vec<AccountEntry>,
    active: Option<ActiveSession>,
    last_refresh_at: Option<i64>,
    store: Box<dyn AccountStore>,
    exchange: Arc<dyn TokenExchange>,
    profiles: Arc<dyn ProfileService>,
    cache: Option<SessionCache>,
    settings: SessionSettings,
    clock: Arc<dyn Clock>,
}

impl SessionManager {
    pub fn builder(
        store: Box<dyn AccountStore>,
        exchange: Arc<dyn TokenExchange>,
        profiles: Arc<dyn ProfileService>,
    ) -> SessionManagerBuilder {
        SessionManagerBuilder {
            store,
            exchange,
            profiles,
            cache: None,
            settings: SessionSettings::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Load accounts and restore the session named by the stored active pointer
    ///
    /// A matching, unexpired snapshot is reused without a network call; otherwise
    /// the account is activated. Activation failures leave the manager without a
    /// session instead of failing startup.
    pub async fn initialize(&mut self) {
        self.active = None;
        self.last_refresh_at = None;
        self.load_accounts().await;

        let pointer = match self.store.get_active_number().await {
            Ok(pointer) => pointer,
            Err(e) => {
                warn!("Could not read active account pointer: {}", e);
                None
            }
        };
        let Some(pointer) = pointer else {
            debug!("No active account recorded");
            return;
        };
        let Ok(number) = pointer.trim().parse::<u64>() else {
            warn!("Ignoring malformed active account pointer {:?}", pointer);
            return;
        };
        if !self.contains(number) {
            warn!("Active account {} is no longer linked", number);
            return;
        }

        let now = self.clock.now();
        if let Some(snapshot) = self.fresh_snapshot(now).await {
            if snapshot.number == number {
                self.restore_from_snapshot(snapshot, now).await;
                return;
            }
        }

        if let Err(e) = self.activate(number).await {
            warn!("Could not activate account {} at startup: {}", number, e);
        }
    }

    /// Re-read everything from the backend, e.g. after another process linked an account
    pub async fn reload(&mut self) {
        self.initialize().await;
    }

    /// Replace the in-memory list with the backend's, dropping invalid records
    ///
    /// Returns the number of accounts loaded. An unavailable backend yields zero.
    pub async fn load_accounts(&mut self) -> usize {
        let records = match self.store.get_account_list().await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Account store ({}) unavailable, continuing with no accounts: {}",
                    self.store.backend_name(),
                    e
                );
                Vec::new()
            }
        };

        let mut seen = HashSet::new();
        let mut accounts = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            match record.into_entry() {
                Ok(entry) if seen.insert(entry.number) => accounts.push(entry),
                Ok(entry) => warn!(
                    "Dropping duplicate stored account {} at position {}",
                    entry.number, position
                ),
                Err(missing) => warn!(
                    "Dropping stored account at position {}: {}",
                    position, missing
                ),
            }
        }
        self.accounts = accounts;

        if let Some(number) = self.active.as_ref().map(|session| session.number) {
            if !self.contains(number) {
                debug!("Active account {} vanished from the store", number);
                self.active = None;
                self.last_refresh_at = None;
            }
        }

        debug!("Loaded {} accounts", self.accounts.len());
        self.accounts.len()
    }

    /// Link a new account or update the refresh token of an existing one, then activate it
    pub async fn add_or_replace_account(
        &mut self,
        number: u64,
        refresh_token: &str,
    ) -> AuthResult<()> {
        let refresh_token = refresh_token.trim();
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidInput(
                "refresh token must not be empty".to_string(),
            ));
        }

        if let Some(entry) = self.entry_mut(number) {
            entry.refresh_token = refresh_token.to_string();
            info!("Updated refresh token for account {}", number);
            self.persist_accounts().await;
            return self.activate(number).await;
        }

        let issued_at = self.clock.now();
        let grant = self.exchange_token(refresh_token, "").await?;
        let tokens = TokenSet::from_grant(
            grant,
            refresh_token,
            issued_at,
            self.settings.refresh_margin_secs,
        );

        info!("Linked new account {}", number);
        self.install_session(AccountEntry::new(number, refresh_token), tokens, issued_at)
            .await;
        Ok(())
    }

    /// Remove an account, promoting the first remaining one if it was active
    pub async fn remove_account(&mut self, number: u64) -> AuthResult<RemoveOutcome> {
        let Some(position) = self.accounts.iter().position(|e| e.number == number) else {
            debug!("Account {} not linked, nothing to remove", number);
            return Ok(RemoveOutcome::NotFound);
        };

        self.accounts.remove(position);
        info!("Removed account {}", number);
        self.persist_accounts().await;
        self.drop_snapshot_for(number).await;

        if !self.is_active(number) {
            return Ok(RemoveOutcome::Removed);
        }

        self.active = None;
        self.last_refresh_at = None;

        let Some(next) = self.accounts.first().map(|entry| entry.number) else {
            self.persist_active_pointer(None).await;
            info!("No accounts left after removing {}", number);
            return Ok(RemoveOutcome::NoAccountsLeft);
        };

        match self.activate(next).await {
            Ok(()) => Ok(RemoveOutcome::Promoted(next)),
            Err(e) => {
                warn!("Could not promote account {}: {}", next, e);
                self.persist_active_pointer(None).await;
                Ok(RemoveOutcome::PromotionFailed {
                    number: next,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Exchange the account's refresh token and make it the active session
    ///
    /// On failure the current session, if any, is left untouched.
    pub async fn activate(&mut self, number: u64) -> AuthResult<()> {
        let entry = self
            .accounts
            .iter()
            .find(|entry| entry.number == number)
            .cloned()
            .ok_or(AuthError::AccountNotFound(number))?;

        let issued_at = self.clock.now();
        let grant = self
            .exchange_token(&entry.refresh_token, &entry.subscriber_id)
            .await?;
        let tokens = TokenSet::from_grant(
            grant,
            &entry.refresh_token,
            issued_at,
            self.settings.refresh_margin_secs,
        );

        self.install_session(entry, tokens, issued_at).await;
        info!("Activated account {}", number);
        Ok(())
    }

    /// Tokens of the active session, refreshed when close to expiry or throttle elapsed
    ///
    /// Restores a session first if there is none. Never fails: refresh errors
    /// are logged and the previous tokens are returned.
    pub async fn get_active_tokens(&mut self) -> Option<TokenSet> {
        if self.active.is_none() && !self.restore_session().await {
            return None;
        }

        let now = self.clock.now();
        let tokens = self.active.as_ref()?.tokens.clone();
        if self.can_skip_refresh(&tokens, now) {
            return Some(tokens);
        }

        match self.refresh_active(now).await {
            Ok(tokens) => Some(tokens),
            Err(e) => {
                warn!("Token refresh failed, returning previous tokens: {}", e);
                Some(tokens)
            }
        }
    }

    /// Refresh the active session now, regardless of freshness or throttle
    pub async fn renew_active_tokens(&mut self) -> AuthResult<TokenSet> {
        if self.active.is_none() {
            return Err(AuthError::NoActiveSession);
        }
        let now = self.clock.now();
        self.refresh_active(now).await
    }

    pub fn get_active_account_summary(&self) -> Option<AccountSummary> {
        self.active.as_ref().map(|session| AccountSummary {
            number: session.number,
            subscription_type: session.subscription_type.clone(),
        })
    }

    pub fn accounts(&self) -> &[AccountEntry] {
        &self.accounts
    }

    pub fn active_session(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub fn is_active(&self, number: u64) -> bool {
        self.active
            .as_ref()
            .is_some_and(|session| session.number == number)
    }

    /// When a refresh was last attempted, successful or not
    pub fn last_refresh_at(&self) -> Option<i64> {
        self.last_refresh_at
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn contains(&self, number: u64) -> bool {
        self.accounts.iter().any(|entry| entry.number == number)
    }

    fn entry_mut(&mut self, number: u64) -> Option<&mut AccountEntry> {
        self.accounts.iter_mut().find(|entry| entry.number == number)
    }

    fn upsert_entry(&mut self, entry: AccountEntry) {
        match self.entry_mut(entry.number) {
            Some(existing) => *existing = entry,
            None => self.accounts.push(entry),
        }
    }

    fn can_skip_refresh(&self, tokens: &TokenSet, now: i64) -> bool {
        let throttled = self
            .last_refresh_at
            .map_or(true, |at| now - at <= self.settings.refresh_interval_secs);
        tokens.is_fresh(now, self.settings.refresh_margin_secs) && throttled
    }

    /// Exchange with every failure reported as `TokenExchange`
    async fn exchange_token(
        &self,
        refresh_token: &str,
        subscriber_hint: &str,
    ) -> AuthResult<TokenGrant> {
        self.exchange
            .exchange(refresh_token, subscriber_hint)
            .await
            .map_err(|e| match e {
                AuthError::TokenExchange(msg) => AuthError::TokenExchange(msg),
                other => AuthError::TokenExchange(other.to_string()),
            })
    }

    /// Confirm the profile, store the entry and make it the active session
    async fn install_session(
        &mut self,
        mut entry: AccountEntry,
        tokens: TokenSet,
        refreshed_at: i64,
    ) {
        match self.profiles.fetch_profile(&tokens).await {
            Ok(profile) => {
                entry.subscriber_id = profile.subscriber_id;
                entry.subscription_type = profile.subscription_type;
            }
            Err(e) => warn!(
                "Profile lookup for {} failed, keeping previous identity: {}",
                entry.number, e
            ),
        }
        entry.refresh_token = tokens.refresh_token.clone();

        let number = entry.number;
        self.active = Some(ActiveSession {
            number,
            subscriber_id: entry.subscriber_id.clone(),
            subscription_type: entry.subscription_type.clone(),
            tokens,
        });
        self.upsert_entry(entry);
        self.last_refresh_at = Some(refreshed_at);

        self.persist_accounts().await;
        self.persist_active_pointer(Some(number)).await;
        self.write_snapshot().await;
    }

    async fn refresh_active(&mut self, now: i64) -> AuthResult<TokenSet> {
        let (number, refresh_token, subscriber_id) = match self.active.as_ref() {
            Some(session) => (
                session.number,
                session.tokens.refresh_token.clone(),
                session.subscriber_id.clone(),
            ),
            None => return Err(AuthError::NoActiveSession),
        };

        self.last_refresh_at = Some(now);
        let grant = self.exchange_token(&refresh_token, &subscriber_id).await?;
        let tokens = TokenSet::from_grant(
            grant,
            &refresh_token,
            now,
            self.settings.refresh_margin_secs,
        );

        if let Some(session) = self.active.as_mut() {
            session.tokens = tokens.clone();
        }
        if let Some(entry) = self.entry_mut(number) {
            entry.refresh_token = tokens.refresh_token.clone();
        }

        self.persist_accounts().await;
        self.write_snapshot().await;
        debug!("Refreshed tokens for account {}", number);
        Ok(tokens)
    }

    /// Restore from snapshot, else activate the first account
    async fn restore_session(&mut self) -> bool {
        let now = self.clock.now();
        if let Some(snapshot) = self.fresh_snapshot(now).await {
            self.restore_from_snapshot(snapshot, now).await;
            return true;
        }

        let Some(first) = self.accounts.first().map(|entry| entry.number) else {
            return false;
        };
        match self.activate(first).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not activate account {}: {}", first, e);
                false
            }
        }
    }

    async fn restore_from_snapshot(&mut self, snapshot: SessionSnapshot, now: i64) {
        let session = snapshot.into_session();
        if !self.contains(session.number) {
            self.accounts.push(AccountEntry {
                number: session.number,
                subscriber_id: session.subscriber_id.clone(),
                subscription_type: session.subscription_type.clone(),
                refresh_token: session.tokens.refresh_token.clone(),
            });
            self.persist_accounts().await;
        }

        info!("Restored session for account {} from cache", session.number);
        self.active = Some(session);
        self.last_refresh_at = Some(now);
    }

    async fn fresh_snapshot(&self, now: i64) -> Option<SessionSnapshot> {
        self.cache.as_ref()?.load_fresh(now).await
    }

    async fn drop_snapshot_for(&self, number: u64) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        if cache.load().await.is_some_and(|snapshot| snapshot.number == number) {
            if let Err(e) = cache.clear().await {
                warn!("Failed to clear session cache: {}", e);
            }
        }
    }

    async fn persist_accounts(&self) {
        if let Err(e) = self.store.replace_account_list(&self.accounts).await {
            warn!(
                "Failed to persist account list to {} store: {}",
                self.store.backend_name(),
                e
            );
        }
    }

    async fn persist_active_pointer(&self, number: Option<u64>) {
        let value = number.map(|n| n.to_string()).unwrap_or_default();
        if let Err(e) = self.store.set_active_number(&value).await {
            warn!(
                "Failed to persist active account to {} store: {}",
                self.store.backend_name(),
                e
            );
        }
    }

    async fn write_snapshot(&self) {
        let (Some(cache), Some(session)) = (self.cache.as_ref(), self.active.as_ref()) else {
            return;
        };
        if let Err(e) = cache.save(&SessionSnapshot::from(session)).await {
            warn!("Failed to write session cache: {}", e);
        }
    }
}
