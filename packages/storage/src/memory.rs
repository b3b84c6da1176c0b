// ABOUTME: In-process AccountStore used by tests and embedders without disk access
// ABOUTME: Can also simulate an unconfigured backend that rejects every call

use async_trait::async_trait;
use dorxl_core::{AccountEntry, AccountRecord};
use std::sync::{Mutex, MutexGuard};

use crate::{
    error::{StorageError, StorageResult},
    store::AccountStore,
};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: Vec<AccountRecord>,
    active_number: Option<String>,
    writes: usize,
}

/// Account store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    unavailable: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with raw records, including ones a real backend might hold in a damaged state
    pub fn with_records(records: Vec<AccountRecord>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                accounts: records,
                ..Default::default()
            }),
            unavailable: false,
        }
    }

    pub fn with_accounts(accounts: Vec<AccountEntry>) -> Self {
        Self::with_records(accounts.into_iter().map(AccountRecord::from).collect())
    }

    /// A backend that behaves like a missing configuration
    pub fn unavailable() -> Self {
        Self {
            state: Mutex::default(),
            unavailable: true,
        }
    }

    /// Current stored list, validated
    pub fn accounts(&self) -> Vec<AccountEntry> {
        self.lock()
            .map(|state| {
                state
                    .accounts
                    .iter()
                    .cloned()
                    .filter_map(|record| record.into_entry().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn active_number(&self) -> Option<String> {
        self.lock().ok().and_then(|state| state.active_number.clone())
    }

    /// Number of successful write calls
    pub fn write_count(&self) -> usize {
        self.lock().map(|state| state.writes).unwrap_or_default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, MemoryState>> {
        if self.unavailable {
            return Err(StorageError::Unavailable(
                "memory store configured as unavailable".to_string(),
            ));
        }
        self.state
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn get_account_list(&self) -> StorageResult<Vec<AccountRecord>> {
        Ok(self.lock()?.accounts.clone())
    }

    async fn replace_account_list(&self, accounts: &[AccountEntry]) -> StorageResult<()> {
        let mut state = self.lock()?;
        state.accounts = accounts.iter().cloned().map(AccountRecord::from).collect();
        state.writes += 1;
        Ok(())
    }

    async fn get_active_number(&self) -> StorageResult<Option<String>> {
        Ok(self.lock()?.active_number.clone())
    }

    async fn set_active_number(&self, number: &str) -> StorageResult<()> {
        let mut state = self.lock()?;
        state.active_number = Some(number.trim().to_string()).filter(|n| !n.is_empty());
        state.writes += 1;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
