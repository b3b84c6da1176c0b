// ABOUTME: Persistence backend trait for the account list and active pointer
// ABOUTME: Implemented by MemoryStore, JsonFileStore and SqliteStore

use async_trait::async_trait;
use dorxl_core::{AccountEntry, AccountRecord};
use std::sync::Arc;

use crate::error::StorageResult;

/// Key-value persistence for linked accounts
///
/// Implementations must treat "nothing stored yet" as empty results, never as
/// an error, so a fresh install starts with zero accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Stored accounts in insertion order, unvalidated
    async fn get_account_list(&self) -> StorageResult<Vec<AccountRecord>>;

    /// Replace the whole stored list
    async fn replace_account_list(&self, accounts: &[AccountEntry]) -> StorageResult<()>;

    /// Active-account pointer, `None` when unset or blank
    async fn get_active_number(&self) -> StorageResult<Option<String>>;

    /// Set the active-account pointer; an empty string clears it
    async fn set_active_number(&self, number: &str) -> StorageResult<()>;

    /// Short backend name for logs and status output
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: AccountStore + ?Sized> AccountStore for Arc<T> {
    async fn get_account_list(&self) -> StorageResult<Vec<AccountRecord>> {
        (**self).get_account_list().await
    }

    async fn replace_account_list(&self, accounts: &[AccountEntry]) -> StorageResult<()> {
        (**self).replace_account_list(accounts).await
    }

    async fn get_active_number(&self) -> StorageResult<Option<String>> {
        (**self).get_active_number().await
    }

    async fn set_active_number(&self, number: &str) -> StorageResult<()> {
        (**self).set_active_number(number).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
