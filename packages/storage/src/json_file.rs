// ABOUTME: JSON file account store (local_store.json)
// ABOUTME: Lenient reads of list- or index-map-shaped account data, atomic temp-file writes

use async_trait::async_trait;
use dorxl_core::{AccountEntry, AccountRecord};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::{
    error::{StorageError, StorageResult},
    store::AccountStore,
};

const ACCOUNTS_KEY: &str = "refresh_tokens";
const ACTIVE_NUMBER_KEY: &str = "active_number";

/// Account store backed by a single JSON document
///
/// Unknown top-level keys are preserved across writes.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location (~/.dorxl/local_store.json)
    pub fn default_location() -> Self {
        Self::new(dorxl_core::local_store_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_document(&self) -> StorageResult<Map<String, Value>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No local store at {}", self.path.display());
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => {
                warn!("Local store {} is not a JSON object, ignoring it", self.path.display());
                Ok(Map::new())
            }
            Err(e) => {
                warn!("Local store {} is unreadable: {}", self.path.display(), e);
                Ok(Map::new())
            }
        }
    }

    async fn write_document(&self, document: &Map<String, Value>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!("Wrote local store {}", self.path.display());
        Ok(())
    }
}

/// Accounts may be stored as a list or as an object keyed by list index
fn records_from_value(value: Value) -> StorageResult<Vec<AccountRecord>> {
    let items: Vec<Value> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        Value::Object(map) => {
            let mut indexed: Vec<(u64, Value)> = Vec::with_capacity(map.len());
            let mut unindexed: Vec<Value> = Vec::new();
            for (key, item) in map {
                match key.parse::<u64>() {
                    Ok(index) => indexed.push((index, item)),
                    Err(_) => unindexed.push(item),
                }
            }
            indexed.sort_by_key(|(index, _)| *index);
            indexed
                .into_iter()
                .map(|(_, item)| item)
                .chain(unindexed)
                .collect()
        }
        other => {
            return Err(StorageError::InvalidData(format!(
                "`{}` must be a list, got {}",
                ACCOUNTS_KEY, other
            )))
        }
    };

    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value::<AccountRecord>(item).unwrap_or_default())
        .collect())
}

#[async_trait]
impl AccountStore for JsonFileStore {
    async fn get_account_list(&self) -> StorageResult<Vec<AccountRecord>> {
        let mut document = self.read_document().await?;
        match document.remove(ACCOUNTS_KEY) {
            Some(value) => records_from_value(value),
            None => Ok(Vec::new()),
        }
    }

    async fn replace_account_list(&self, accounts: &[AccountEntry]) -> StorageResult<()> {
        let mut document = self.read_document().await?;
        document.insert(ACCOUNTS_KEY.to_string(), serde_json::to_value(accounts)?);
        self.write_document(&document).await
    }

    async fn get_active_number(&self) -> StorageResult<Option<String>> {
        let document = self.read_document().await?;
        let number = match document.get(ACTIVE_NUMBER_KEY) {
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        Ok(Some(number).filter(|n| !n.is_empty()))
    }

    async fn set_active_number(&self, number: &str) -> StorageResult<()> {
        let mut document = self.read_document().await?;
        document.insert(
            ACTIVE_NUMBER_KEY.to_string(),
            Value::String(number.trim().to_string()),
        );
        self.write_document(&document).await
    }

    fn backend_name(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_records_from_index_map_are_ordered() {
        let records = records_from_value(json!({
            "10": { "number": 333, "refresh_token": "c" },
            "2": { "number": 222, "refresh_token": "b" },
            "0": { "number": 111, "refresh_token": "a" }
        }))
        .unwrap();

        let numbers: Vec<u64> = records.iter().filter_map(|r| r.number).collect();
        assert_eq!(numbers, vec![111, 222, 333]);
    }

    #[test]
    fn test_records_keep_malformed_items_as_empty_records() {
        let records = records_from_value(json!([
            { "number": 111, "refresh_token": "a" },
            "garbage"
        ]))
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], AccountRecord::default());
    }

    #[test]
    fn test_records_reject_scalar() {
        assert!(matches!(
            records_from_value(json!(42)),
            Err(StorageError::InvalidData(_))
        ));
        assert!(records_from_value(Value::Null).unwrap().is_empty());
    }
}
