// ABOUTME: Wires a SessionManager from environment settings
// ABOUTME: Picks the account store backend, the cache key and the HTTP identity client

use dorxl_auth::{HttpIdentityClient, SessionCache, SessionManager, SessionSettings};
use dorxl_config::{constants::DORXL_STORE, env_string};
use dorxl_core::is_valid_number;
use dorxl_security::TokenEncryption;
use dorxl_storage::{AccountStore, JsonFileStore, MemoryStore, SqliteStore};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// Account store backend selected by `DORXL_STORE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
    Memory,
}

impl StoreKind {
    /// Backend from the environment; unknown values fall back to sqlite
    pub fn from_env() -> Self {
        match env_string(DORXL_STORE) {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}; using {}", e, Self::default());
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Json => "json",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreKind {
    type Err = CliError;

    fn from_str(s: &str) -> CliResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "db" => Ok(Self::Sqlite),
            "json" | "file" => Ok(Self::Json),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(CliError::UnknownStore(s.to_string())),
        }
    }
}

/// Machine-bound key for the session cache and the SQLite token column
///
/// Some containers expose no machine id; the CLI then runs without a cache.
pub fn open_encryption() -> Option<TokenEncryption> {
    match TokenEncryption::new() {
        Ok(encryption) => Some(encryption),
        Err(e) => {
            warn!("Machine key unavailable, session cache disabled: {}", e);
            None
        }
    }
}

/// Open the requested backend, falling back to the JSON file store when SQLite cannot be used
pub async fn open_store(
    kind: StoreKind,
    encryption: Option<&TokenEncryption>,
) -> Box<dyn AccountStore> {
    match kind {
        StoreKind::Memory => Box::new(MemoryStore::new()),
        StoreKind::Json => Box::new(JsonFileStore::default_location()),
        StoreKind::Sqlite => {
            let Some(encryption) = encryption else {
                warn!("SQLite store needs an encryption key, using the JSON store instead");
                return Box::new(JsonFileStore::default_location());
            };
            let path = dorxl_core::database_file();
            match SqliteStore::open(&path, encryption.clone()).await {
                Ok(store) => {
                    debug!("Opened account database {}", path.display());
                    Box::new(store)
                }
                Err(e) => {
                    warn!("Could not open account database, using the JSON store: {}", e);
                    Box::new(JsonFileStore::default_location())
                }
            }
        }
    }
}

/// Build and initialize the manager used by every command
pub async fn build_manager() -> CliResult<SessionManager> {
    let encryption = open_encryption();
    let store = open_store(StoreKind::from_env(), encryption.as_ref()).await;
    let client = Arc::new(HttpIdentityClient::from_env()?);

    let mut builder = SessionManager::builder(store, client.clone(), client)
        .settings(SessionSettings::from_env());
    if let Some(encryption) = encryption {
        builder = builder.cache(SessionCache::default_location(encryption));
    }

    let mut manager = builder.build();
    manager.initialize().await;
    Ok(manager)
}

/// Parse a new subscriber number typed by the user, enforcing the 628 format
pub fn parse_number(raw: &str) -> CliResult<u64> {
    let trimmed = raw.trim();
    if !is_valid_number(trimmed) {
        return Err(CliError::InvalidNumber(trimmed.to_string()));
    }
    trimmed
        .parse()
        .map_err(|_| CliError::InvalidNumber(trimmed.to_string()))
}

/// Parse a number that refers to an already linked account
///
/// Stores written by older tools may hold numbers outside the 628 format; those
/// must still be selectable.
pub fn parse_linked_number(raw: &str) -> CliResult<u64> {
    let trimmed = raw.trim();
    trimmed
        .parse()
        .map_err(|_| CliError::NotANumber(trimmed.to_string()))
}
