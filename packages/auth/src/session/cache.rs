// ABOUTME: Encrypted on-disk snapshot of the active session
// ABOUTME: Lets a restarted process reuse still-valid tokens without a refresh round trip

use dorxl_security::TokenEncryption;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::{error::AuthResult, session::types::SessionSnapshot};

/// Single-file snapshot store; the whole JSON document is sealed as one blob
#[derive(Debug, Clone)]
pub struct SessionCache {
    path: PathBuf,
    encryption: TokenEncryption,
}

impl SessionCache {
    pub fn new(path: impl Into<PathBuf>, encryption: TokenEncryption) -> Self {
        Self {
            path: path.into(),
            encryption,
        }
    }

    /// Cache at the default location (~/.dorxl/active_session.enc)
    pub fn default_location(encryption: TokenEncryption) -> Self {
        Self::new(dorxl_core::session_cache_file(), encryption)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot that has not expired yet at `now`
    pub async fn load_fresh(&self, now: i64) -> Option<SessionSnapshot> {
        let snapshot = self.load().await?;
        if snapshot.is_expired(now) {
            debug!("Cached session for {} has expired", snapshot.number);
            return None;
        }
        Some(snapshot)
    }

    /// Snapshot regardless of expiry; unreadable files count as absent
    pub async fn load(&self) -> Option<SessionSnapshot> {
        let sealed = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Could not read session cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        let plaintext = match self.encryption.decrypt(sealed.trim()) {
            Ok(plaintext) => plaintext,
            Err(e) => {
                warn!("Discarding session cache that failed to decrypt: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<SessionSnapshot>(&plaintext) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("Discarding malformed session cache: {}", e);
                None
            }
        }
    }

    pub async fn save(&self, snapshot: &SessionSnapshot) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let plaintext = serde_json::to_string(snapshot)?;
        let sealed = self.encryption.encrypt(&plaintext)?;

        let tmp_path = self.path.with_extension("enc.tmp");
        fs::write(&tmp_path, sealed).await?;
        fs::rename(&tmp_path, &self.path).await?;

        debug!("Saved session cache for {}", snapshot.number);
        Ok(())
    }

    pub async fn clear(&self) -> AuthResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Cleared session cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
