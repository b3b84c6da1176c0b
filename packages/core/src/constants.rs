use std::env;
use std::path::PathBuf;

use dorxl_config::constants::{DORXL_DATA_DIR, HOME};

/// Get the path to the dorxl data directory (~/.dorxl unless overridden)
pub fn dorxl_dir() -> PathBuf {
    if let Ok(dir) = env::var(DORXL_DATA_DIR) {
        if !dir.trim().is_empty() {
            return PathBuf::from(dir);
        }
    }

    // HOME first (useful for tests), then the dirs crate
    if let Ok(home) = env::var(HOME) {
        PathBuf::from(home).join(".dorxl")
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".dorxl")
    }
}

/// SQLite account database (~/.dorxl/dorxl.db)
pub fn database_file() -> PathBuf {
    dorxl_dir().join("dorxl.db")
}

/// JSON account store (~/.dorxl/local_store.json)
pub fn local_store_file() -> PathBuf {
    dorxl_dir().join("local_store.json")
}

/// Encrypted snapshot of the last active session (~/.dorxl/active_session.enc)
pub fn session_cache_file() -> PathBuf {
    dorxl_dir().join("active_session.enc")
}

/// Plain-text API key fallback (~/.dorxl/api.key)
pub fn api_key_file() -> PathBuf {
    dorxl_dir().join("api.key")
}
