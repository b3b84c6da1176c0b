// ABOUTME: Core types and utilities for dorxl
// ABOUTME: Account records shared by storage, auth and the CLI, plus data-directory paths

pub mod constants;
pub mod types;
pub mod utils;

// Re-export main types
pub use types::{AccountEntry, AccountRecord, MissingField, SubscriptionType};

// Re-export constants
pub use constants::{api_key_file, database_file, dorxl_dir, local_store_file, session_cache_file};

// Re-export utilities
pub use utils::{is_valid_number, now_timestamp};
