// ABOUTME: Credential encryption for dorxl
// ABOUTME: Seals refresh tokens and session snapshots before they touch disk

pub mod encryption;

// Re-export main types for convenience
pub use encryption::{EncryptionError, TokenEncryption};
