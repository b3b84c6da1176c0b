// ABOUTME: Refresh token and snapshot sealing with ChaCha20-Poly1305
// ABOUTME: Keys are bound to this machine and user, or supplied directly by tests and embedders
//
// Sealed values are base64(nonce || ciphertext || tag). The machine key keeps a
// copied data directory unreadable elsewhere; it does not protect against other
// processes running as the same user on the same host.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ring::{
    aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN},
    hkdf,
    rand::{SecureRandom, SystemRandom},
};
use std::{fmt, sync::Arc};

const KEY_LEN: usize = 32;

/// Mixed into the key material so other tools on the host derive different keys
const KEY_CONTEXT: &[u8] = b"dorxl-token-encryption-v1";
const HKDF_SALT: &[u8] = b"dorxl-encryption-salt";
const HKDF_INFO: &[u8] = b"token-encryption";

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Failed to derive encryption key: {0}")]
    KeyDerivation(String),

    #[error("Failed to generate nonce")]
    Nonce,

    #[error("Failed to encrypt data")]
    Seal,

    #[error("Failed to decrypt data: {0}")]
    Decryption(String),

    #[error("Invalid encrypted data format")]
    InvalidFormat,
}

/// Seals and opens token material
#[derive(Clone)]
pub struct TokenEncryption {
    rng: Arc<SystemRandom>,
    key: [u8; KEY_LEN],
}

impl fmt::Debug for TokenEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenEncryption").finish_non_exhaustive()
    }
}

impl TokenEncryption {
    /// Key bound to the machine id, the login name and the hostname
    pub fn new() -> Result<Self, EncryptionError> {
        let material = machine_key_material()?;
        let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, HKDF_SALT).extract(&material);

        let mut key = [0u8; KEY_LEN];
        prk.expand(&[HKDF_INFO], hkdf::HKDF_SHA256)
            .and_then(|okm| okm.fill(&mut key))
            .map_err(|_| EncryptionError::KeyDerivation("HKDF expansion failed".to_string()))?;

        Ok(Self::from_key(key))
    }

    /// Use a caller-provided 256-bit key as-is
    pub fn with_key(key: &[u8]) -> Result<Self, EncryptionError> {
        let key: [u8; KEY_LEN] = key.try_into().map_err(|_| {
            EncryptionError::KeyDerivation(format!(
                "Key must be {} bytes, got {}",
                KEY_LEN,
                key.len()
            ))
        })?;
        Ok(Self::from_key(key))
    }

    fn from_key(key: [u8; KEY_LEN]) -> Self {
        Self {
            rng: Arc::new(SystemRandom::new()),
            key,
        }
    }

    fn aead_key(&self) -> Result<LessSafeKey, EncryptionError> {
        UnboundKey::new(&CHACHA20_POLY1305, &self.key)
            .map(LessSafeKey::new)
            .map_err(|_| EncryptionError::KeyDerivation("Rejected AEAD key".to_string()))
    }

    /// Seal `plaintext`; the empty string stays empty
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let mut nonce = [0u8; NONCE_LEN];
        self.rng.fill(&mut nonce).map_err(|_| EncryptionError::Nonce)?;

        let mut sealed =
            Vec::with_capacity(NONCE_LEN + plaintext.len() + CHACHA20_POLY1305.tag_len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(plaintext.as_bytes());

        let tag = self
            .aead_key()?
            .seal_in_place_separate_tag(
                Nonce::assume_unique_for_key(nonce),
                Aad::empty(),
                &mut sealed[NONCE_LEN..],
            )
            .map_err(|_| EncryptionError::Seal)?;
        sealed.extend_from_slice(tag.as_ref());

        Ok(BASE64.encode(sealed))
    }

    /// Open a value produced by [`encrypt`](Self::encrypt)
    pub fn decrypt(&self, sealed: &str) -> Result<String, EncryptionError> {
        if sealed.is_empty() {
            return Ok(String::new());
        }

        let mut data = BASE64
            .decode(sealed.trim())
            .map_err(|_| EncryptionError::InvalidFormat)?;
        if data.len() < NONCE_LEN + CHACHA20_POLY1305.tag_len() {
            return Err(EncryptionError::InvalidFormat);
        }

        let (nonce, body) = data.split_at_mut(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce).map_err(|_| EncryptionError::InvalidFormat)?;
        let plaintext = self
            .aead_key()?
            .open_in_place(nonce, Aad::empty(), body)
            .map_err(|_| EncryptionError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext.to_vec())
            .map_err(|_| EncryptionError::Decryption("plaintext is not UTF-8".to_string()))
    }

    /// Heuristic used when migrating plaintext rows: valid base64 long enough to hold a nonce and tag
    pub fn is_encrypted(value: &str) -> bool {
        !value.is_empty()
            && BASE64
                .decode(value)
                .is_ok_and(|decoded| decoded.len() >= NONCE_LEN + CHACHA20_POLY1305.tag_len())
    }
}

fn machine_key_material() -> Result<Vec<u8>, EncryptionError> {
    let machine_id = machine_uid::get()
        .map_err(|e| EncryptionError::KeyDerivation(format!("Failed to get machine ID: {}", e)))?;
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown-user".to_string());
    let hostname = hostname::get()
        .map_err(|e| EncryptionError::KeyDerivation(format!("Failed to get hostname: {}", e)))?;

    let mut material = Vec::new();
    for part in [
        machine_id.as_bytes(),
        username.as_bytes(),
        hostname.as_encoded_bytes(),
        KEY_CONTEXT,
    ] {
        material.extend_from_slice(part);
    }
    Ok(material)
}
