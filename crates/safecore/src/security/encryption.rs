//! Field-level encryption (AES-256-GCM).
//!
//! Every sensitive field (stored usernames/passwords, task content, file
//! descriptions) passes through here before it reaches the vault. The wire
//! format is `base64(nonce || ciphertext)` with a random 12-byte nonce; the
//! AES key is SHA-256 of the configured key string.
//!
//! Empty plaintext maps to the empty string in both directions so optional
//! fields don't produce ciphertext blobs for nothing.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::Rng;
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

const NONCE_LEN: usize = 12;

/// Encrypts and decrypts sensitive record fields.
pub struct CryptoService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CryptoService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptoService").finish_non_exhaustive()
    }
}

impl CryptoService {
    /// Builds the service from raw key material (any non-empty string; the
    /// AES key is derived with SHA-256).
    pub fn new(key_material: &str) -> AppResult<Self> {
        if key_material.is_empty() {
            return Err(AppError::Crypto("encryption key is empty".to_string()));
        }
        let mut hasher = Sha256::new();
        hasher.update(key_material.as_bytes());
        let key = hasher.finalize();
        Ok(Self {
            cipher: Aes256Gcm::new(&key),
        })
    }

    /// Builds the service from the configured `ENCRYPTION_KEY`.
    pub fn from_config() -> AppResult<Self> {
        Self::new(crate::config::ENCRYPTION_KEY.expose_secret())
    }

    /// Encrypts a field value. Empty input returns the empty string.
    pub fn encrypt(&self, plaintext: &str) -> AppResult<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }
        let nonce_bytes: [u8; NONCE_LEN] = rand::thread_rng().gen();
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| AppError::Crypto(format!("encryption failed: {}", e)))?;

        let mut payload = nonce_bytes.to_vec();
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Decrypts a field value produced by [`CryptoService::encrypt`].
    /// Empty input returns the empty string.
    pub fn decrypt(&self, encoded: &str) -> AppResult<String> {
        if encoded.is_empty() {
            return Ok(String::new());
        }
        let payload = BASE64
            .decode(encoded)
            .map_err(|e| AppError::Crypto(format!("invalid ciphertext encoding: {}", e)))?;
        if payload.len() < NONCE_LEN {
            return Err(AppError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| AppError::Crypto(format!("decryption failed: {}", e)))?;
        String::from_utf8(plaintext).map_err(|e| AppError::Crypto(format!("invalid plaintext: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn service() -> CryptoService {
        CryptoService::new("test-key-material").unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let crypto = service();
        let cases = vec!["hunter2", "MySecurePassword123!", "текст с юникодом", "a"];
        for plaintext in cases {
            let encrypted = crypto.encrypt(plaintext).unwrap();
            assert_ne!(encrypted, plaintext);
            assert_eq!(crypto.decrypt(&encrypted).unwrap(), plaintext, "failed for: {}", plaintext);
        }
    }

    #[test]
    fn test_empty_maps_to_empty() {
        let crypto = service();
        assert_eq!(crypto.encrypt("").unwrap(), "");
        assert_eq!(crypto.decrypt("").unwrap(), "");
    }

    #[test]
    fn test_nonces_differ_between_calls() {
        let crypto = service();
        let a = crypto.encrypt("same input").unwrap();
        let b = crypto.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let crypto = service();
        assert!(crypto.decrypt("not base64!!!").is_err());
        assert!(crypto.decrypt(&BASE64.encode(b"short")).is_err());
        // Valid base64, wrong key stream
        let other = CryptoService::new("different-key").unwrap();
        let encrypted = other.encrypt("secret").unwrap();
        assert!(crypto.decrypt(&encrypted).is_err());
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(CryptoService::new("").is_err());
    }
}
