//! Master-password hashing and strength rules.
//!
//! Hashes are salted, iterated SHA-256, stored as `salt$digest` in hex. The
//! iteration count is fixed in `config::security`; changing it invalidates
//! nothing because the count is baked into each stored hash.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::security::HASH_ITERATIONS;

const SALT_LEN: usize = 16;

/// Hashes and verifies master passwords.
#[derive(Debug, Default, Clone)]
pub struct AuthService;

impl AuthService {
    pub fn new() -> Self {
        Self
    }

    /// Hashes a master password with a fresh random salt.
    /// Format: `<iterations>$<salt-hex>$<digest-hex>`.
    pub fn hash_master_password(&self, password: &str) -> Result<String, String> {
        if password.is_empty() {
            return Err("Password cannot be empty".to_string());
        }
        let mut salt = [0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        let digest = iterate(password, &salt, HASH_ITERATIONS);
        Ok(format!("{}${}${}", HASH_ITERATIONS, hex::encode(salt), hex::encode(digest)))
    }

    /// Verifies a password against a stored hash. Any malformed hash or
    /// mismatch verifies false; this never errors.
    pub fn verify_master_password(&self, password: &str, stored: &str) -> bool {
        if password.is_empty() || stored.is_empty() {
            return false;
        }
        let mut parts = stored.split('$');
        let (Some(iterations), Some(salt_hex), Some(digest_hex), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return false;
        };
        let Ok(iterations) = iterations.parse::<u32>() else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (hex::decode(salt_hex), hex::decode(digest_hex)) else {
            return false;
        };
        let actual = iterate(password, &salt, iterations);
        // Byte-wise compare without early exit
        if actual.len() != expected.len() {
            return false;
        }
        actual.iter().zip(expected.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
    }

    /// Strength rules for master passwords: 8..=128 chars, at least one
    /// uppercase, lowercase, digit, and special character.
    pub fn validate_strength(&self, password: &str) -> Result<(), String> {
        if password.len() < 8 {
            return Err("Password must be at least 8 characters long".to_string());
        }
        if password.len() > 128 {
            return Err("Password must be less than 128 characters".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err("Password must contain at least one uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err("Password must contain at least one lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err("Password must contain at least one number".to_string());
        }
        const SPECIAL: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
        if !password.chars().any(|c| SPECIAL.contains(c)) {
            return Err("Password must contain at least one special character".to_string());
        }
        Ok(())
    }
}

fn iterate(password: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut digest: Vec<u8> = {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().to_vec()
    };
    for _ in 1..iterations {
        let mut hasher = Sha256::new();
        hasher.update(&digest);
        digest = hasher.finalize().to_vec();
    }
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    // Full-strength iteration counts make the test suite crawl; exercise
    // the format through the public API with real hashes only where needed.

    #[test]
    fn test_hash_then_verify_round_trip() {
        let auth = AuthService::new();
        let hash = auth.hash_master_password("Str0ng!Pass").unwrap();
        assert!(auth.verify_master_password("Str0ng!Pass", &hash));
        assert!(!auth.verify_master_password("wrong", &hash));
    }

    #[test]
    fn test_hashes_are_salted() {
        let auth = AuthService::new();
        let a = auth.hash_master_password("Str0ng!Pass").unwrap();
        let b = auth.hash_master_password("Str0ng!Pass").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_hashes() {
        let auth = AuthService::new();
        for stored in ["", "nodollars", "a$b", "x$y$z", "1$zz$zz$extra"] {
            assert!(!auth.verify_master_password("anything", stored), "accepted: {}", stored);
        }
    }

    #[test]
    fn test_empty_password_is_rejected() {
        let auth = AuthService::new();
        assert!(auth.hash_master_password("").is_err());
        assert!(!auth.verify_master_password("", "1$00$00"));
    }

    #[test]
    fn test_strength_rules() {
        let auth = AuthService::new();
        assert!(auth.validate_strength("Str0ng!Pass").is_ok());

        let cases = vec![
            ("short1!", "at least 8"),
            ("alllowercase1!", "uppercase"),
            ("ALLUPPERCASE1!", "lowercase"),
            ("NoDigits!!", "number"),
            ("NoSpecial123", "special"),
        ];
        for (password, expected) in cases {
            let err = auth.validate_strength(password).unwrap_err();
            assert!(err.contains(expected), "'{}' → '{}'", password, err);
        }

        let too_long = format!("Aa1!{}", "x".repeat(130));
        assert!(auth.validate_strength(&too_long).is_err());
    }
}
