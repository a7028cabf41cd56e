//! Password encoding.
//!
//! Stored passwords are salted adaptive hashes, never plain text. The
//! [`PasswordEncoder`] trait covers encoding a new password and verifying a
//! presented one against a stored hash.
//!
//! # Feature Flags
//! - `argon2`: enables [`Argon2PasswordEncoder`] (recommended, default)
//! - `bcrypt`: enables [`BCryptPasswordEncoder`] (widely compatible)

#[cfg(feature = "argon2")]
use argon2::password_hash::rand_core::OsRng;
#[cfg(feature = "argon2")]
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
#[cfg(feature = "argon2")]
use argon2::Argon2;

/// Trait for encoding and verifying passwords.
///
/// # Example
/// ```ignore
/// use actix_authority::security::{Argon2PasswordEncoder, PasswordEncoder};
///
/// let encoder = Argon2PasswordEncoder::new();
/// let hash = encoder.encode("my_password");
/// assert!(encoder.matches("my_password", &hash));
/// ```
pub trait PasswordEncoder: Send + Sync {
    /// Encode the raw password into a salted hash.
    fn encode(&self, raw_password: &str) -> String;

    /// Verify a raw password against an encoded password.
    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool;
}

/// Argon2 password encoder.
///
/// Argon2 is the winner of the Password Hashing Competition and is
/// recommended by OWASP for password storage.
///
/// # Feature Flag
/// Requires the `argon2` feature (enabled by default).
#[cfg(feature = "argon2")]
#[derive(Clone)]
pub struct Argon2PasswordEncoder {
    argon2: Argon2<'static>,
}

#[cfg(feature = "argon2")]
impl Argon2PasswordEncoder {
    /// Creates a new Argon2 password encoder with default settings.
    pub fn new() -> Self {
        Argon2PasswordEncoder {
            argon2: Argon2::default(),
        }
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2PasswordEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "argon2")]
impl PasswordEncoder for Argon2PasswordEncoder {
    fn encode(&self, raw_password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw_password.as_bytes(), &salt)
            .expect("Failed to hash password")
            .to_string()
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        match PasswordHash::new(encoded_password) {
            Ok(parsed_hash) => self
                .argon2
                .verify_password(raw_password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

/// BCrypt password encoder.
///
/// # Feature Flag
/// Requires the `bcrypt` feature.
#[cfg(feature = "bcrypt")]
#[derive(Clone, Default)]
pub struct BCryptPasswordEncoder;

#[cfg(feature = "bcrypt")]
impl BCryptPasswordEncoder {
    /// Creates a new BCrypt password encoder with the default cost.
    pub fn new() -> Self {
        BCryptPasswordEncoder
    }
}

#[cfg(feature = "bcrypt")]
impl PasswordEncoder for BCryptPasswordEncoder {
    fn encode(&self, raw_password: &str) -> String {
        bcrypt::hash(raw_password, bcrypt::DEFAULT_COST).expect("Failed to hash password")
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        bcrypt::verify(raw_password, encoded_password).unwrap_or(false)
    }
}

/// Pass-through encoder that stores passwords as-is.
///
/// **WARNING**: only suitable for tests and local experiments.
#[derive(Clone, Default)]
pub struct NoOpPasswordEncoder;

impl NoOpPasswordEncoder {
    /// Creates a new no-op encoder.
    pub fn new() -> Self {
        NoOpPasswordEncoder
    }
}

impl PasswordEncoder for NoOpPasswordEncoder {
    fn encode(&self, raw_password: &str) -> String {
        raw_password.to_string()
    }

    fn matches(&self, raw_password: &str, encoded_password: &str) -> bool {
        raw_password == encoded_password
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "argon2")]
    #[test]
    fn argon2_round_trip() {
        let encoder = Argon2PasswordEncoder::new();
        let hash = encoder.encode("secret_password");

        assert_ne!(hash, "secret_password");
        assert!(encoder.matches("secret_password", &hash));
        assert!(!encoder.matches("wrong_password", &hash));
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn argon2_salts_are_unique() {
        let encoder = Argon2PasswordEncoder::new();
        assert_ne!(encoder.encode("secret"), encoder.encode("secret"));
    }

    #[cfg(feature = "argon2")]
    #[test]
    fn argon2_rejects_malformed_hash() {
        let encoder = Argon2PasswordEncoder::new();
        assert!(!encoder.matches("secret", "not-a-phc-string"));
    }

    #[cfg(feature = "bcrypt")]
    #[test]
    fn bcrypt_round_trip() {
        let encoder = BCryptPasswordEncoder::new();
        let hash = encoder.encode("secret_password");

        assert!(encoder.matches("secret_password", &hash));
        assert!(!encoder.matches("wrong_password", &hash));
    }

    #[test]
    fn noop_compares_plain_text() {
        let encoder = NoOpPasswordEncoder::new();
        assert_eq!(encoder.encode("secret"), "secret");
        assert!(encoder.matches("secret", "secret"));
        assert!(!encoder.matches("secret", "other"));
    }
}
