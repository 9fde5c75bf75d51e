//! Admin authentication service.
//!
//! The admin panel is protected by a single shared password. It is hashed
//! with Argon2id when the application starts; only the PHC hash string is
//! kept in memory afterwards.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::{ExposeSecret, SecretString};

/// Verifies admin login attempts against the configured password.
#[derive(Clone)]
pub struct AdminAuth {
    password_hash: String,
}

impl std::fmt::Debug for AdminAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminAuth")
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

impl AdminAuth {
    /// Hash the configured admin password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub fn from_password(password: &SecretString) -> Result<Self, AuthError> {
        Ok(Self {
            password_hash: hash_password(password.expose_secret())?,
        })
    }

    /// Check a login attempt.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the password does not match.
    pub fn verify(&self, candidate: &str) -> Result<(), AuthError> {
        verify_password(candidate, &self.password_hash)
    }
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
