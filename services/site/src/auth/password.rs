//! services/site/src/auth/password.rs
//!
//! Salted argon2 password hashing. Hashing and verification are CPU bound,
//! so both run on the blocking thread pool.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Stored password hash is malformed: {0}")]
    Malformed(String),
    #[error("Password task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Hashes new passwords and checks submitted ones against stored hashes.
#[derive(Clone)]
pub struct Passwords {
    argon2: Argon2<'static>,
    /// Verified in place of a real hash when the account does not exist.
    dummy_hash: String,
}

impl Passwords {
    /// Uses the argon2 default cost parameters.
    pub fn new() -> Result<Self, PasswordError> {
        Self::from_params(Params::default())
    }

    /// Uses a custom memory cost (KiB) and iteration count.
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, PasswordError> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Self::from_params(params)
    }

    fn from_params(params: Params) -> Result<Self, PasswordError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "no account uses this password")?;
        Ok(Self { argon2, dummy_hash })
    }

    pub async fn hash(&self, password: String) -> Result<String, PasswordError> {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || hash_with(&argon2, &password)).await?
    }

    /// Verifies `password` against `stored`.
    ///
    /// When there is no stored hash the dummy hash is verified instead and the
    /// result is always `false`, so a missing account costs the same as a
    /// wrong password.
    pub async fn verify(&self, password: String, stored: Option<String>) -> Result<bool, PasswordError> {
        let argon2 = self.argon2.clone();
        let known_account = stored.is_some();
        let hash = stored.unwrap_or_else(|| self.dummy_hash.clone());
        let matched = tokio::task::spawn_blocking(move || {
            let parsed =
                PasswordHash::new(&hash).map_err(|e| PasswordError::Malformed(e.to_string()))?;
            Ok::<_, PasswordError>(argon2.verify_password(password.as_bytes(), &parsed).is_ok())
        })
        .await??;
        Ok(known_account && matched)
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}
