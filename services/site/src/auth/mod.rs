//! services/site/src/auth/mod.rs
//!
//! Credential checks, password hashing and session tokens.

pub mod password;
pub mod token;

pub use password::{PasswordError, Passwords};
pub use token::{Claims, SessionKeys, TokenError, SESSION_COOKIE};

use dealership_core::domain::Identity;
use dealership_core::ports::{DatabaseService, PortError};
use tracing::error;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// Unknown email or wrong password. The two are deliberately indistinguishable.
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] PortError),
    #[error(transparent)]
    Password(#[from] PasswordError),
}

/// Looks up the account for `email` and checks `password` against its hash.
pub async fn authenticate<D>(
    db: &D,
    passwords: &Passwords,
    email: &str,
    password: &str,
) -> Result<Identity, LoginError>
where
    D: DatabaseService + ?Sized,
{
    let account = db.get_account_by_email(email).await?;
    let stored = account.as_ref().map(|a| a.password_hash.clone());

    let verified = match passwords.verify(password.to_string(), stored).await {
        Ok(verified) => verified,
        Err(PasswordError::Malformed(e)) => {
            error!("Stored password hash for an account is malformed: {}", e);
            false
        }
        Err(e) => return Err(e.into()),
    };

    match account {
        Some(account) if verified => Ok(account.identity()),
        _ => Err(LoginError::InvalidCredentials),
    }
}
