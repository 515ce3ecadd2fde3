use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::config::PasswordConfig;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Reason a candidate password was refused. The display text is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeakPassword {
    #[error("Le mot de passe doit contenir au moins {0} caractères")]
    TooShort(usize),
    #[error("Le mot de passe doit contenir au moins une majuscule")]
    MissingUppercase,
    #[error("Le mot de passe doit contenir au moins une minuscule")]
    MissingLowercase,
    #[error("Le mot de passe doit contenir au moins un chiffre")]
    MissingDigit,
}

pub fn verify_password_strength(
    candidate: &str,
    policy: &PasswordConfig,
) -> Result<(), WeakPassword> {
    if candidate.chars().count() < policy.min_length {
        return Err(WeakPassword::TooShort(policy.min_length));
    }
    if !candidate.chars().any(char::is_uppercase) {
        return Err(WeakPassword::MissingUppercase);
    }
    if !candidate.chars().any(char::is_lowercase) {
        return Err(WeakPassword::MissingLowercase);
    }
    if !candidate.chars().any(|c| c.is_ascii_digit()) {
        return Err(WeakPassword::MissingDigit);
    }
    Ok(())
}
