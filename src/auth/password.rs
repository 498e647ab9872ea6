use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::config::{PasswordConfig, PasswordScheme};

/// Hashes new passwords with the configured scheme and verifies stored hashes of either
/// scheme. Hashing is CPU-bound, so the async entry points run on the blocking pool.
#[derive(Debug, Clone, Copy)]
pub struct Passwords {
    scheme: PasswordScheme,
    bcrypt_cost: u32,
}

impl Passwords {
    pub fn new(cfg: &PasswordConfig) -> Self {
        Self {
            scheme: cfg.scheme,
            bcrypt_cost: cfg.bcrypt_cost,
        }
    }

    pub async fn hash(&self, plain: String) -> anyhow::Result<String> {
        let this = *self;
        tokio::task::spawn_blocking(move || this.hash_blocking(&plain))
            .await
            .context("password hashing task")?
    }

    pub async fn verify(&self, plain: String, hash: String) -> anyhow::Result<bool> {
        tokio::task::spawn_blocking(move || verify_password(&plain, &hash))
            .await
            .context("password verify task")?
    }

    pub fn hash_blocking(&self, plain: &str) -> anyhow::Result<String> {
        match self.scheme {
            PasswordScheme::Bcrypt => bcrypt::hash(plain, self.bcrypt_cost).map_err(|e| {
                error!(error = %e, "bcrypt hash error");
                anyhow::anyhow!(e.to_string())
            }),
            PasswordScheme::Argon2 => hash_argon2(plain),
        }
    }
}

fn hash_argon2(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Dispatches on the stored hash format: `$argon2..` PHC strings or bcrypt `$2a$/$2b$/$2y$`.
pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    if hash.starts_with("$argon2") {
        let parsed = PasswordHash::new(hash).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        return Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok());
    }

    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })
}
