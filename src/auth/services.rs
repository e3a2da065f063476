use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::auth::repo::User;
use crate::config::AdminConfig;

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
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

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Resolve credentials to an active user; `None` for any mismatch.
pub async fn authenticate(
    db: &SqlitePool,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user) = User::find_by_email(db, &normalize_email(email)).await? else {
        warn!("login unknown email");
        return Ok(None);
    };
    if !verify_password(password, &user.hashed_password)? {
        warn!(user_id = %user.id, "login invalid password");
        return Ok(None);
    }
    if !user.is_active {
        warn!(user_id = %user.id, "login inactive user");
        return Ok(None);
    }
    Ok(Some(user))
}

/// Create the configured superuser unless the email is already registered.
pub async fn ensure_admin(db: &SqlitePool, admin: &AdminConfig) -> anyhow::Result<User> {
    let email = normalize_email(&admin.email);
    anyhow::ensure!(is_valid_email(&email), "invalid admin email {}", email);

    if let Some(existing) = User::find_by_email(db, &email).await? {
        return Ok(existing);
    }
    let hash = hash_password(&admin.password)?;
    let user = User::create(db, &email, &hash, true).await?;
    info!(user_id = %user.id, email = %user.email, "admin user created");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        assert!(verify_password("anything", "not-a-valid-hash").is_err());
    }

    #[test]
    fn email_normalization_and_validation() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert!(is_valid_email("alice@example.com"));
        assert!(!is_valid_email("alice@example"));
        assert!(!is_valid_email("alice example.com"));
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_email_case() {
        let pool = db::connect_in_memory().await.unwrap();
        let hash = hash_password("correct-horse").unwrap();
        let user = User::create(&pool, "bob@example.com", &hash, false).await.unwrap();

        let found = authenticate(&pool, "BOB@example.com", "correct-horse")
            .await
            .unwrap()
            .expect("valid credentials");
        assert_eq!(found.id, user.id);

        assert!(authenticate(&pool, "bob@example.com", "battery-staple")
            .await
            .unwrap()
            .is_none());
        assert!(authenticate(&pool, "nobody@example.com", "correct-horse")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let pool = db::connect_in_memory().await.unwrap();
        let admin = AdminConfig {
            email: "Admin@Example.com".into(),
            password: "password123".into(),
        };

        let first = ensure_admin(&pool, &admin).await.unwrap();
        assert!(first.is_superuser);
        assert!(first.is_verified);
        assert_eq!(first.email, "admin@example.com");

        let second = ensure_admin(&pool, &admin).await.unwrap();
        assert_eq!(first.id, second.id);
    }
}
