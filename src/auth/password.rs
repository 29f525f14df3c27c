use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2 hash of `plain` as a PHC string, computed on the blocking pool.
pub async fn hash_password(plain: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash failed");
                anyhow::anyhow!(e.to_string())
            })?;
        Ok(hash.to_string())
    })
    .await?
}

/// Checks `plain` against a stored PHC string. A mismatch is `Ok(false)`;
/// only an unparsable stored hash is an error.
pub async fn verify_password(plain: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(&stored).map_err(|e| {
            error!(error = %e, "stored password hash unparsable");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn registered_password_verifies() {
        let hash = hash_password("Run5k!now".into()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Run5k!now".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn password_check_is_case_sensitive() {
        let hash = hash_password("Run5k!now".into()).await.unwrap();
        assert!(!verify_password("run5k!now".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_a_fresh_salt() {
        let a = hash_password("Str0ng!pass".into()).await.unwrap();
        let b = hash_password("Str0ng!pass".into()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn corrupt_stored_hash_is_an_error() {
        let err = verify_password("Str0ng!pass".into(), "plaintext-leftover".into())
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
