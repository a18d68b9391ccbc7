//! Password hashing via bcrypt.
//!
//! Both operations are CPU-bound and run on the blocking thread pool.

use super::errors::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// bcrypt ignores everything past this many bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password with bcrypt. Longer passwords than bcrypt can use are
/// refused rather than truncated.
pub async fn hash_password(password: String) -> Result<String, AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AuthError::PasswordTooLong);
    }
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verify a password against a bcrypt hash. A password too long to have
/// been hashed never matches.
pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("secret".to_string()).await.unwrap();
        assert_ne!(hash, "secret");
        assert!(verify_password("secret".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("Secret".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_against_garbage_hash() {
        let result = verify_password("secret".to_string(), "not-a-hash".to_string()).await;
        assert!(matches!(result, Err(AuthError::PasswordHash(_))));
    }

    #[tokio::test]
    async fn test_long_passwords_are_not_truncated() {
        let long = "a".repeat(MAX_PASSWORD_BYTES + 1);
        let result = hash_password(long.clone()).await;
        assert!(matches!(result, Err(AuthError::PasswordTooLong)));

        let exact = "a".repeat(MAX_PASSWORD_BYTES);
        let hash = hash_password(exact.clone()).await.unwrap();
        assert!(verify_password(exact, hash.clone()).await.unwrap());
        // Shares the first 72 bytes with the stored password.
        assert!(!verify_password(long, hash).await.unwrap());
    }
}
