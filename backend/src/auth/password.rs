//! Password hashing using bcrypt
//!
//! Provides salted one-way hashing and verification.
//!
//! # Performance Considerations
//!
//! Bcrypt is intentionally CPU-intensive. The async variants run it on
//! the blocking thread pool so request handling is never stalled.

use anyhow::Result;

/// Password hashing service
///
/// The cost factor is fixed at construction; production uses
/// `bcrypt::DEFAULT_COST` (12).
#[derive(Debug, Clone, Copy)]
pub struct PasswordService {
    cost: u32,
}

impl Default for PasswordService {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password (blocking operation)
    pub fn hash(&self, password: &str) -> Result<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
    }

    /// Hash a password on the blocking thread pool
    pub async fn hash_async(&self, password: String) -> Result<String> {
        let service = *self;
        tokio::task::spawn_blocking(move || service.hash(&password))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// Verify a password against a hash (blocking operation)
    ///
    /// A malformed hash never matches.
    pub fn verify(password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }

    /// Verify a password on the blocking thread pool
    pub async fn verify_async(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast() -> PasswordService {
        PasswordService::new(4)
    }

    #[test]
    fn test_hash_and_verify() {
        let password = "Secure_password_123";
        let hash = fast().hash(password).unwrap();

        assert!(PasswordService::verify(password, &hash));
        assert!(!PasswordService::verify("wrong_password", &hash));
        assert_ne!(hash, password);
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "test_password";
        let hash1 = fast().hash(password).unwrap();
        let hash2 = fast().hash(password).unwrap();

        // Hashes should be different due to random salt
        assert_ne!(hash1, hash2);

        // But both should verify correctly
        assert!(PasswordService::verify(password, &hash1));
        assert!(PasswordService::verify(password, &hash2));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!PasswordService::verify("anything", "not-a-bcrypt-hash"));
        assert!(!PasswordService::verify("", ""));
    }

    #[test]
    fn test_default_cost_is_twelve() {
        assert_eq!(PasswordService::default().cost, 12);
    }

    #[tokio::test]
    async fn test_async_hash_and_verify() {
        let password = "async_test_password".to_string();
        let hash = fast().hash_async(password.clone()).await.unwrap();

        assert!(PasswordService::verify_async(password.clone(), hash.clone()).await.unwrap());
        assert!(!PasswordService::verify_async("wrong".to_string(), hash).await.unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10))]

        /// Any password verifies against its own hash and not against a different one
        #[test]
        fn prop_verify_round_trip(password in "[A-Za-z0-9!@#]{8,40}") {
            let hash = fast().hash(&password).unwrap();
            prop_assert!(PasswordService::verify(&password, &hash));
            let other = format!("{}x", password);
            prop_assert!(!PasswordService::verify(&other, &hash));
        }
    }
}
