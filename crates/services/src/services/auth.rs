//! Password hashing for stored user credentials.

use thiserror::Error;
use tokio::task;
use tracing::warn;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Hash(#[from] bcrypt::BcryptError),
    #[error("password hashing task failed: {0}")]
    Task(#[from] task::JoinError),
}

/// Hash `password` with bcrypt at the default cost.
///
/// Runs on the blocking pool since a bcrypt round takes hundreds of milliseconds.
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    hash_password_with_cost(password, bcrypt::DEFAULT_COST).await
}

pub async fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_owned();
    Ok(task::spawn_blocking(move || bcrypt::hash(password, cost)).await??)
}

/// Check `password` against a stored bcrypt hash. Malformed hashes never verify.
pub async fn verify_password(password: &str, stored: &str) -> bool {
    let (password, stored) = (password.to_owned(), stored.to_owned());
    match task::spawn_blocking(move || bcrypt::verify(password, &stored)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            warn!(error = %e, "stored password hash is unreadable");
            false
        }
        Err(e) => {
            warn!(error = %e, "password verification task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    #[tokio::test]
    async fn verifies_the_stored_password_only() {
        let stored = hash_password_with_cost("correct horse", TEST_COST).await.unwrap();
        assert!(stored.starts_with("$2"));
        assert!(verify_password("correct horse", &stored).await);
        assert!(!verify_password("wrong horse", &stored).await);
    }

    #[tokio::test]
    async fn salts_differ_between_hashes() {
        let first = hash_password_with_cost("same", TEST_COST).await.unwrap();
        let second = hash_password_with_cost("same", TEST_COST).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn malformed_hashes_never_verify() {
        assert!(!verify_password("x", "no-separator").await);
        assert!(!verify_password("x", "").await);
    }

    #[tokio::test]
    async fn out_of_range_cost_is_an_error() {
        assert!(matches!(
            hash_password_with_cost("pw", 2).await,
            Err(AuthError::Hash(_))
        ));
    }
}
