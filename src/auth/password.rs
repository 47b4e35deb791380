use thiserror::Error;

/// Work factor for newly stored hashes
pub const HASH_COST: u32 = 10;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Hash a password off the async executor
pub async fn hash_password(password: String) -> Result<String, PasswordError> {
    hash_password_with_cost(password, HASH_COST).await
}

pub async fn hash_password_with_cost(password: String, cost: u32) -> Result<String, PasswordError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

/// Compare a candidate password against a stored hash.
///
/// A malformed stored hash counts as a mismatch so callers can answer with the
/// same "Invalid credentials" they use for a wrong password.
pub async fn verify_password(password: String, hash: String) -> Result<bool, PasswordError> {
    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await?;
    match outcome {
        Ok(matched) => Ok(matched),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            Ok(false)
        }
    }
}
