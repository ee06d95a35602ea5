use crate::application_port::*;
use crate::domain_model::*;

/// Holds the single live refresh token per subject.
///
/// Every call is a round trip to the backing store. A store that cannot be
/// reached reports [`AuthError::StoreUnavailable`]; implementations never
/// answer "absent" on failure.
#[async_trait::async_trait]
pub trait RevocationCache: Send + Sync {
    /// Upsert. Replaces whatever token was recorded for `subject`.
    async fn put(&self, subject: UserId, token: &str, ttl_secs: u64) -> Result<(), AuthError>;
    async fn get(&self, subject: UserId) -> Result<Option<String>, AuthError>;
    /// Deleting a missing key is not an error.
    async fn delete(&self, subject: UserId) -> Result<(), AuthError>;
}
