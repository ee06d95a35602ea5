use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError>;

    /// Checks `candidate` against the stored secret of `identity`. The hash
    /// never leaves the store.
    async fn verify_secret(&self, identity: &Identity, candidate: &str)
    -> Result<bool, AuthError>;

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError>;

    /// Fails with [`AuthError::UserExists`] when the email is taken.
    async fn create(&self, email: &str, password: &str) -> Result<Identity, AuthError>;

    async fn list(&self) -> Result<Vec<Identity>, AuthError>;
}
