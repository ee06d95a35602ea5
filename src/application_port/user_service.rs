use crate::application_port::{AuthError, SignupInput};
use crate::domain_model::Identity;

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<Identity, AuthError>;
    async fn list_users(&self) -> Result<Vec<Identity>, AuthError>;
}
