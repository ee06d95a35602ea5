use crate::application_port::{AuthError, SignupInput, UserService};
use crate::domain_model::Identity;
use crate::domain_port::CredentialStore;
use std::sync::Arc;
use tracing::info;

pub struct RealUserService {
    credential_store: Arc<dyn CredentialStore>,
    min_password_len: usize,
}

impl RealUserService {
    pub fn new(credential_store: Arc<dyn CredentialStore>) -> RealUserService {
        RealUserService {
            credential_store,
            min_password_len: 6,
        }
    }

    fn validate_signup(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let well_formed = match email.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !well_formed {
            return Err(AuthError::InvalidInput("malformed email".to_string()));
        }
        if password.len() < self.min_password_len {
            return Err(AuthError::InvalidInput("password too short".to_string()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn signup(&self, request: SignupInput) -> Result<Identity, AuthError> {
        let SignupInput { email, password } = request;
        let email = email.trim().to_lowercase();

        self.validate_signup(&email, &password)?;

        if self.credential_store.email_exists(&email).await? {
            return Err(AuthError::UserExists);
        }

        let identity = self.credential_store.create(&email, &password).await?;
        info!(subject = %identity.id, "user created");
        Ok(identity)
    }

    async fn list_users(&self) -> Result<Vec<Identity>, AuthError> {
        self.credential_store.list().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::Argon2PasswordHasher;
    use crate::infra_memory::MemoryCredentialStore;

    fn service() -> RealUserService {
        RealUserService::new(Arc::new(MemoryCredentialStore::new(Arc::new(
            Argon2PasswordHasher::insecure_fast(),
        ))))
    }

    fn input(email: &str, password: &str) -> SignupInput {
        SignupInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_list() {
        let service = service();
        let created = service.signup(input(" A@X.com ", "secret1")).await.unwrap();

        assert_eq!(created.email, "a@x.com");
        assert_eq!(service.list_users().await.unwrap(), vec![created]);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let service = service();
        service.signup(input("a@x.com", "secret1")).await.unwrap();

        assert!(matches!(
            service.signup(input("a@x.com", "secret2")).await,
            Err(AuthError::UserExists)
        ));
    }

    #[tokio::test]
    async fn bad_input_is_rejected() {
        let service = service();
        assert!(matches!(
            service.signup(input("nobody", "secret1")).await,
            Err(AuthError::InvalidInput(_))
        ));
        assert!(matches!(
            service.signup(input("a@x.com", "short")).await,
            Err(AuthError::InvalidInput(_))
        ));
    }
}
