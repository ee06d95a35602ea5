use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::Arc;

struct CredentialRecord {
    identity: Identity,
    password_hash: String,
    created_at: DateTime<Utc>,
}

/// Credential store kept in process memory, keyed by normalized email.
pub struct MemoryCredentialStore {
    records: DashMap<String, CredentialRecord>,
    hasher: Arc<dyn CredentialHasher>,
}

impl MemoryCredentialStore {
    pub fn new(hasher: Arc<dyn CredentialHasher>) -> Self {
        MemoryCredentialStore {
            records: DashMap::new(),
            hasher,
        }
    }

    fn normalize(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, AuthError> {
        Ok(self
            .records
            .get(&Self::normalize(email))
            .map(|rec| rec.identity.clone()))
    }

    async fn verify_secret(
        &self,
        identity: &Identity,
        candidate: &str,
    ) -> Result<bool, AuthError> {
        let password_hash = match self.records.get(&Self::normalize(&identity.email)) {
            Some(rec) if rec.identity.id == identity.id => rec.password_hash.clone(),
            _ => return Ok(false),
        };
        self.hasher.verify_password(candidate, &password_hash).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AuthError> {
        Ok(self.records.contains_key(&Self::normalize(email)))
    }

    async fn create(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = Self::normalize(email);
        let password_hash = self.hasher.hash_password(password).await?;

        match self.records.entry(email.clone()) {
            Entry::Occupied(_) => Err(AuthError::UserExists),
            Entry::Vacant(slot) => {
                let identity = Identity {
                    id: UserId::new_v4(),
                    email,
                };
                slot.insert(CredentialRecord {
                    identity: identity.clone(),
                    password_hash,
                    created_at: Utc::now(),
                });
                Ok(identity)
            }
        }
    }

    async fn list(&self) -> Result<Vec<Identity>, AuthError> {
        let mut records: Vec<(DateTime<Utc>, Identity)> = self
            .records
            .iter()
            .map(|rec| (rec.created_at, rec.identity.clone()))
            .collect();
        records.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.email.cmp(&b.1.email)));
        Ok(records.into_iter().map(|(_, identity)| identity).collect())
    }
}
