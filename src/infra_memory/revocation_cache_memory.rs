use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    token: String,
    expires_at: Instant,
}

/// Process-local revocation cache. Suitable for a single instance; sessions
/// do not survive a restart.
pub struct MemoryRevocationCache {
    entries: DashMap<UserId, Entry>,
}

impl MemoryRevocationCache {
    pub fn new() -> Self {
        MemoryRevocationCache {
            entries: DashMap::new(),
        }
    }
}

impl Default for MemoryRevocationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RevocationCache for MemoryRevocationCache {
    async fn put(&self, subject: UserId, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let entry = Entry {
            token: token.to_string(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.insert(subject, entry);
        Ok(())
    }

    async fn get(&self, subject: UserId) -> Result<Option<String>, AuthError> {
        let now = Instant::now();
        // The shard guard must be released before evicting.
        match self.entries.get(&subject) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.token.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        self.entries
            .remove_if(&subject, |_, entry| entry.expires_at <= now);
        Ok(None)
    }

    async fn delete(&self, subject: UserId) -> Result<(), AuthError> {
        self.entries.remove(&subject);
        Ok(())
    }
}
