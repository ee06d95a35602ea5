use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};
use std::future::Future;
use std::time::Duration;

/// One `SET EX` string per subject: `{prefix}:{subject}` -> refresh token.
pub struct RedisRevocationCache {
    conn: ConnectionManager,
    prefix: String,
    timeout: Duration,
}

impl RedisRevocationCache {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, timeout: Duration) -> Self {
        RedisRevocationCache {
            conn,
            prefix: prefix.into(),
            timeout,
        }
    }

    pub fn format_key(prefix: &str, subject: UserId) -> String {
        format!("{}:{}", prefix, subject)
    }

    fn key(&self, subject: UserId) -> String {
        Self::format_key(&self.prefix, subject)
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl Future<Output = RedisResult<T>>,
    ) -> Result<T, AuthError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(AuthError::StoreUnavailable(format!("redis {op}: {e}"))),
            Err(_) => Err(AuthError::StoreUnavailable(format!(
                "redis {op}: timed out after {:?}",
                self.timeout
            ))),
        }
    }
}

#[async_trait::async_trait]
impl RevocationCache for RedisRevocationCache {
    async fn put(&self, subject: UserId, token: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let _: () = self
            .bounded("SET", conn.set_ex(&key, token, ttl_secs))
            .await?;
        Ok(())
    }

    async fn get(&self, subject: UserId) -> Result<Option<String>, AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let val: Option<String> = self.bounded("GET", conn.get(&key)).await?;
        Ok(val)
    }

    async fn delete(&self, subject: UserId) -> Result<(), AuthError> {
        let key = self.key(subject);
        let mut conn = self.conn.clone();
        let _: () = self.bounded("DEL", conn.del(&key)).await?;
        Ok(())
    }
}
