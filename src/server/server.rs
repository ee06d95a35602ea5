use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Owns the services handed to the HTTP layer and the connections behind them.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub user_service: Arc<dyn UserService>,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>, user_service: Arc<dyn UserService>) -> Self {
        Self {
            auth_service,
            user_service,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new());

        let mut pool = None;
        let credential_store: Arc<dyn CredentialStore> =
            match settings.credential.backend.as_str() {
                "memory" => Arc::new(MemoryCredentialStore::new(credential_hasher)),
                "mysql" => {
                    let dsn = settings
                        .credential
                        .mysql_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("credential.mysql_dsn is not set"))?;
                    let mysql = Pool::<MySql>::connect(dsn).await?;
                    pool = Some(mysql.clone());
                    Arc::new(MySqlCredentialStore::new(mysql, credential_hasher))
                }
                other => return Err(anyhow!("Unknown credential backend: {}", other)),
            };

        let revocation = &settings.revocation;
        let revocation_cache: Arc<dyn RevocationCache> = match revocation.backend.as_str() {
            "memory" => Arc::new(MemoryRevocationCache::new()),
            "redis" => {
                let dsn = revocation
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("revocation.redis_dsn is not set"))?;
                let timeout = Duration::from_millis(revocation.timeout_ms);
                let redis_client = redis::Client::open(dsn)?;
                let mut redis_manager =
                    tokio::time::timeout(timeout, redis_client.get_connection_manager())
                        .await
                        .map_err(|_| anyhow!("redis connect timed out after {:?}", timeout))??;
                let pong: String = redis::cmd("PING").query_async(&mut redis_manager).await?;
                debug!(%pong, "redis reachable");
                Arc::new(RedisRevocationCache::new(
                    redis_manager,
                    revocation.key_prefix.clone(),
                    timeout,
                ))
            }
            other => return Err(anyhow!("Unknown revocation backend: {}", other)),
        };

        let auth = &settings.auth;
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            access_secret: auth.access_secret.clone().into_bytes(),
            refresh_secret: auth.refresh_secret.clone().into_bytes(),
        }));
        let lifetimes = TokenLifetimes {
            access: lifetime(auth.access_lifetime_secs)?,
            refresh: lifetime(auth.refresh_lifetime_secs)?,
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            credential_store.clone(),
            token_codec,
            revocation_cache,
            lifetimes,
        ));
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(credential_store));

        info!(
            credential = %settings.credential.backend,
            revocation = %revocation.backend,
            "server started"
        );

        Ok(Self {
            auth_service,
            user_service,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

fn lifetime(secs: u64) -> anyhow::Result<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .ok_or_else(|| anyhow!("token lifetime out of range: {} seconds", secs))
}
