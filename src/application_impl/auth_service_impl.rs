use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct TokenLifetimes {
    pub access: Duration,
    pub refresh: Duration,
}

/// The token lifecycle engine.
///
/// Holds no mutable state: the only shared state is the revocation cache,
/// where the last writer per subject wins.
pub struct RealAuthService {
    credential_store: Arc<dyn CredentialStore>,
    token_codec: Arc<dyn TokenCodec>,
    revocation_cache: Arc<dyn RevocationCache>,
    lifetimes: TokenLifetimes,
}

impl RealAuthService {
    pub fn new(
        credential_store: Arc<dyn CredentialStore>,
        token_codec: Arc<dyn TokenCodec>,
        revocation_cache: Arc<dyn RevocationCache>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        Self {
            credential_store,
            token_codec,
            revocation_cache,
            lifetimes,
        }
    }

    fn ttl_secs(until: DateTime<Utc>) -> u64 {
        let now = Utc::now();
        let secs = (until - now).num_seconds();
        if secs <= 0 { 1 } else { secs as u64 }
    }

    fn mint(&self, kind: TokenKind, claims: &Claims) -> Result<IssuedToken, AuthError> {
        let lifetime = match kind {
            TokenKind::Access => self.lifetimes.access,
            TokenKind::Refresh => self.lifetimes.refresh,
        };
        self.token_codec
            .issue(kind, claims, lifetime)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Mints both tokens, then records the refresh token. Nothing is handed
    /// out unless the cache write succeeded.
    async fn issue_for(&self, claims: &Claims) -> Result<AuthTokens, AuthError> {
        let access = self.mint(TokenKind::Access, claims)?;
        let refresh = self.mint(TokenKind::Refresh, claims)?;

        self.revocation_cache
            .put(
                claims.subject,
                &refresh.token,
                Self::ttl_secs(refresh.expires_at),
            )
            .await?;

        Ok(AuthTokens {
            access_token: AccessToken(access.token),
            refresh_token: RefreshToken(refresh.token),
            access_token_expires_at: access.expires_at,
            refresh_token_expires_at: refresh.expires_at,
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let identity = self
            .credential_store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let ok = self
            .credential_store
            .verify_secret(&identity, &password)
            .await?;
        if !ok {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue(&identity).await?;
        info!(subject = %identity.id, "login succeeded");

        Ok(LoginResult {
            user_id: identity.id,
            tokens,
        })
    }

    async fn issue(&self, identity: &Identity) -> Result<AuthTokens, AuthError> {
        self.issue_for(&Claims::from(identity)).await
    }

    async fn rotate(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let claims = self
            .token_codec
            .verify(TokenKind::Refresh, refresh_token)
            .map_err(|e| {
                debug!(error = %e, "refresh token rejected by codec");
                AuthError::InvalidToken
            })?;

        let cached = self.revocation_cache.get(claims.subject).await?;
        if cached.as_deref() != Some(refresh_token) {
            warn!(subject = %claims.subject, "refresh token is not the live one");
            return Err(AuthError::InvalidToken);
        }

        let tokens = self.issue_for(&claims).await?;
        debug!(subject = %claims.subject, "refresh token rotated");
        Ok(tokens)
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self
            .token_codec
            .verify_ignoring_expiry(TokenKind::Refresh, refresh_token)
            .map_err(|e| {
                debug!(error = %e, "logout token rejected by codec");
                AuthError::InvalidToken
            })?;

        self.revocation_cache.delete(claims.subject).await?;
        info!(subject = %claims.subject, "session revoked");
        Ok(())
    }

    fn admit(&self, access_token: &str) -> Result<Claims, AuthError> {
        self.token_codec
            .verify(TokenKind::Access, access_token)
            .map_err(|e| {
                debug!(error = %e, "access token rejected");
                AuthError::Unauthenticated
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::{Argon2PasswordHasher, JwtConfig, JwtHs256Codec};
    use crate::infra_memory::{MemoryCredentialStore, MemoryRevocationCache};

    struct Harness {
        service: RealAuthService,
        cache: Arc<MemoryRevocationCache>,
        store: Arc<MemoryCredentialStore>,
    }

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            access_secret: b"test-access-secret".to_vec(),
            refresh_secret: b"test-refresh-secret".to_vec(),
        }
    }

    fn harness_with(lifetimes: TokenLifetimes) -> Harness {
        let cache = Arc::new(MemoryRevocationCache::new());
        let store = Arc::new(MemoryCredentialStore::new(Arc::new(
            Argon2PasswordHasher::insecure_fast(),
        )));
        let service = RealAuthService::new(
            store.clone(),
            Arc::new(JwtHs256Codec::new(jwt_config())),
            cache.clone(),
            lifetimes,
        );
        Harness {
            service,
            cache,
            store,
        }
    }

    fn harness() -> Harness {
        harness_with(TokenLifetimes {
            access: Duration::minutes(1),
            refresh: Duration::days(1),
        })
    }

    fn identity() -> Identity {
        Identity {
            id: UserId::new_v4(),
            email: "a@x.com".to_string(),
        }
    }

    #[tokio::test]
    async fn issue_records_refresh_token() {
        let h = harness();
        let who = identity();
        let tokens = h.service.issue(&who).await.unwrap();

        assert_eq!(
            h.cache.get(who.id).await.unwrap(),
            Some(tokens.refresh_token.0.clone())
        );
        assert!(tokens.access_token_expires_at < tokens.refresh_token_expires_at);
    }

    #[tokio::test]
    async fn rotate_returns_new_refresh_token() {
        let h = harness();
        let who = identity();
        let first = h.service.issue(&who).await.unwrap();
        let second = h.service.rotate(&first.refresh_token.0).await.unwrap();

        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(
            h.cache.get(who.id).await.unwrap(),
            Some(second.refresh_token.0.clone())
        );
        let claims = h.service.admit(&second.access_token.0).unwrap();
        assert_eq!(claims, Claims::from(&who));
    }

    #[tokio::test]
    async fn refresh_token_is_single_use() {
        let h = harness();
        let tokens = h.service.issue(&identity()).await.unwrap();

        h.service.rotate(&tokens.refresh_token.0).await.unwrap();
        let replay = h.service.rotate(&tokens.refresh_token.0).await;
        assert!(matches!(replay, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn revoked_token_cannot_rotate() {
        let h = harness();
        let who = identity();
        let tokens = h.service.issue(&who).await.unwrap();

        h.service.revoke(&tokens.refresh_token.0).await.unwrap();
        assert_eq!(h.cache.get(who.id).await.unwrap(), None);
        assert!(matches!(
            h.service.rotate(&tokens.refresh_token.0).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn revoke_is_idempotent() {
        let h = harness();
        let tokens = h.service.issue(&identity()).await.unwrap();

        h.service.revoke(&tokens.refresh_token.0).await.unwrap();
        h.service.revoke(&tokens.refresh_token.0).await.unwrap();
    }

    #[tokio::test]
    async fn revoke_accepts_expired_refresh_token() {
        let h = harness_with(TokenLifetimes {
            access: Duration::seconds(-10),
            refresh: Duration::seconds(-5),
        });
        let who = identity();
        let tokens = h.service.issue(&who).await.unwrap();

        assert!(matches!(
            h.service.rotate(&tokens.refresh_token.0).await,
            Err(AuthError::InvalidToken)
        ));
        h.service.revoke(&tokens.refresh_token.0).await.unwrap();
        assert_eq!(h.cache.get(who.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn revoke_rejects_garbage_and_access_tokens() {
        let h = harness();
        let tokens = h.service.issue(&identity()).await.unwrap();

        assert!(matches!(
            h.service.revoke("garbage").await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            h.service.revoke(&tokens.access_token.0).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn access_token_survives_revocation_until_expiry() {
        let h = harness();
        let tokens = h.service.issue(&identity()).await.unwrap();

        h.service.revoke(&tokens.refresh_token.0).await.unwrap();
        assert!(h.service.admit(&tokens.access_token.0).is_ok());
    }

    #[tokio::test]
    async fn expired_access_token_is_not_admitted() {
        let h = harness_with(TokenLifetimes {
            access: Duration::seconds(-1),
            refresh: Duration::days(1),
        });
        let tokens = h.service.issue(&identity()).await.unwrap();

        assert!(matches!(
            h.service.admit(&tokens.access_token.0),
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn kinds_are_isolated() {
        let h = harness();
        let tokens = h.service.issue(&identity()).await.unwrap();

        assert!(matches!(
            h.service.admit(&tokens.refresh_token.0),
            Err(AuthError::Unauthenticated)
        ));
        assert!(matches!(
            h.service.rotate(&tokens.access_token.0).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn rotate_with_foreign_secret_leaves_cache_alone() {
        let h = harness();
        let who = identity();
        let live = h.service.issue(&who).await.unwrap();

        let old_codec = JwtHs256Codec::new(JwtConfig {
            access_secret: b"test-access-secret".to_vec(),
            refresh_secret: b"retired-refresh-secret".to_vec(),
        });
        let forged = old_codec
            .issue(TokenKind::Refresh, &Claims::from(&who), Duration::days(1))
            .unwrap();

        assert!(matches!(
            h.service.rotate(&forged.token).await,
            Err(AuthError::InvalidToken)
        ));
        assert_eq!(
            h.cache.get(who.id).await.unwrap(),
            Some(live.refresh_token.0)
        );
    }

    #[tokio::test]
    async fn rotate_without_session_is_invalid() {
        let h = harness();
        let who = identity();
        let tokens = h.service.issue(&who).await.unwrap();
        h.cache.delete(who.id).await.unwrap();

        assert!(matches!(
            h.service.rotate(&tokens.refresh_token.0).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn login_issues_pair_and_records_session() {
        let h = harness();
        let created = h.store.create("a@x.com", "p").await.unwrap();

        let result = h
            .service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "p".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(result.user_id, created.id);
        assert_eq!(
            h.cache.get(created.id).await.unwrap(),
            Some(result.tokens.refresh_token.0)
        );
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness();
        h.store.create("a@x.com", "p").await.unwrap();

        let unknown = h
            .service
            .login(LoginInput {
                email: "b@x.com".to_string(),
                password: "p".to_string(),
            })
            .await;
        let wrong = h
            .service
            .login(LoginInput {
                email: "a@x.com".to_string(),
                password: "nope".to_string(),
            })
            .await;

        assert!(matches!(unknown, Err(AuthError::InvalidCredentials)));
        assert!(matches!(wrong, Err(AuthError::InvalidCredentials)));
    }

    struct DownCache;

    #[async_trait::async_trait]
    impl RevocationCache for DownCache {
        async fn put(&self, _: UserId, _: &str, _: u64) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
        async fn get(&self, _: UserId) -> Result<Option<String>, AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
        async fn delete(&self, _: UserId) -> Result<(), AuthError> {
            Err(AuthError::StoreUnavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn store_outage_fails_every_operation() {
        let codec = Arc::new(JwtHs256Codec::new(jwt_config()));
        let service = RealAuthService::new(
            Arc::new(MemoryCredentialStore::new(Arc::new(
                Argon2PasswordHasher::insecure_fast(),
            ))),
            codec.clone(),
            Arc::new(DownCache),
            TokenLifetimes {
                access: Duration::minutes(1),
                refresh: Duration::days(1),
            },
        );
        let who = identity();
        let refresh = codec
            .issue(TokenKind::Refresh, &Claims::from(&who), Duration::days(1))
            .unwrap();

        assert!(matches!(
            service.issue(&who).await,
            Err(AuthError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.rotate(&refresh.token).await,
            Err(AuthError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.revoke(&refresh.token).await,
            Err(AuthError::StoreUnavailable(_))
        ));
    }
}
