use crate::domain_model::{Claims, Identity, TokenKind, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token invalid")]
    InvalidToken,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("user already exists")]
    UserExists,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub tokens: AuthTokens,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("signature does not verify")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token malformed")]
    Malformed,
    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies both token kinds. Implementations hold one secret per
/// kind and no other state.
pub trait TokenCodec: Send + Sync {
    fn issue(
        &self,
        kind: TokenKind,
        claims: &Claims,
        lifetime: chrono::Duration,
    ) -> Result<IssuedToken, CodecError>;

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, CodecError>;

    /// Same checks as [`TokenCodec::verify`] minus the expiry check.
    fn verify_ignoring_expiry(&self, kind: TokenKind, token: &str)
    -> Result<Claims, CodecError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn issue(&self, identity: &Identity) -> Result<AuthTokens, AuthError>;
    async fn rotate(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError>;
    fn admit(&self, access_token: &str) -> Result<Claims, AuthError>;
}
