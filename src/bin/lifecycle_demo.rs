//! Walks one session through its whole lifecycle against in-memory stores:
//! signup, login, guarded call, rotation, replay of the stale refresh token,
//! logout, and the access token outliving the logout.
//!
//! $ cargo run --bin lifecycle_demo

use std::sync::Arc;
use tokenwarden::application_impl::*;
use tokenwarden::application_port::*;
use tokenwarden::domain_port::*;
use tokenwarden::infra_memory::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::new("lifecycle_demo=debug,tokenwarden=debug");

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    // region initialization

    let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new());
    let credential_store: Arc<dyn CredentialStore> =
        Arc::new(MemoryCredentialStore::new(credential_hasher));
    let revocation_cache: Arc<dyn RevocationCache> = Arc::new(MemoryRevocationCache::new());
    let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
        access_secret: b"demo-access-secret".to_vec(),
        refresh_secret: b"demo-refresh-secret".to_vec(),
    }));

    let user_service: Arc<dyn UserService> =
        Arc::new(RealUserService::new(credential_store.clone()));
    let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
        credential_store,
        token_codec,
        revocation_cache.clone(),
        TokenLifetimes {
            access: chrono::Duration::minutes(1),
            refresh: chrono::Duration::days(1),
        },
    ));

    // endregion

    let identity = user_service
        .signup(SignupInput {
            email: "a@x.com".to_string(),
            password: "password".to_string(),
        })
        .await?;
    println!("signed up: {:?}", identity);

    let login = auth_service
        .login(LoginInput {
            email: "a@x.com".to_string(),
            password: "password".to_string(),
        })
        .await?;
    println!("access expires at {}", login.tokens.access_token_expires_at);
    println!("refresh expires at {}", login.tokens.refresh_token_expires_at);
    println!(
        "cache holds current refresh token: {}",
        revocation_cache.get(identity.id).await?.as_deref()
            == Some(login.tokens.refresh_token.0.as_str())
    );

    let claims = auth_service.admit(&login.tokens.access_token.0)?;
    println!("admitted: {:?}", claims);

    let rotated = auth_service.rotate(&login.tokens.refresh_token.0).await?;
    println!(
        "rotated, new refresh token differs: {}",
        rotated.refresh_token != login.tokens.refresh_token
    );

    let replay = auth_service.rotate(&login.tokens.refresh_token.0).await;
    println!("replaying stale refresh token: {:?}", replay.err());

    auth_service.revoke(&rotated.refresh_token.0).await?;
    println!(
        "after logout, rotate: {:?}",
        auth_service.rotate(&rotated.refresh_token.0).await.err()
    );
    println!(
        "after logout, access token still admitted: {}",
        auth_service.admit(&rotated.access_token.0).is_ok()
    );

    Ok(())
}
