use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::Claims;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;
const REFRESH_TOKEN_HEADER: &str = "refreshtoken";
const AUTHORIZATION_HEADER: &str = "authorization";

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let create_user = warp::path("create-user")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.user_service.clone()))
        .and_then(handler::create_user);

    let login = warp::path("login")
        .and(warp::path::end())
        .and(warp::post())
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::login);

    let refresh_token = warp::path("refresh-token")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_refresh_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh_token);

    let logout = warp::path("logout")
        .and(warp::path::end())
        .and(warp::delete())
        .and(with_refresh_token())
        .and(with(server.auth_service.clone()))
        .and_then(handler::logout);

    let users_list = warp::path("users-list")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.user_service.clone()))
        .and_then(handler::users_list);

    let me = warp::path("me")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_verification(server.auth_service.clone()))
        .and_then(handler::me);

    create_user
        .or(login)
        .or(refresh_token)
        .or(logout)
        .or(users_list)
        .or(me)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

/// A missing refresh token header is reported like any other bad token.
fn with_refresh_token() -> impl Filter<Extract = (String,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(REFRESH_TOKEN_HEADER).and_then(
        |token: Option<String>| async move {
            match token {
                Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
                _ => Err(reject::custom(ApiErrorCode::InvalidToken)),
            }
        },
    )
}

/// Drops a leading `Bearer ` scheme, matched without regard to ASCII case.
fn strip_bearer(header: &str) -> &str {
    const SCHEME: &str = "bearer ";
    match header.get(..SCHEME.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SCHEME) => header[SCHEME.len()..].trim(),
        _ => header.trim(),
    }
}

/// The access guard. Admission is a local signature and expiry check; the
/// revocation cache is never consulted.
fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (Claims,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>(AUTHORIZATION_HEADER).and_then(
        move |header: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                let Some(header) = header else {
                    return Err(reject::custom(ApiErrorCode::Unauthenticated));
                };
                let token = strip_bearer(&header);
                auth_service
                    .admit(token)
                    .map_err(ApiErrorCode::from)
                    .map_err(reject::custom)
            }
        },
    )
}
