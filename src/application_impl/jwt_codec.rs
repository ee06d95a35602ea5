use crate::application_port::*;
use crate::domain_model::*;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

#[derive(Clone)]
pub struct JwtConfig {
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    sub: String, // user id as string
    email: String,
    kind: TokenKind,
    iat: i64,
    exp: i64,
    jti: String, // keeps tokens minted in the same second distinct
}

struct KindKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KindKeys {
    fn from_secret(secret: &[u8]) -> Self {
        KindKeys {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 codec with one secret per token kind.
pub struct JwtHs256Codec {
    access: KindKeys,
    refresh: KindKeys,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec {
            access: KindKeys::from_secret(&cfg.access_secret),
            refresh: KindKeys::from_secret(&cfg.refresh_secret),
        }
    }

    fn keys(&self, kind: TokenKind) -> &KindKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn decode_as(
        &self,
        kind: TokenKind,
        token: &str,
        validate_exp: bool,
    ) -> Result<Claims, CodecError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.leeway = 0;
        v.validate_exp = validate_exp;
        let data = decode::<TokenPayload>(token, &self.keys(kind).decoding, &v).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => CodecError::Expired,
                ErrorKind::InvalidSignature => CodecError::InvalidSignature,
                _ => CodecError::Malformed,
            }
        })?;

        let payload = data.claims;
        if payload.kind != kind {
            return Err(CodecError::Malformed);
        }
        let subject = payload
            .sub
            .parse::<UserId>()
            .map_err(|_| CodecError::Malformed)?;

        Ok(Claims {
            subject,
            email: payload.email,
        })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue(
        &self,
        kind: TokenKind,
        claims: &Claims,
        lifetime: chrono::Duration,
    ) -> Result<IssuedToken, CodecError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt
            .checked_add_signed(lifetime)
            .ok_or_else(|| CodecError::Signing(format!("{} token lifetime overflows", kind)))?;
        let payload = TokenPayload {
            sub: claims.subject.to_string(),
            email: claims.email.clone(),
            kind,
            iat: iat_dt.timestamp(),
            exp: exp_dt.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &self.keys(kind).encoding,
        )
        .map_err(|e| CodecError::Signing(e.to_string()))?;
        debug!(%kind, subject = %claims.subject, "token issued");

        Ok(IssuedToken {
            token,
            expires_at: exp_dt,
        })
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, CodecError> {
        self.decode_as(kind, token, true)
    }

    fn verify_ignoring_expiry(
        &self,
        kind: TokenKind,
        token: &str,
    ) -> Result<Claims, CodecError> {
        self.decode_as(kind, token, false)
    }
}
