use std::sync::Arc;

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::{ApiError, AppState};

type HmacSha256 = Hmac<Sha256>;

pub const TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("malformed token")]
    Malformed,
    #[error("unsupported token algorithm")]
    Algorithm,
    #[error("signature mismatch")]
    Signature,
    #[error("token expired")]
    Expired,
    #[error("invalid signing key")]
    Key,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: u64,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: u64, email: impl Into<String>, now: i64) -> Self {
        Self {
            user_id,
            email: email.into(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// HS256 signing key for access tokens.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Vec<u8>,
}

impl JwtKeys {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    pub fn random() -> Self {
        let mut secret = Vec::with_capacity(32);
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
        Self { secret }
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(&self.secret).map_err(|_| AuthError::Key)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        let header = Header {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header = serde_json::to_vec(&header).map_err(|_| AuthError::Malformed)?;
        let claims = serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?;
        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(claims)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let (signing_input, signature) = token.rsplit_once('.').ok_or(AuthError::Malformed)?;
        let (header, claims) = signing_input
            .split_once('.')
            .ok_or(AuthError::Malformed)?;
        if claims.contains('.') {
            return Err(AuthError::Malformed);
        }

        let header: Header = decode_segment(header)?;
        if header.alg != "HS256" {
            return Err(AuthError::Algorithm);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::Signature)?;

        let claims: Claims = decode_segment(claims)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| AuthError::Malformed)?;
    serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!(error = %e, "stored_password_hash_invalid");
            false
        }
    }
}

/// The caller behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: u64,
    pub email: String,
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    bearer_header: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer_header else {
        return Err(ApiError::Unauthorized("Access token required".to_string()));
    };

    let claims = state
        .keys
        .verify(bearer.token(), chrono::Utc::now().timestamp())
        .map_err(|e| {
            tracing::debug!(reason = %e, "invalid_token");
            ApiError::Forbidden("Invalid token".to_string())
        })?;

    req.extensions_mut().insert(AuthUser {
        id: claims.user_id,
        email: claims.email,
    });

    Ok(next.run(req).await)
}
