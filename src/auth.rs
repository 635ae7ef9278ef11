use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::{AppConfig, Env},
    errors::AppError,
    models::{Role, User},
    repository::RepositoryState,
};

/// Header carrying a caller's email in local development instead of a token.
pub const LOCAL_IDENTITY_HEADER: &str = "x-user-email";

/// Claims
///
/// Payload of the HS256 access token issued by POST /jwt. The email is the
/// only identity claim; roles are always read from the users collection.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    /// Expiration time (seconds since the epoch).
    pub exp: u64,
    /// Issued at (seconds since the epoch).
    pub iat: u64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub email: String,
}

/// issue_token
///
/// Signs a token for `email` that expires after `config.token_ttl_secs`.
pub fn issue_token(config: &AppConfig, email: &str) -> Result<String, AppError> {
    let now = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
    let claims = Claims {
        email: email.to_string(),
        iat: now,
        exp: now + config.token_ttl_secs,
    };
    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// authorize
///
/// Loads the caller's user document and checks its role against `allowed`.
/// A caller with no user document is treated like one with the wrong role.
pub async fn authorize(
    repo: &RepositoryState,
    caller: &AuthUser,
    allowed: &[Role],
) -> Result<User, AppError> {
    let user = repo
        .find_user_by_email(&caller.email)
        .await?
        .ok_or_else(|| AppError::Forbidden("forbidden access".to_string()))?;

    if allowed.contains(&user.role) {
        Ok(user)
    } else {
        tracing::warn!(email = %caller.email, role = user.role.as_str(), "role check failed");
        Err(AppError::Forbidden("forbidden access".to_string()))
    }
}

fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => tracing::debug!("rejected expired token"),
                other => tracing::debug!(reason = ?other, "rejected invalid token"),
            }
            AppError::Unauthorized
        })
}

/// AuthUser Extractor Implementation
///
/// Resolution order:
/// 1. An identity already placed in the request extensions by `auth_middleware`.
/// 2. In `Env::Local` only, the `x-user-email` header.
/// 3. A `Bearer` token in the Authorization header, verified with the shared
///    secret and checked for expiry.
///
/// Rejection: `AppError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass = parts
                .headers
                .get(LOCAL_IDENTITY_HEADER)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|email| !email.is_empty());
            if let Some(email) = bypass {
                return Ok(AuthUser {
                    email: email.to_string(),
                });
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::Unauthorized)?;

        let claims = verify_token(token, &config.jwt_secret)?;

        Ok(AuthUser {
            email: claims.email,
        })
    }
}

