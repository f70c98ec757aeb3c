use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};

use crate::auth::api_key::{constant_time_eq, hash_key};
use crate::error::ApiError;
use crate::AppState;

/// The authenticated caller of a mutating endpoint.
#[derive(Debug, Clone)]
pub enum Principal {
    User { id: i32, username: String, is_admin: bool },
    ApiKey { id: i32, user_id: i32, prefix: String },
}

/// Extractor for endpoints that require auth: accepts a bearer token or an
/// `X-API-Key` header. API-key calls are rate limited per key.
pub struct RequireAuth(pub Principal);

impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(token) = bearer_token(parts) {
            return match state.jwt.verify_token(token) {
                Ok(claims) => {
                    let id = claims.sub.parse().unwrap_or(0);
                    Ok(RequireAuth(Principal::User {
                        id,
                        username: claims.username,
                        is_admin: claims.is_admin,
                    }))
                }
                Err(_) => {
                    Err(ApiError::Unauthorized("invalid or expired token".into()).into_response())
                }
            };
        }

        if let Some(presented) = header(parts, "x-api-key") {
            let presented_hash = hash_key(presented);
            let key = state
                .auth_store
                .api_key_by_hash(&presented_hash)
                .await
                .map_err(|e| ApiError::from(e).into_response())?;

            let Some(key) = key else {
                return Err(ApiError::Unauthorized("unknown API key".into()).into_response());
            };

            // Constant-time recheck of the stored hash.
            if !constant_time_eq(key.key_hash.as_bytes(), presented_hash.as_bytes()) {
                return Err(ApiError::Unauthorized("unknown API key".into()).into_response());
            }

            return match state.rate_limiter.check(&key.key_hash) {
                Ok(_remaining) => Ok(RequireAuth(Principal::ApiKey {
                    id: key.id,
                    user_id: key.user_id,
                    prefix: key.key_prefix,
                })),
                Err(()) => Err(ApiError::RateLimited.into_response()),
            };
        }

        Err(ApiError::Unauthorized("authentication required".into()).into_response())
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    header(parts, "authorization")?.strip_prefix("Bearer ")
}

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}
