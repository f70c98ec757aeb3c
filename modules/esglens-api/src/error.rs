use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use esglens_common::{ErrorKind, EsgError};

/// API-facing error: a structured body with a kind, never internals.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    RateLimited,
    Internal(String),
    Unavailable(String),
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone())
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limit exceeded".to_string(),
            ),
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "internal server error".to_string(),
            ),
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "unavailable", msg.clone())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(ref detail) = self {
            // Internals go to the log, never to the client.
            error!(detail, "Internal API error");
        }
        let (status, kind, message) = self.parts();
        let body = Json(serde_json::json!({ "error": message, "kind": kind }));

        let mut response = (status, body).into_response();
        if matches!(self, ApiError::RateLimited) {
            response
                .headers_mut()
                .insert("X-RateLimit-Remaining", axum::http::HeaderValue::from_static("0"));
        }
        response
    }
}

impl From<EsgError> for ApiError {
    fn from(e: EsgError) -> Self {
        match e.kind() {
            ErrorKind::PermanentInput => ApiError::BadRequest(e.to_string()),
            ErrorKind::Transient => match e {
                EsgError::Database(_) | EsgError::Broker(_) => {
                    ApiError::Unavailable("dependency unavailable".to_string())
                }
                other => ApiError::Internal(other.to_string()),
            },
            ErrorKind::PermanentSystem => ApiError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_kinds() {
        assert_eq!(
            ApiError::BadRequest("x".into()).parts().0,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::RateLimited.parts().0, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            ApiError::Unavailable("db".into()).parts().0,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn internal_errors_do_not_leak_details() {
        let (_, _, message) = ApiError::Internal("password=hunter2 failed".into()).parts();
        assert_eq!(message, "internal server error");
    }

    #[test]
    fn database_errors_surface_as_unavailable() {
        let api: ApiError = EsgError::Database("connection refused".into()).into();
        assert!(matches!(api, ApiError::Unavailable(_)));
    }

    #[test]
    fn invalid_input_maps_to_bad_request() {
        let api: ApiError = EsgError::InvalidInput("bad key".into()).into();
        assert!(matches!(api, ApiError::BadRequest(_)));
    }
}
