use heroku_http::{ConfigError, CredentialError, GatewayError, body_preview};
use http::StatusCode;
use thiserror::Error;

/// Errors returned by the resource wrappers
///
/// Non-2xx responses are classified here; everything the gateway reports
/// without a response (transport, timeout, TLS, request construction) is
/// carried as [`ApiError::Gateway`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    /// The platform answered 404
    #[error("resource not found: {}", body_preview(.body))]
    NotFound { body: String },

    /// The platform answered 401 or 403
    #[error("not authorized (HTTP {status}): {}", body_preview(.body))]
    Unauthorized { status: StatusCode, body: String },

    /// Any other non-2xx answer
    #[error("request failed with HTTP {status}: {}", body_preview(.body))]
    RequestFailed { status: StatusCode, body: String },

    /// A required argument was empty
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The login exchange succeeded but returned no `api_key`
    #[error("login response did not contain an api_key")]
    MissingApiKey,

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Gateway(GatewayError),
}

impl ApiError {
    /// HTTP status for errors that came from a platform response.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::NotFound { .. } => Some(StatusCode::NOT_FOUND),
            Self::Unauthorized { status, .. } | Self::RequestFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::HttpStatus { status, body, .. } => match status {
                StatusCode::NOT_FOUND => Self::NotFound { body },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    Self::Unauthorized { status, body }
                }
                _ => Self::RequestFailed { status, body },
            },
            other => Self::Gateway(other),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status_error(status: StatusCode) -> GatewayError {
        GatewayError::HttpStatus {
            status,
            body: r#"{"id":"x"}"#.to_owned(),
            content_type: None,
            retry_after: None,
        }
    }

    #[test]
    fn classifies_not_found() {
        let err = ApiError::from(status_error(StatusCode::NOT_FOUND));
        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    }

    #[test]
    fn classifies_unauthorized_and_forbidden() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = ApiError::from(status_error(status));
            assert!(matches!(err, ApiError::Unauthorized { status: s, .. } if s == status));
        }
    }

    #[test]
    fn classifies_other_statuses_as_request_failed() {
        let err = ApiError::from(status_error(StatusCode::UNPROCESSABLE_ENTITY));
        match err {
            ApiError::RequestFailed { status, body } => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
                assert_eq!(body, r#"{"id":"x"}"#);
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }

    #[test]
    fn display_shows_bounded_body() {
        let body = "e".repeat(heroku_http::ERROR_BODY_PREVIEW_LIMIT * 8);
        let err = ApiError::from(GatewayError::HttpStatus {
            status: StatusCode::BAD_GATEWAY,
            body: body.clone(),
            content_type: None,
            retry_after: None,
        });

        assert!(err.to_string().len() < heroku_http::ERROR_BODY_PREVIEW_LIMIT + 64);
        assert!(matches!(err, ApiError::RequestFailed { body: full, .. } if full == body));
    }

    #[test]
    fn transport_errors_stay_gateway_errors() {
        let err = ApiError::from(GatewayError::Timeout(Duration::from_secs(5)));
        assert!(matches!(err, ApiError::Gateway(GatewayError::Timeout(_))));
        assert_eq!(err.status(), None);
    }
}
