//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use voicehub_domain::error::{ExternalError, VoiceHubError};
use voicehub_domain::validation::Conflict;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<Conflict>,
}

/// Maps [`VoiceHubError`] to an HTTP response with appropriate status code.
pub struct ApiError(VoiceHubError);

impl From<VoiceHubError> for ApiError {
    fn from(err: VoiceHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut conflicts = Vec::new();
        let (status, message) = match self.0 {
            VoiceHubError::Configuration(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            VoiceHubError::Conflict(err) => {
                let message = err.to_string();
                conflicts = err.conflicts;
                (StatusCode::CONFLICT, message)
            }
            VoiceHubError::Semantic(err) => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
            VoiceHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            VoiceHubError::External(err @ ExternalError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, err.to_string())
            }
            VoiceHubError::External(err @ ExternalError::Failed { .. }) => {
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            VoiceHubError::Integrity(err) => {
                tracing::error!(error = %err, "integrity error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            VoiceHubError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                conflicts,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voicehub_domain::error::{
        ConfigurationError, ConflictError, IntegrityError, NotFoundError, SemanticError,
    };
    use voicehub_domain::id::{DeviceId, DeviceType, Location};

    fn status_of(err: impl Into<VoiceHubError>) -> StatusCode {
        ApiError(err.into()).into_response().status()
    }

    #[test]
    fn should_map_each_error_kind_to_its_status() {
        assert_eq!(
            status_of(ConfigurationError::EmptyRegistry),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(ConflictError { conflicts: vec![] }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(SemanticError::InvalidValue("x".to_string())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(NotFoundError::device(&DeviceId::new("d1").unwrap())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(IntegrityError::UnmappedPair {
                device_type: DeviceType::new("lights").unwrap(),
                location: Location::new("lounge").unwrap(),
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(ExternalError::Timeout {
                operation: "dispatch",
                after_ms: 10,
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_of(VoiceHubError::Storage("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
