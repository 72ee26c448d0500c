//! Response bodies and the mapping from domain errors to HTTP statuses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use mds_core::{BodyError, MetadataError};
use mds_types::MetadataEntry;
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Body of every success response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SuccessResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<MetadataEntry>,
}

impl SuccessResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
        }
    }

    pub fn data(data: MetadataEntry) -> Self {
        Self {
            message: None,
            data: Some(data),
        }
    }

    pub fn with_data(mut self, data: MetadataEntry) -> Self {
        self.data = Some(data);
        self
    }
}

/// An error ready to be sent to the client.
#[derive(Clone, Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                details,
            },
        }
    }

    pub fn bad_request(error: &str, details: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, Some(details.to_string()))
    }

    pub fn missing_key() -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Missing key parameter", None)
    }

    /// Map a domain error raised while performing `action` (e.g. "create entry").
    pub fn from_metadata(err: MetadataError, action: &str) -> Self {
        tracing::debug!(action, code = err.code(), error = %err, "request failed");
        match err {
            MetadataError::InvalidKey(reason) => Self::new(
                StatusCode::BAD_REQUEST,
                "Invalid key",
                Some(reason.to_string()),
            ),
            MetadataError::InvalidBody(reason) => {
                let error = match reason {
                    BodyError::Malformed(_) => "Invalid request format",
                    BodyError::MissingField(_) => "Missing required field",
                    BodyError::EmptyUpdate => "Empty update",
                };
                Self::new(StatusCode::BAD_REQUEST, error, Some(reason.to_string()))
            }
            MetadataError::DuplicateKey(_) => Self::new(
                StatusCode::CONFLICT,
                "Key already exists",
                Some("Use PUT /api/metadata for updating existing entries".into()),
            ),
            MetadataError::NotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                "Entry not found",
                Some("No metadata entry exists with the specified key".into()),
            ),
            MetadataError::Storage(reason) => {
                tracing::warn!(action, error = %reason, "storage failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Failed to {action}"),
                    Some(reason),
                )
            }
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.body.details = Some(details.into());
        self
    }
}

impl From<BodyError> for ApiError {
    fn from(reason: BodyError) -> Self {
        Self::from_metadata(reason.into(), "read request body")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
