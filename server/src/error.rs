//! HTTP error responses
//!
//! Every failure is rendered as `{"success": false, "error": "..."}`.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::BytesRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cropsight::CropSightError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<CropSightError> for ApiError {
    fn from(err: CropSightError) -> Self {
        let status = match &err {
            CropSightError::InputValidation(_) => StatusCode::BAD_REQUEST,
            CropSightError::DiseaseNotFound(_) | CropSightError::NoCropDataAvailable(_) => {
                StatusCode::NOT_FOUND
            }
            CropSightError::ShapeMismatch { .. } | CropSightError::LabelMismatch { .. } => {
                error!("Model contract violated: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &err {
            CropSightError::ModelNotLoaded(id) => format!("Model '{}' is unavailable", id),
            _ => err.to_string(),
        };

        Self { status, message }
    }
}

/// Requests that are not multipart at all carry no image field
impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        warn!("Rejected multipart request: {}", rejection.body_text());
        Self::bad_request("No image file provided")
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        let status = rejection.status();
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            return Self {
                status,
                message: "Request body too large".to_string(),
            };
        }
        Self {
            status,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status.as_u16(), self.message);
        } else {
            warn!("{} {}", self.status.as_u16(), self.message);
        }
        let body = json!({
            "success": false,
            "error": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
