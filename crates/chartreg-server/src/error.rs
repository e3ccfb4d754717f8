use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use chartreg_types::RegistryError;

/// Response adapter for [`RegistryError`]: the kind's code becomes the HTTP
/// status and the error serializes as the JSON body.
#[derive(Debug)]
pub struct ApiError(pub RegistryError);

impl From<RegistryError> for ApiError {
    fn from(err: RegistryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, "request rejected");
        }
        (status, Json(serde_json::json!(self.0))).into_response()
    }
}

/// Result alias for handler return types.
pub type ApiResult<T> = Result<T, ApiError>;
