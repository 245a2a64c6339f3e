use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// JSON `{success, data}` envelope for the few machine-facing endpoints.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub success: bool,
    pub status_code: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            success: true,
            status_code: StatusCode::OK,
        }
    }

    /// Envelope with `success: false` and the given status; `data` still
    /// carries the diagnostic payload.
    pub fn failure(data: T, status_code: StatusCode) -> Self {
        Self {
            data,
            success: false,
            status_code,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let data = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "success": false, "error": "Failed to serialize response data" })),
                )
                    .into_response();
            }
        };

        (self.status_code, Json(json!({ "success": self.success, "data": data }))).into_response()
    }
}
