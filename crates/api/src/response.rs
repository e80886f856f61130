//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Standard API response wrapper. Errors never pass through this envelope;
/// they come back as `{"error": …}` from the error type itself.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always true; error responses use a different shape.
    pub success: bool,
    /// The payload.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_success_flag() {
        let response = ApiResponse::ok(serde_json::json!({"count": 3}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["count"], 3);
    }
}
