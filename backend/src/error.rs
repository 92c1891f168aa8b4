use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use wheel_shared::WheelError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Wheel(#[from] WheelError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::Wheel(WheelError::InvalidPrizeList(reason)) => {
                (StatusCode::BAD_REQUEST, format!("Invalid prize list: {}", reason))
            }
            AppError::Wheel(e) => (StatusCode::CONFLICT, e.to_string()),
        };

        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let invalid = AppError::from(WheelError::InvalidPrizeList("empty".to_string())).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let io = AppError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk")).into_response();
        assert_eq!(io.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let busy = AppError::from(WheelError::AlreadySpinning).into_response();
        assert_eq!(busy.status(), StatusCode::CONFLICT);
    }
}
