// src/errors.rs
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Invalid base64 image data: {0}")]
    Decode(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    ImageTooLarge(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("AI analysis failed: {0}")]
    AiAnalysis(String),

    #[error("AI request timed out after {0}s")]
    AiTimeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ScannerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ScannerError::Validation(_)
            | ScannerError::Decode(_)
            | ScannerError::UnsupportedFormat(_)
            | ScannerError::ImageTooLarge(_) => StatusCode::BAD_REQUEST,
            ScannerError::RateLimit => StatusCode::TOO_MANY_REQUESTS,
            ScannerError::ImageProcessing(_)
            | ScannerError::AiAnalysis(_)
            | ScannerError::AiTimeout(_)
            | ScannerError::Config(_)
            | ScannerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(
            ScannerError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScannerError::Decode("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ScannerError::RateLimit.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn ai_failures_keep_underlying_message() {
        let err = ScannerError::AiAnalysis("Anthropic error: overloaded".into());
        assert_eq!(err.to_string(), "AI analysis failed: Anthropic error: overloaded");
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ScannerError::AiTimeout(60).to_string(),
            "AI request timed out after 60s"
        );
    }
}
