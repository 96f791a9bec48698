use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;
use crate::planning::PlanError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Planning error: {0}")]
    Planning(#[from] PlanError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Planning(e) if e.is_configuration() => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Planning(e) => {
                tracing::error!("Planning failed: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "The batch could not be planned, please retry".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::Language;

    #[test]
    fn test_configuration_errors_are_client_errors() {
        let err = AppError::from(PlanError::GroupCountMismatch {
            groups: 2,
            presenters: 3,
        });
        let (status, code, message) = err.parts();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(code, "VALIDATION_ERROR");
        assert!(message.contains("2 topic group(s) for 3 presenter(s)"));

        let err = AppError::from(PlanError::MissingFlagLanguage {
            flag: "POETIC",
            language: Language::En,
        });
        assert_eq!(err.parts().0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_exhaustion_is_a_server_error() {
        let err = AppError::from(PlanError::DerangementExhausted {
            len: 4,
            block_size: 2,
            retries: 100,
        });
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }

    #[test]
    fn test_llm_errors_hide_details() {
        let (status, code, message) = AppError::from(LlmError::EmptyContent).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "LLM_ERROR");
        assert!(!message.contains("empty"));
    }
}
