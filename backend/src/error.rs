//! Error handling for the Vyapar Assistant backend
//!
//! Provides consistent error responses in English and Hindi

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Classifier errors (normally recovered locally as general_chat)
    #[error("Classifier error: {0}")]
    Classifier(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_hi: String,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Remote tabular store errors
    #[error("Store error: {0}")]
    Store(String),

    // Audio transcription/synthesis errors
    #[error("Media error: {0}")]
    Media(String),

    // Messaging transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    // Invoice document rendering errors
    #[error("Renderer error: {0}")]
    Renderer(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_hi: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Classifier(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "CLASSIFIER_ERROR".to_string(),
                    message_en: format!("Classifier error: {}", msg),
                    message_hi: format!("वर्गीकरण सेवा में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Validation {
                field,
                message,
                message_hi,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message_en: message.clone(),
                    message_hi: message_hi.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message_en: format!("{} not found", resource),
                    message_hi: format!("{} नहीं मिला", resource),
                    field: None,
                },
            ),
            AppError::Store(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorDetail {
                    code: "STORE_ERROR".to_string(),
                    message_en: format!("Store error: {}", msg),
                    message_hi: format!("डेटा स्टोर में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Media(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "MEDIA_ERROR".to_string(),
                    message_en: format!("Media error: {}", msg),
                    message_hi: format!("ऑडियो प्रोसेसिंग में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Transport(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "TRANSPORT_ERROR".to_string(),
                    message_en: format!("Messaging transport error: {}", msg),
                    message_hi: format!("संदेश सेवा में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Renderer(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "RENDERER_ERROR".to_string(),
                    message_en: format!("Document renderer error: {}", msg),
                    message_hi: format!("दस्तावेज़ बनाने में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "CONFIGURATION_ERROR".to_string(),
                    message_en: format!("Configuration error: {}", msg),
                    message_hi: format!("कॉन्फ़िगरेशन में त्रुटि: {}", msg),
                    field: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message_en: "An internal server error occurred".to_string(),
                    message_hi: "सर्वर में आंतरिक त्रुटि हुई".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers and services
pub type AppResult<T> = Result<T, AppError>;
