//! Error types for the PDF chat service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for pdf-chat operations
pub type Result<T> = std::result::Result<T, Error>;

/// pdf-chat errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Language tag outside the supported set
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// An action needs a language but none was chosen
    #[error("No language selected for this session")]
    LanguageNotSelected,

    /// File parsing error
    #[error("Failed to parse file '{filename}': {message}")]
    FileParse { filename: String, message: String },

    /// Extraction produced zero chunks for the whole batch
    #[error("Could not extract any text from the uploaded PDF(s). Please ensure the file is not image-based or empty.")]
    EmptyExtraction,

    /// Chat requested before documents were processed
    #[error("Documents have not been processed yet")]
    NotProcessed,

    /// Bad request payload
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorDb(String),

    /// Chat completion error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Unknown session id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a file parse error
    pub fn file_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FileParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_db(message: impl Into<String>) -> Self {
        Self::VectorDb(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Remote-service failures the user may simply retry
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Embedding(_) | Self::Llm(_) | Self::Http(_))
    }

    fn status_and_type(&self) -> (StatusCode, &'static str) {
        match self {
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::UnsupportedLanguage(_) => (StatusCode::BAD_REQUEST, "unsupported_language"),
            Error::LanguageNotSelected => (StatusCode::CONFLICT, "language_not_selected"),
            Error::FileParse { .. } => (StatusCode::BAD_REQUEST, "parse_error"),
            Error::EmptyExtraction => (StatusCode::UNPROCESSABLE_ENTITY, "empty_extraction"),
            Error::NotProcessed => (StatusCode::CONFLICT, "not_processed"),
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "invalid_input"),
            Error::Embedding(_) => (StatusCode::SERVICE_UNAVAILABLE, "embedding_error"),
            Error::VectorDb(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_db_error"),
            Error::Llm(_) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error"),
            Error::SessionNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::VectorDb(err.to_string())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status_and_type();

        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}
