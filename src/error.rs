// --------------------------------------------------
// Error taxonomy shared by the store, registries and handlers.
//
// NotFound / OutOfRange / InvalidAvatar / Validation / Forbidden are
// recoverable: the edit is not applied and the client re-renders.
// Storage, Io and Serialization fail only the request in flight.
// --------------------------------------------------

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("index {index} out of range (len {len})")]
    OutOfRange { index: i64, len: usize },

    #[error("invalid avatar: {0}")]
    InvalidAvatar(String),

    #[error("{0}")]
    Validation(String),

    #[error("forbidden")]
    Forbidden,

    // stored data that no longer decodes
    #[error("corrupt data: {0}")]
    Corrupt(String),

    #[error("storage: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::OutOfRange { .. }
            | AppError::InvalidAvatar(_)
            | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Corrupt(_)
            | AppError::Storage(_)
            | AppError::Io(_)
            | AppError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            // internals stay in the log
            return (status, "internal error").into_response();
        }
        tracing::debug!(error = %self, "edit rejected");
        (status, self.to_string()).into_response()
    }
}
