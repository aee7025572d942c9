//! Application error types

use app_api::ApiError;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Remote (soft when connectivity, hard otherwise) =====
    #[error("Network error: {0}")]
    Api(#[from] ApiError),

    // ===== Local =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    // ===== Fatal =====
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Offline or host unreachable: answered with cached data and a banner
    pub fn is_connectivity(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_connectivity())
    }

    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::Config(_) | AppError::Init(_))
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(ApiError::Offline) | AppError::Api(ApiError::HostNotFound(_)) => {
                "No internet connection".to_string()
            }
            AppError::Api(ApiError::Unauthorized) => "Session expired. Please log in again.".to_string(),
            AppError::Api(ApiError::Http { message, .. }) => message.clone(),
            AppError::InvalidName(name) => format!("Invalid name: {}", name),
            _ => self.to_string(),
        }
    }
}

impl From<app_db::DbError> for AppError {
    fn from(e: app_db::DbError) -> Self {
        AppError::Cache(e.to_string())
    }
}
