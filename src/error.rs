//! Error types for Library Tracker

use std::path::PathBuf;

use thiserror::Error;

/// Application error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NoSuchUser = 4,
    NoSuchItem = 5,
    ItemNotAvailable = 7,
    Duplicate = 8,
    MaxBorrowsReached = 11,
    BadValue = 18,
    NoSuchData = 20,
    ParseFailure = 22,
    IoFailure = 23,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Item not found: {0}")]
    ItemNotFound(u32),

    #[error("User not found: {0}")]
    UserNotFound(u32),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Item {0} is not available")]
    Unavailable(u32),

    #[error("Borrow limit reached: {0}")]
    LimitReached(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AppError {
    /// Build the error for a failed file operation.
    /// A missing file is reported as `NotFound`, anything else as `Io`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AppError::NotFound(format!("file {}", path.display()))
        } else {
            AppError::Io { path, source }
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        AppError::Parse(message.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ItemNotFound(_) => ErrorCode::NoSuchItem,
            AppError::UserNotFound(_) => ErrorCode::NoSuchUser,
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Unavailable(_) => ErrorCode::ItemNotAvailable,
            AppError::LimitReached(_) => ErrorCode::MaxBorrowsReached,
            AppError::InvalidState(_) => ErrorCode::Failure,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::Conflict(_) => ErrorCode::Duplicate,
            AppError::Parse(_) => ErrorCode::ParseFailure,
            AppError::Io { .. } => ErrorCode::IoFailure,
        }
    }

    /// Missing item, user or file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::ItemNotFound(_) | AppError::UserNotFound(_) | AppError::NotFound(_)
        )
    }

    /// Operation rejected because of the current borrow state.
    pub fn is_invalid_state(&self) -> bool {
        matches!(
            self,
            AppError::Unavailable(_) | AppError::LimitReached(_) | AppError::InvalidState(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
