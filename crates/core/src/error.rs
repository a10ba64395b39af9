//! Error types for the Spiro domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The top-level error type for all Spiro operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Caller errors ---
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        argument: &'static str,
        message: String,
    },

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            message: message.into(),
        }
    }

    /// The numeric code reported in the response envelope.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::InvalidArgument { .. } => ErrorCode::ArgInvalid,
            Error::Store(_) => ErrorCode::DbError,
            Error::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Machine-readable detail attached to the envelope's `error_hint`.
    pub fn hint(&self) -> serde_json::Value {
        match self {
            Error::InvalidArgument { argument, .. } => serde_json::json!({ "argument": argument }),
            _ => serde_json::Value::String(String::new()),
        }
    }
}

/// Error codes carried in every response envelope. `Success` is `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum ErrorCode {
    Success = 0,
    ArgInvalid = 1,
    DbError = 2,
    Internal = 3,
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code as u32
    }
}

impl TryFrom<u32> for ErrorCode {
    type Error = String;

    fn try_from(value: u32) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::ArgInvalid),
            2 => Ok(ErrorCode::DbError),
            3 => Ok(ErrorCode::Internal),
            other => Err(format!("unknown error code {other}")),
        }
    }
}

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Comment {comment_id} cannot reply to {parent_comment_id}: parent is not a primary comment of article {article_id}")]
    InvalidParent {
        comment_id: u64,
        parent_comment_id: u64,
        article_id: u64,
    },

    #[error("Comment {0} already exists")]
    Conflict(u64),
}
