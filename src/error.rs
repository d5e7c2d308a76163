//! Error types for workplan
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (unknown tab/item, bad input, malformed import or config)
//! - 3: Blocked by policy (tab cap, protected tab, unconfirmed destructive action)
//! - 4: Operation failed (storage)

use crate::exchange::ImportError;
use thiserror::Error;

/// Exit codes for the workplan CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const POLICY_BLOCKED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Error type for store operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Tab not found: {0}")]
    TabNotFound(u32),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    // Policy blocks (exit code 3)
    #[error("Tab limit reached: at most {0} tabs allowed")]
    TabLimitReached(usize),

    #[error("Tab {0} is protected and cannot be deleted")]
    TabProtected(u32),

    #[error("Confirmation required: {0}")]
    ConfirmationRequired(String),

    // Operation failures (exit code 4)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::TabNotFound(_)
            | Error::ItemNotFound(_)
            | Error::InvalidInput(_)
            | Error::Import(_)
            | Error::InvalidConfig(_) => exit_codes::USER_ERROR,

            Error::TabLimitReached(_) | Error::TabProtected(_) | Error::ConfirmationRequired(_) => {
                exit_codes::POLICY_BLOCKED
            }

            Error::Storage(_) | Error::Json(_) => exit_codes::OPERATION_FAILED,
        }
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, Error>;
