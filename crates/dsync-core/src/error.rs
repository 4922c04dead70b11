//! Centralized error types for dsync.

use dsync_store::StoreError;
use thiserror::Error;

/// Main error type for dsync operations.
#[derive(Error, Debug)]
pub enum DsyncError {
    #[error("Sync source not found: {0}")]
    SourceNotFound(String),

    #[error("Sync source already exists: {0}")]
    SourceExists(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("Design system component not found: {0}")]
    ComponentNotFound(String),

    #[error("No active token set")]
    NoActiveVersion,

    #[error("Invalid token path '{path}': {reason}")]
    InvalidTokenPath { path: String, reason: String },

    #[error("Invalid version '{0}': expected major.minor.patch")]
    InvalidVersion(String),

    #[error("Invalid color '{0}': expected #RGB or #RRGGBB")]
    InvalidColor(String),

    #[error("Failed to fetch tokens from {source_type}: {message}")]
    Fetch { source_type: String, message: String },

    #[error("Storage write failed for '{key}': {message}")]
    StorageWrite { key: String, message: String },

    #[error("Import rejected: {0}")]
    ImportFormat(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for dsync operations.
pub type DsyncResult<T> = Result<T, DsyncError>;

impl DsyncError {
    /// Create a fetch error for the given source type.
    pub fn fetch(source_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            source_type: source_type.into(),
            message: message.into(),
        }
    }

    /// Create an invalid token path error.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTokenPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an import format error.
    pub fn import(msg: impl Into<String>) -> Self {
        Self::ImportFormat(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }
}
