//! Error types for the assetmill core.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; `Error` aggregates them.

use thiserror::Error;

use crate::media::MediaType;

/// The top-level error type for all core operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Sprite errors ---
    #[error("Sprite error: {0}")]
    Sprite(#[from] SpriteError),

    // --- Minification errors ---
    #[error("Minification error: {0}")]
    Minify(#[from] MinifyError),

    // --- Dispatch errors ---
    #[error("Unsupported extension '{extension}' for {path}")]
    UnsupportedExtension { extension: String, path: String },

    #[error("File event received with an empty path")]
    EmptyPath,

    // --- Initializer errors ---
    #[error("Initializer failed: {0}")]
    Initializer(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteError {
    #[error("icon already registered: {0}")]
    AlreadyRegistered(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MinifyError {
    #[error("{media_type} syntax error: {reason}")]
    Syntax { media_type: MediaType, reason: String },
}

impl MinifyError {
    pub fn syntax(media_type: MediaType, reason: impl Into<String>) -> Self {
        Self::Syntax {
            media_type,
            reason: reason.into(),
        }
    }
}
