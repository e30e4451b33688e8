//! Reelmark Error Definitions
//!
//! Defines error types used throughout the crate.

use thiserror::Error;

/// Annotation engine error types
#[derive(Error, Debug)]
pub enum AnnotationError {
    // =========================================================================
    // Input Errors
    // =========================================================================
    #[error("Unknown annotation category: {0}")]
    InvalidCategory(String),

    #[error("Unknown annotation status: {0}")]
    InvalidStatus(String),

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Annotation engine result type
pub type AnnotationResult<T> = Result<T, AnnotationError>;
