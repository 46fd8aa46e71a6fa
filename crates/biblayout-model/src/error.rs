/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for the entry model.

use thiserror::Error;

/// Errors raised while building model collections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A macro with the same (case-insensitive) name is already defined.
    #[error("Macro '{name}' is already defined")]
    MacroCollision { name: String },

    /// An entry file could not be decoded.
    #[error("Invalid entry data: {message}")]
    InvalidEntry { message: String },
}

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
