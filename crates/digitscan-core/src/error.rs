// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Digitscan.

use thiserror::Error;

/// Top-level error type for all Digitscan operations.
///
/// Blank or low-contrast digits are not errors: they are valid input handled by
/// the threshold ladder. Only undecodable input surfaces as `InvalidInput`.
#[derive(Debug, Error)]
pub enum DigitscanError {
    // -- Input errors --
    #[error("invalid input image: {0}")]
    InvalidInput(String),

    #[error("unsupported upload format: {0}")]
    UnsupportedFormat(String),

    // -- Processing errors --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -- Classifier --
    #[error("classifier failed: {0}")]
    Classifier(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DigitscanError>;
