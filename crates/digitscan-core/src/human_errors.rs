// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the upload and camera front ends.
//
// Every technical error is mapped to a plain sentence with a clear suggestion.
// Severity drives how a presentation layer shows it.

use serde::Serialize;

use crate::error::DigitscanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// The user can fix it by sending a different picture.
    ActionRequired,
    /// Retrying the same input will not help.
    Permanent,
    /// Something is wrong on the server side.
    Internal,
}

/// A user-facing error with a plain message and an actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Convert a `DigitscanError` into a `HumanError`.
pub fn humanize_error(err: &DigitscanError) -> HumanError {
    match err {
        DigitscanError::InvalidInput(_) => HumanError {
            message: "We couldn't read that picture.".into(),
            suggestion: "Take a new photo of the digit or upload a PNG, JPEG, or BMP file.".into(),
            severity: Severity::ActionRequired,
        },

        DigitscanError::UnsupportedFormat(detail) => HumanError {
            message: "This type of file isn't supported.".into(),
            suggestion: format!("Please upload a PNG, JPEG, or BMP image. (File: {detail})"),
            severity: Severity::ActionRequired,
        },

        DigitscanError::InvalidConfig(detail) => HumanError {
            message: "The digit reader is misconfigured.".into(),
            suggestion: format!("Check the normalizer settings. ({detail})"),
            severity: Severity::Permanent,
        },

        DigitscanError::ImageError(_)
        | DigitscanError::Classifier(_) => HumanError {
            message: "Something went wrong while reading the digit.".into(),
            suggestion: "Please try again. If it keeps happening, report the problem.".into(),
            severity: Severity::Internal,
        },

        DigitscanError::Io(_) | DigitscanError::Serialization(_) => HumanError {
            message: "A file could not be read or written.".into(),
            suggestion: "Check that the file exists and that you have permission to use it.".into(),
            severity: Severity::Internal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecodable_image_is_action_required() {
        let err = DigitscanError::InvalidInput("truncated PNG".into());
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn unsupported_format_names_the_file() {
        let err = DigitscanError::UnsupportedFormat("digit.gif".into());
        let human = humanize_error(&err);
        assert!(human.suggestion.contains("digit.gif"));
    }

    #[test]
    fn classifier_failure_is_internal() {
        let err = DigitscanError::Classifier("session closed".into());
        assert_eq!(humanize_error(&err).severity, Severity::Internal);
    }
}
