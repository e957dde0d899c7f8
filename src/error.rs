//! Error types for the anonymization library.
//!
//! Errors fall into three groups: configuration errors raised when a pattern,
//! pool or category edit is rejected, input errors that fail a single request,
//! and backend errors from PDF reading and writing. Non-fatal conditions are
//! not errors; they travel as warnings in the response.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for anonymization operations.
pub type AnonymizerResult<T> = Result<T, AnonymizerError>;

/// Error type for all anonymization operations.
#[derive(Debug, Error)]
pub enum AnonymizerError {
    /// A configuration write was rejected. The previous configuration stays active.
    #[error("Configuration error in '{subject}': {reason}")]
    Configuration { subject: String, reason: String },

    /// Uploaded file exceeds the configured size limit
    #[error("File too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: usize, limit: usize },

    /// Uploaded bytes are not a PDF document
    #[error("Unsupported content type: expected application/pdf, got {detected}")]
    UnsupportedContentType { detected: String },

    /// The document could not be parsed
    #[error("Corrupt or unreadable document: {reason}")]
    CorruptDocument {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid request parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Failure while extracting or rebuilding PDF content
    #[error("{}", pdf_message(.message, .page))]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

fn pdf_message(message: &str, page: &Option<usize>) -> String {
    match page {
        Some(p) => format!("PDF processing error on page {}: {}", p, message),
        None => format!("PDF processing error: {}", message),
    }
}

impl AnonymizerError {
    /// Builds a configuration error for the named subject.
    pub fn config(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    /// Builds an invalid-input error for the named parameter.
    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised by a rejected configuration write.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// True for errors that describe a bad upload or request.
    pub fn is_input(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. }
                | Self::UnsupportedContentType { .. }
                | Self::CorruptDocument { .. }
                | Self::InvalidInput { .. }
        )
    }
}
