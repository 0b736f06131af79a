/*!
 * Error types for the novelwai library.
 *
 * This module contains custom error types for the different stages of the
 * pipeline, using the thiserror crate for ergonomic error definitions.
 *
 * Segmentation fallbacks and oversized chunks are policy branches, not errors,
 * and are only reported through the log.
 */

use thiserror::Error;

/// HTTP statuses that are worth retrying
pub const TRANSIENT_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// Errors that can occur when talking to a translation provider
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    /// The request could not be built or sent for a non-network reason
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The response body was not the JSON shape we expected
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Non-success status returned by the API
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Network-layer failure (DNS, refused connection, reset, timeout)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Build the error matching an HTTP status code
    pub fn from_status(status_code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status_code {
            429 => Self::RateLimitExceeded(message),
            401 | 403 => Self::AuthenticationError(message),
            _ => Self::ApiError { status_code, message },
        }
    }

    /// Whether the failure is likely to go away on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) => true,
            Self::ApiError { status_code, .. } => TRANSIENT_STATUS_CODES.contains(status_code),
            Self::RequestFailed(_) | Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors raised while building a segmenter
#[derive(Error, Debug)]
pub enum SegmentationError {
    /// A configured heading pattern is not a valid regular expression
    #[error("Invalid heading pattern '{name}': {source}")]
    InvalidPattern {
        /// Name of the offending table entry
        name: String,
        /// Underlying regex error
        #[source]
        source: regex::Error,
    },
}

/// Errors that abort the translation of a chapter
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Non-retryable provider failure
    #[error("Chunk {chunk_index} failed: {source}")]
    Fatal {
        /// Index of the chunk within its chapter
        chunk_index: usize,
        /// The provider error
        #[source]
        source: ProviderError,
    },

    /// Transient failures persisted past the attempt budget
    #[error("Chunk {chunk_index} failed after {attempts} attempts (retries exhausted): {last}")]
    RetriesExhausted {
        /// Index of the chunk within its chapter
        chunk_index: usize,
        /// Number of attempts made
        attempts: u32,
        /// Last transient error seen
        last: ProviderError,
    },

    /// The caller asked to stop before the chunk was submitted
    #[error("Translation cancelled before chunk {chunk_index}")]
    Cancelled {
        /// Index of the first chunk that was not submitted
        chunk_index: usize,
    },
}

impl TranslationError {
    /// Index of the chunk the failure is attributed to
    pub fn chunk_index(&self) -> usize {
        match self {
            Self::Fatal { chunk_index, .. }
            | Self::RetriesExhausted { chunk_index, .. }
            | Self::Cancelled { chunk_index } => *chunk_index,
        }
    }
}

/// Main error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from segmentation setup
    #[error("Segmentation error: {0}")]
    Segmentation(#[from] SegmentationError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
