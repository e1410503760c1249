//! Error type definitions for the favicon resolver
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that keeps per-source failures
//! separate from the few conditions that may reach a caller.

use thiserror::Error;

/// Top-level application error type
///
/// Only `Validation` and `Render` are produced on the resolution path;
/// `Http` covers client construction at startup.
#[derive(Error, Debug)]
pub enum AppError {
    /// Request could not be used (missing domain, bad size, bad colour)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Avatar synthesis failed
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failure of a single candidate fetch
///
/// Every variant is absorbed by the resolver and only causes it to move on
/// to the next candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The attempt exceeded the per-attempt timeout
    #[error("Fetch timed out: {url}")]
    Timeout { url: String },

    /// Connection, TLS or body read failure
    #[error("Network error: {url} - {message}")]
    Network { url: String, message: String },

    /// Upstream answered with a non-success status
    #[error("HTTP status {status}: {url}")]
    HttpStatus { url: String, status: u16 },

    /// Upstream answered successfully with nothing in the body
    #[error("Empty response body: {url}")]
    EmptyBody { url: String },

    /// Body exceeded the configured size limit
    #[error("Response body over {limit} bytes: {url}")]
    BodyTooLarge { url: String, limit: usize },

    /// Candidate URL could not be parsed
    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    /// The resolution was cancelled while this attempt was in flight
    #[error("Fetch cancelled: {url}")]
    Cancelled { url: String },

    /// The task running the attempt panicked or was aborted
    #[error("Fetch task crashed: {url} - {message}")]
    Crashed { url: String, message: String },
}

/// Avatar rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// Canvas dimension of zero or above the renderer ceiling
    #[error("Invalid avatar size: {size}")]
    InvalidSize { size: u32 },

    /// Encoder rejected the canvas
    #[error("Failed to encode {format} avatar: {message}")]
    Encode { format: String, message: String },
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a validation error with a custom message
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl FetchError {
    /// Build a network error from a reqwest failure, classifying timeouts
    pub fn from_reqwest(url: &str, error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

impl RenderError {
    /// Create an encoding error
    pub fn encode<F: Into<String>, M: Into<String>>(format: F, message: M) -> Self {
        Self::Encode {
            format: format.into(),
            message: message.into(),
        }
    }
}
