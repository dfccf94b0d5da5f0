//! Structured error types for the studio
//!
//! Agent transport and backend failures are carried as values inside
//! [`AgentResult`](crate::agent::AgentResult); this enum is what the
//! controller records and what the CLI surfaces.

use std::time::Duration;
use thiserror::Error;

/// Primary error type for studio operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StudioError {
    // =========================================================================
    // Agent Errors
    // =========================================================================
    /// Network/connect failure talking to the invocation endpoint
    #[error("transport failure: {message}")]
    Transport { message: String },

    /// Endpoint answered but reported failure (non-2xx or success=false)
    #[error("backend failure: {message}")]
    Backend {
        status: Option<u16>,
        message: String,
    },

    /// Payload did not match any known agent response shape
    #[error("unrecognized agent response shape: {detail}")]
    ShapeMismatch { detail: String },

    // =========================================================================
    // Activity Stream Errors
    // =========================================================================
    /// Live event channel failed to open or dropped
    #[error("activity stream error: {reason}")]
    Stream { reason: String },

    // =========================================================================
    // User Input / State Errors
    // =========================================================================
    /// Invalid user input
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    /// Another action is still in flight
    #[error("busy: {action} is still running")]
    Busy { action: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    // =========================================================================
    // Side Effects
    // =========================================================================
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl StudioError {
    /// Check if error is transient and a user-triggered retry may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Stream { .. } => true,
            Self::Busy { .. } => true,
            Self::Backend { status, .. } => {
                matches!(status, Some(429 | 500 | 502 | 503 | 504))
            }

            Self::ShapeMismatch { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidConfig { .. }
            | Self::Clipboard(_)
            | Self::Io(_)
            | Self::Json(_) => false,
        }
    }

    /// Suggested pause before the user regenerates
    pub fn retry_delay(&self) -> Option<Duration> {
        match self {
            Self::Transport { .. } => Some(Duration::from_secs(2)),
            Self::Backend { status: Some(429), .. } => Some(Duration::from_secs(5)),
            Self::Backend { status: Some(503), .. } => Some(Duration::from_secs(10)),
            _ => None,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport { .. } => {
                "Could not reach the agent service. Check your connection and try again.".to_string()
            }
            Self::Backend { status: Some(401 | 403), .. } => {
                "The agent service rejected the request. Please check your API key.".to_string()
            }
            Self::Backend { .. } => {
                "The agent service could not generate content. Try regenerating.".to_string()
            }
            Self::ShapeMismatch { .. } => {
                "The agent replied in an unexpected format; nothing was changed.".to_string()
            }
            Self::Busy { action } => format!("Please wait, {} is still running.", action),
            _ => self.to_string(),
        }
    }
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

impl From<reqwest::Error> for StudioError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Backend {
                status: Some(status.as_u16()),
                message: err.to_string(),
            },
            None => Self::Transport {
                message: err.to_string(),
            },
        }
    }
}

/// Result type alias using StudioError
pub type Result<T> = std::result::Result<T, StudioError>;
