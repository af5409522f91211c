// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for backend requests
//!
//! The session never surfaces these directly. Each failure is folded into
//! state: a generic search error, an error overlay, or a log line.

use thiserror::Error;

/// Errors produced while talking to the search backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("invalid backend url '{0}'")]
    InvalidUrl(String),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} timed out after {timeout_ms} ms")]
    Timeout {
        endpoint: &'static str,
        timeout_ms: u64,
    },

    #[error("{endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: u16,
        body: String,
    },

    #[error("invalid {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{endpoint} rejected the request: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },
}

/// Result type alias for backend operations
pub type Result<T> = std::result::Result<T, BackendError>;

impl BackendError {
    /// True when no well-formed response reached the client
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BackendError::Transport { .. } | BackendError::Timeout { .. }
        )
    }

    /// Endpoint path the failing request targeted, if any
    pub fn endpoint(&self) -> Option<&'static str> {
        match self {
            BackendError::InvalidUrl(_) => None,
            BackendError::Transport { endpoint, .. }
            | BackendError::Timeout { endpoint, .. }
            | BackendError::Status { endpoint, .. }
            | BackendError::Decode { endpoint, .. }
            | BackendError::Rejected { endpoint, .. } => Some(endpoint),
        }
    }
}

/// Helper functions for creating helpful error messages
pub mod suggestions {
    /// Hint printed when the backend cannot be reached at all
    pub fn backend_unreachable(url: &str) -> String {
        format!(
            "Could not reach the search backend at '{}'\n\n\
             Try:\n\
             - Starting the backend service\n\
             - Passing another origin: shahquery --backend http://host:port search \"query\"\n\
             - Setting backend_url in .shahqueryrc.toml",
            url
        )
    }
}
