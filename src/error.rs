//! Error types for the array REST client
//!
//! Every fault carries enough context (operation, resource path, status
//! code or job id) to reproduce the call that produced it.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Local Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // =========================================================================
    // Array Errors
    // =========================================================================
    #[error("Resource not found: {kind}/{name}")]
    ResourceNotFound { kind: String, name: String },

    #[error(
        "Error {operation} {uri}: the status code received is {status_code} \
         and the message is {message}"
    )]
    RequestFault {
        operation: String,
        uri: String,
        status_code: u16,
        message: String,
    },

    // =========================================================================
    // Job Errors
    // =========================================================================
    #[error("Job {job_id} failed: {message}")]
    JobFailed { job_id: String, message: String },

    #[error("Job {job_id} did not reach a terminal state within {waited:?}")]
    JobTimeout { job_id: String, waited: Duration },

    // =========================================================================
    // Transport Errors
    // =========================================================================
    #[error("Transport {kind} fault for {url}: {message}")]
    Transport {
        kind: TransportFault,
        url: String,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // =========================================================================
    // IO Errors
    // =========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Kind of network-level failure reported by a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportFault {
    /// Request or read timed out
    Timeout,
    /// Connection refused, reset or TLS handshake failure
    Connection,
    /// Request or response body could not be encoded/decoded
    Encoding,
    /// Anything else the HTTP stack reports
    Other,
}

impl std::fmt::Display for TransportFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportFault::Timeout => write!(f, "timeout"),
            TransportFault::Connection => write!(f, "connection"),
            TransportFault::Encoding => write!(f, "encoding"),
            TransportFault::Other => write!(f, "other"),
        }
    }
}

impl TransportFault {
    /// Classify a reqwest error
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportFault::Timeout
        } else if err.is_connect() {
            TransportFault::Connection
        } else if err.is_body() || err.is_decode() || err.is_builder() {
            TransportFault::Encoding
        } else {
            TransportFault::Other
        }
    }
}

/// Broad category of an error, used for reporting and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller supplied bad arguments or configuration
    Input,
    /// A required field or object was absent
    NotFound,
    /// The array answered with a non-success status
    Array,
    /// A polled job failed or timed out
    Job,
    /// The network call itself failed
    Transport,
    /// Local parse or IO failure
    Local,
}

impl Error {
    /// Build a transport error from a reqwest failure
    pub fn transport(err: reqwest::Error, url: impl Into<String>) -> Self {
        Error::Transport {
            kind: TransportFault::from_reqwest(&err),
            url: url.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Determine the category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Configuration(_) | Error::InvalidInput(_) => ErrorCategory::Input,
            Error::ResourceNotFound { .. } => ErrorCategory::NotFound,
            Error::RequestFault { .. } => ErrorCategory::Array,
            Error::JobFailed { .. } | Error::JobTimeout { .. } => ErrorCategory::Job,
            Error::Transport { .. } => ErrorCategory::Transport,
            Error::JsonParse(_) | Error::YamlParse(_) | Error::Io(_) => ErrorCategory::Local,
        }
    }

    /// HTTP status code carried by a request fault
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::RequestFault { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Job id carried by a job failure or timeout
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Error::JobFailed { job_id, .. } | Error::JobTimeout { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Check if this error came from the network layer
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;
