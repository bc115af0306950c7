//! Domain Ports - Core trait definitions for the array client
//!
//! These traits define the boundaries between the addressing/polling core
//! and external systems. Adapters implement them to provide the HTTP
//! session and the passage of time.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

// =============================================================================
// HTTP Types
// =============================================================================

/// HTTP methods used against the management service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
        }
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Query string parameters (filters) for a request
pub type QueryParams = BTreeMap<String, String>;

/// A single HTTP call handed to a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    /// HTTP method
    pub method: HttpMethod,
    /// Resource path relative to the service root, with leading `/`
    pub path: String,
    /// Optional query parameters
    pub params: Option<QueryParams>,
    /// Serialized JSON body
    pub body: Option<String>,
    /// Per-call timeout
    pub timeout: Duration,
}

/// Raw status and body returned by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Raw response body, possibly empty
    pub body: String,
}

impl TransportResponse {
    /// Create a response from a status code and body text
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

// =============================================================================
// Transport Port
// =============================================================================

/// Port for the HTTP session with the management service
///
/// One invocation performs exactly one HTTP call. Implementations must be
/// safe for concurrent use; the core shares a single handle between callers
/// without additional locking.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one HTTP call
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse>;

    /// Release the underlying session
    async fn close(&self) -> Result<()> {
        Ok(())
    }

    /// Get transport name
    fn name(&self) -> &str;
}

// =============================================================================
// Clock Port
// =============================================================================

/// Port for reading time and waiting between job polls
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current monotonic instant
    fn now(&self) -> Instant;

    /// Wait for the given duration
    async fn sleep(&self, duration: Duration);
}
