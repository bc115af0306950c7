//! Status Code Classifier
//!
//! Maps an HTTP status code and response body onto the three outcomes the
//! rest of the client cares about.

use crate::error::{Error, Result};
use serde_json::Value;
use tracing::error;

/// Status codes that mean the operation completed synchronously
pub const SYNC_SUCCESS_CODES: [u16; 3] = [200, 201, 204];

/// Status code for an accepted asynchronous operation
pub const ASYNC_ACCEPTED: u16 = 202;

/// Fallback text when a fault response carries no message
pub const UNKNOWN_ERROR: &str = "unknown error";

/// Outcome class of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusClass {
    /// Operation fully complete (200/201/204)
    SuccessSync,
    /// Operation accepted, must be polled as a job (202)
    SuccessAsync,
    /// Anything else, with the best message the body offered
    Fault(String),
}

/// Classify a status code; total over every `u16`
pub fn classify(status_code: u16, body: Option<&Value>) -> StatusClass {
    if SYNC_SUCCESS_CODES.contains(&status_code) {
        StatusClass::SuccessSync
    } else if status_code == ASYNC_ACCEPTED {
        StatusClass::SuccessAsync
    } else {
        StatusClass::Fault(fault_message(body))
    }
}

/// Extract a diagnostic message from a fault body
///
/// Precedence: a structured `message` field, then a raw string body, then
/// [`UNKNOWN_ERROR`].
pub fn fault_message(body: Option<&Value>) -> String {
    match body {
        Some(Value::Object(map)) => match map.get("message") {
            Some(Value::String(message)) if !message.is_empty() => message.clone(),
            Some(Value::Null) | None => UNKNOWN_ERROR.to_string(),
            Some(other) => other.to_string(),
        },
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        _ => UNKNOWN_ERROR.to_string(),
    }
}

/// Check a status code, turning a fault into [`Error::RequestFault`]
pub fn check_status_code_success(
    operation: &str,
    uri: &str,
    status_code: u16,
    body: Option<&Value>,
) -> Result<StatusClass> {
    match classify(status_code, body) {
        StatusClass::Fault(message) => {
            error!(
                "{} {} failed with status {}: {}",
                operation, uri, status_code, message
            );
            Err(Error::RequestFault {
                operation: operation.to_string(),
                uri: uri.to_string(),
                status_code,
                message,
            })
        }
        class => Ok(class),
    }
}
