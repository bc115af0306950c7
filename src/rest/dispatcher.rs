//! Request Dispatcher
//!
//! Serializes payloads, hands one call to the transport, parses the body and
//! classifies the status code. Holds no state across calls besides the
//! shared transport handle.

use crate::domain::ports::{HttpMethod, QueryParams, Transport, TransportRequest};
use crate::error::Result;
use crate::rest::classifier::{check_status_code_success, classify, StatusClass, ASYNC_ACCEPTED};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Status and parsed body of one call
#[derive(Debug, Clone, PartialEq)]
pub struct RequestOutcome {
    pub status_code: u16,
    pub body: Option<Value>,
}

impl RequestOutcome {
    pub fn new(status_code: u16, body: Option<Value>) -> Self {
        Self { status_code, body }
    }

    /// Classify this outcome
    pub fn class(&self) -> StatusClass {
        classify(self.status_code, self.body.as_ref())
    }

    /// Whether the array accepted the call as a job
    pub fn is_async(&self) -> bool {
        self.status_code == ASYNC_ACCEPTED
    }
}

/// Executes calls against a transport and classifies the results
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl Dispatcher {
    /// Create a dispatcher over a shared transport
    pub fn new(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform a call without judging the status code
    pub async fn request(
        &self,
        uri: &str,
        method: HttpMethod,
        params: Option<&QueryParams>,
        payload: Option<&Value>,
    ) -> Result<RequestOutcome> {
        let (outcome, _) = self.send(uri, method, params, payload).await?;
        Ok(outcome)
    }

    /// Perform a call and fail with a request fault on any non-success status
    pub async fn execute(
        &self,
        uri: &str,
        method: HttpMethod,
        params: Option<&QueryParams>,
        payload: Option<&Value>,
    ) -> Result<RequestOutcome> {
        let (outcome, raw) = self.send(uri, method, params, payload).await?;

        // A fault with an unparsable body still reports the raw text
        let message_source = match (&outcome.body, raw.trim().is_empty()) {
            (Some(body), _) => Some(body.clone()),
            (None, false) => Some(Value::String(raw)),
            (None, true) => None,
        };
        check_status_code_success(
            &method.to_string(),
            uri,
            outcome.status_code,
            message_source.as_ref(),
        )?;

        Ok(outcome)
    }

    async fn send(
        &self,
        uri: &str,
        method: HttpMethod,
        params: Option<&QueryParams>,
        payload: Option<&Value>,
    ) -> Result<(RequestOutcome, String)> {
        let body = payload.map(serde_json::to_string).transpose()?;

        debug!(%method, uri, "dispatching request");
        let response = self
            .transport
            .execute(TransportRequest {
                method,
                path: uri.to_string(),
                params: params.cloned(),
                body,
                timeout: self.timeout,
            })
            .await?;
        debug!(%method, uri, status = response.status, "received response");

        let parsed = parse_body(&response.body, method, uri);
        Ok((RequestOutcome::new(response.status, parsed), response.body))
    }
}

fn parse_body(raw: &str, method: HttpMethod, uri: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            if method != HttpMethod::Delete {
                warn!("{} {} returned a body that is not JSON: {}", method, uri, e);
            }
            None
        }
    }
}
