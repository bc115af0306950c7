//! Scripted In-Memory Transport
//!
//! Replays canned responses per (method, path) route and records every
//! request it receives. The last scripted reply on a route repeats, which
//! makes "job never finishes" scenarios one line to set up.

use crate::domain::ports::{HttpMethod, Transport, TransportRequest, TransportResponse};
use crate::error::{Error, Result, TransportFault};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

#[derive(Debug, Clone)]
enum Reply {
    Response(TransportResponse),
    Fault(TransportFault),
}

/// Transport that answers from a script instead of the network
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<BTreeMap<(HttpMethod, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<TransportRequest>>,
    closed: Mutex<bool>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: HttpMethod, path: &str, reply: Reply) {
        self.routes
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queue a raw response for a route
    pub fn respond(&self, method: HttpMethod, path: &str, status: u16, body: impl Into<String>) {
        self.push(method, path, Reply::Response(TransportResponse::new(status, body)));
    }

    /// Queue a JSON response for a route
    pub fn respond_json(&self, method: HttpMethod, path: &str, status: u16, body: &Value) {
        self.respond(method, path, status, body.to_string());
    }

    /// Queue a transport fault for a route
    pub fn fail(&self, method: HttpMethod, path: &str, kind: TransportFault) {
        self.push(method, path, Reply::Fault(kind));
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    /// Number of requests received for one route
    pub fn request_count(&self, method: HttpMethod, path: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    fn next_reply(&self, method: HttpMethod, path: &str) -> Option<Reply> {
        let mut routes = self.routes.lock();
        let queue = routes.get_mut(&(method, path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(&self, request: TransportRequest) -> Result<TransportResponse> {
        debug!(method = %request.method, path = %request.path, "scripted request");
        let method = request.method;
        let path = request.path.clone();
        self.requests.lock().push(request);

        match self.next_reply(method, &path) {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Fault(kind)) => Err(Error::Transport {
                kind,
                url: path,
                message: format!("scripted {} fault", kind),
                source: None,
            }),
            None => Ok(TransportResponse::new(
                404,
                serde_json::json!({
                    "message": format!("no scripted response for {} {}", method, path)
                })
                .to_string(),
            )),
        }
    }

    async fn close(&self) -> Result<()> {
        *self.closed.lock() = true;
        Ok(())
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
