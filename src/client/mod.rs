//! Array Client
//!
//! The collaborator interface consumed by storage-domain operations:
//! `get_resource`, `create_resource`, `modify_resource` and
//! `delete_resource`, each taking either addressing convention. Create and
//! modify can run asynchronously, in which case the array job is polled to
//! completion before returning.

pub mod system;

pub use system::*;

use crate::config::ClientConfig;
use crate::domain::ports::{Clock, HttpMethod, QueryParams, Transport};
use crate::error::{Error, Result};
use crate::job::{Job, JobPoller, PollSettings, ASYNCHRONOUS, EXECUTION_OPTION};
use crate::rest::{check_status_code_success, Dispatcher, RequestOutcome};
use crate::transport::ReqwestTransport;
use crate::uri::{ResourceArgs, UriBuilder};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// How a create or modify call completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Return the array's immediate response
    #[default]
    Synchronous,
    /// Request a job and poll it to completion
    Asynchronous,
}

/// Client for one management server
pub struct ArrayClient {
    config: ClientConfig,
    uri_builder: UriBuilder,
    dispatcher: Arc<Dispatcher>,
    poller: JobPoller,
    array_id: Option<String>,
}

impl ArrayClient {
    /// Create a client over an existing transport
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let uri_builder = config.uri_builder();
        let dispatcher = Arc::new(Dispatcher::new(transport, config.request_timeout()));
        let poller = JobPoller::new(dispatcher.clone(), uri_builder.clone(), config.array_id.clone())
            .with_service_root(config.base_path.clone());

        Ok(Self {
            array_id: config.array_id.clone(),
            config,
            uri_builder,
            dispatcher,
            poller,
        })
    }

    /// Create a client with an HTTPS session to the configured server
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config)?;
        Self::new(config, Arc::new(transport))
    }

    /// Replace the clock used while polling jobs
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.poller = self.poller.with_clock(clock);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Current default array
    pub fn array_id(&self) -> Option<&str> {
        self.array_id.as_deref()
    }

    /// Change to a different array
    pub fn set_array(&mut self, array_id: impl Into<String>) {
        let array_id = array_id.into();
        info!("Switching default array to {}", array_id);
        self.poller = self.poller.for_array(Some(array_id.clone()));
        self.array_id = Some(array_id);
    }

    /// Default array, or an input error naming the operation that needed it
    pub fn require_array(&self, operation: &str) -> Result<&str> {
        self.array_id().ok_or_else(|| {
            Error::InvalidInput(format!("{} requires an array id; none is configured", operation))
        })
    }

    pub fn uri_builder(&self) -> &UriBuilder {
        &self.uri_builder
    }

    pub fn poller(&self) -> &JobPoller {
        &self.poller
    }

    /// Build the resource path for caller arguments
    pub fn build_uri(&self, args: &ResourceArgs) -> Result<String> {
        self.uri_builder.build(args)
    }

    /// Raw call returning status and body without judging the status
    pub async fn request(
        &self,
        uri: &str,
        method: HttpMethod,
        params: Option<&QueryParams>,
        payload: Option<&Value>,
    ) -> Result<RequestOutcome> {
        self.dispatcher.request(uri, method, params, payload).await
    }

    /// GET a path and check the status
    pub async fn get_request(
        &self,
        uri: &str,
        resource_type: &str,
        params: Option<&QueryParams>,
    ) -> Result<Option<Value>> {
        let outcome = self.dispatcher.request(uri, HttpMethod::Get, params, None).await?;
        check_status_code_success(
            &format!("get {}", resource_type),
            uri,
            outcome.status_code,
            outcome.body.as_ref(),
        )?;
        Ok(outcome.body)
    }

    /// Get a resource or a collection
    pub async fn get_resource(
        &self,
        args: &ResourceArgs,
        params: Option<&QueryParams>,
    ) -> Result<Option<Value>> {
        let uri = self.build_uri(args)?;
        let outcome = self
            .dispatcher
            .execute(&uri, HttpMethod::Get, params, None)
            .await?;
        Ok(outcome.body)
    }

    /// Create a resource
    pub async fn create_resource(
        &self,
        args: &ResourceArgs,
        payload: Option<Value>,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        self.submit(args, HttpMethod::Post, payload, mode).await
    }

    /// Modify a resource
    pub async fn modify_resource(
        &self,
        args: &ResourceArgs,
        payload: Option<Value>,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        self.submit(args, HttpMethod::Put, payload, mode).await
    }

    /// Delete a resource; always synchronous
    pub async fn delete_resource(&self, args: &ResourceArgs, payload: Option<Value>) -> Result<()> {
        let uri = self.build_uri(args)?;
        self.dispatcher
            .execute(&uri, HttpMethod::Delete, None, payload.as_ref())
            .await?;
        debug!(%uri, "resource deleted");
        Ok(())
    }

    /// Resolve an already-received response, polling if it was accepted as a job
    pub async fn wait_for_job(
        &self,
        uri: &str,
        method: HttpMethod,
        outcome: RequestOutcome,
    ) -> Result<Option<Value>> {
        self.poller
            .wait_for_outcome(uri, method, outcome, self.config.poll_settings())
            .await
    }

    /// Poll a known job to a terminal state
    pub async fn wait_for_job_complete(&self, job_id: &str, settings: PollSettings) -> Result<Job> {
        self.poller.wait_for_job(job_id, settings).await
    }

    /// Fetch one snapshot of a job
    pub async fn get_job_by_id(&self, job_id: &str) -> Result<Job> {
        self.poller.fetch_job(job_id).await
    }

    /// Close the underlying session
    pub async fn close_session(&self) -> Result<()> {
        info!("Closing {} session", self.dispatcher.transport().name());
        self.dispatcher.transport().close().await
    }

    async fn submit(
        &self,
        args: &ResourceArgs,
        method: HttpMethod,
        payload: Option<Value>,
        mode: ExecutionMode,
    ) -> Result<Option<Value>> {
        let uri = self.build_uri(args)?;
        match mode {
            ExecutionMode::Synchronous => {
                let outcome = self
                    .dispatcher
                    .execute(&uri, method, None, payload.as_ref())
                    .await?;
                Ok(outcome.body)
            }
            ExecutionMode::Asynchronous => {
                let payload = with_async_execution(payload)?;
                self.poller
                    .submit_and_wait(&uri, method, Some(&payload), self.config.poll_settings())
                    .await
            }
        }
    }
}

/// Add `executionOption: ASYNCHRONOUS` to a payload
pub fn with_async_execution(payload: Option<Value>) -> Result<Value> {
    let mut map = match payload {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(Error::InvalidInput(format!(
                "asynchronous payload must be a JSON object, got {}",
                other
            )))
        }
    };
    map.insert(EXECUTION_OPTION.to_string(), Value::String(ASYNCHRONOUS.to_string()));
    Ok(Value::Object(map))
}
