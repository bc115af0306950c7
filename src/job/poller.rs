//! Job Poller
//!
//! Resolves a submitted operation into its final outcome:
//!
//! ```text
//! SUBMITTED ──sync (200/201/204)──────────────────────────▶ DONE
//!     │
//!     └──202 + jobId──▶ POLLING ──SUCCEEDED──▶ DONE (follow resourceLink)
//!                         │  ▲  ──FAILED─────▶ FAILED
//!                         └──┘  ──max_wait───▶ TIMED_OUT
//!              CREATED/SCHEDULED/RUNNING/unknown
//! ```
//!
//! Fetches within one loop are strictly sequential. Transport faults end the
//! loop immediately.

use crate::config::DEFAULT_BASE_PATH;
use crate::domain::ports::{Clock, HttpMethod};
use crate::error::{Error, Result};
use crate::job::clock::TokioClock;
use crate::job::model::{extract_job_id, Job, JobStatus};
use crate::rest::{check_status_code_success, Dispatcher, RequestOutcome};
use crate::uri::{ResourceArgs, UriBuilder};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Polling cadence and bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Time between job-status fetches
    pub poll_interval: Duration,
    /// Maximum cumulative wait before giving up
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(600),
        }
    }
}

/// States of one poll loop
#[derive(Debug)]
enum PollState {
    Polling { polls: u32 },
    Done(Job),
    Failed(Job),
    TimedOut { waited: Duration, polls: u32 },
}

/// Polls array jobs to completion
#[derive(Clone)]
pub struct JobPoller {
    dispatcher: Arc<Dispatcher>,
    clock: Arc<dyn Clock>,
    uri_builder: UriBuilder,
    array_id: Option<String>,
    service_root: String,
}

impl JobPoller {
    /// Create a poller using the real clock
    pub fn new(dispatcher: Arc<Dispatcher>, uri_builder: UriBuilder, array_id: Option<String>) -> Self {
        Self {
            dispatcher,
            clock: Arc::new(TokioClock),
            uri_builder,
            array_id,
            service_root: DEFAULT_BASE_PATH.to_string(),
        }
    }

    /// Replace the clock used for waiting
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Service path stripped from absolute resource links
    pub fn with_service_root(mut self, root: impl Into<String>) -> Self {
        self.service_root = root.into();
        self
    }

    /// Same poller, addressing jobs on another array
    pub fn for_array(&self, array_id: Option<String>) -> Self {
        Self {
            array_id,
            ..self.clone()
        }
    }

    /// Path of the job-status endpoint for a job
    pub fn job_uri(&self, job_id: &str) -> Result<String> {
        let args = match &self.array_id {
            Some(array) => ResourceArgs::legacy(array.as_str(), "system", "job").resource_name(job_id),
            None => ResourceArgs::hierarchical("system", "job").resource_level_id(job_id),
        };
        self.uri_builder.build(&args)
    }

    /// Fetch a fresh snapshot of a job
    pub async fn fetch_job(&self, job_id: &str) -> Result<Job> {
        let uri = self.job_uri(job_id)?;
        let outcome = self
            .dispatcher
            .execute(&uri, HttpMethod::Get, None, None)
            .await?;
        let body = outcome.body.ok_or_else(|| Error::ResourceNotFound {
            kind: "job".into(),
            name: job_id.to_string(),
        })?;
        Ok(Job::from_body(job_id, body))
    }

    /// Dispatch an operation and wait for its final outcome
    pub async fn submit_and_wait(
        &self,
        uri: &str,
        method: HttpMethod,
        payload: Option<&Value>,
        settings: PollSettings,
    ) -> Result<Option<Value>> {
        let outcome = self.dispatcher.execute(uri, method, None, payload).await?;
        self.wait_for_outcome(uri, method, outcome, settings).await
    }

    /// Continue from an already-received response
    ///
    /// Synchronous completions return the response body without polling;
    /// fault statuses become [`Error::RequestFault`].
    pub async fn wait_for_outcome(
        &self,
        uri: &str,
        method: HttpMethod,
        outcome: RequestOutcome,
        settings: PollSettings,
    ) -> Result<Option<Value>> {
        check_status_code_success(
            &method.to_string(),
            uri,
            outcome.status_code,
            outcome.body.as_ref(),
        )?;
        if !outcome.is_async() {
            debug!(%method, uri, status = outcome.status_code, "completed synchronously");
            return Ok(outcome.body);
        }

        let job_id = extract_job_id(outcome.body.as_ref()).ok_or_else(|| {
            error!("{} {} was accepted without a job id", method, uri);
            Error::ResourceNotFound {
                kind: "jobId".into(),
                name: format!("{} {}", method, uri),
            }
        })?;

        info!("{} {} accepted as job {}", method, uri, job_id);
        let job = self.wait_for_job(&job_id, settings).await?;
        self.job_result(uri, job).await
    }

    /// Poll a job until it succeeds, fails or runs out of time
    pub async fn wait_for_job(&self, job_id: &str, settings: PollSettings) -> Result<Job> {
        if settings.poll_interval.is_zero() {
            return Err(Error::InvalidInput(format!(
                "poll interval for job {} must be non-zero",
                job_id
            )));
        }
        let started = self.clock.now();
        let mut state = PollState::Polling { polls: 0 };

        loop {
            state = match state {
                PollState::Polling { polls } => {
                    let job = self.fetch_job(job_id).await?;
                    let polls = polls + 1;
                    debug!(job_id, polls, status = %job.status, "polled job");

                    let status = job.status;
                    match status {
                        JobStatus::Succeeded => PollState::Done(job),
                        JobStatus::Failed => PollState::Failed(job),
                        status => {
                            if status == JobStatus::Unknown {
                                warn!(
                                    "Job {} reported unrecognized status {:?}; treating as running",
                                    job_id, job.raw_status
                                );
                            }
                            let waited = self.clock.now().saturating_duration_since(started);
                            if waited >= settings.max_wait {
                                PollState::TimedOut { waited, polls }
                            } else {
                                let remaining = settings.max_wait - waited;
                                self.clock.sleep(settings.poll_interval.min(remaining)).await;
                                PollState::Polling { polls }
                            }
                        }
                    }
                }
                PollState::Done(job) => {
                    info!("Job {} succeeded", job.job_id);
                    return Ok(job);
                }
                PollState::Failed(job) => {
                    let message = job.error_message();
                    error!("Job {} failed: {}", job.job_id, message);
                    return Err(Error::JobFailed {
                        job_id: job.job_id,
                        message,
                    });
                }
                PollState::TimedOut { waited, polls } => {
                    error!(
                        "Job {} still running after {:?} ({} polls)",
                        job_id, waited, polls
                    );
                    return Err(Error::JobTimeout {
                        job_id: job_id.to_string(),
                        waited,
                    });
                }
            };
        }
    }

    /// Final result of a succeeded job: the linked resource, else the job body
    async fn job_result(&self, submission_uri: &str, job: Job) -> Result<Option<Value>> {
        let Some(link) = job.resource_link.as_deref() else {
            return Ok(Some(job.body));
        };
        let uri = resolve_resource_link(submission_uri, link, &self.service_root);
        debug!(job_id = %job.job_id, %uri, "fetching job resource");
        let outcome = self
            .dispatcher
            .execute(&uri, HttpMethod::Get, None, None)
            .await?;
        Ok(outcome.body)
    }
}

/// Turn a job's `resourceLink` into a resource path
///
/// Absolute URLs lose their scheme, host and service root. Relative links
/// such as `storagegroup/SG1` are spliced into the submission path at the
/// last segment matching the link's first segment, or appended to it.
pub fn resolve_resource_link(submission_uri: &str, link: &str, service_root: &str) -> String {
    let mut path = link;
    if let Some((_, rest)) = link.split_once("://") {
        path = rest.find('/').map_or("/", |i| &rest[i..]);
    }

    if path.starts_with('/') {
        let root = service_root.trim_end_matches('/');
        if !root.is_empty() {
            if let Some(stripped) = path.strip_prefix(root) {
                if stripped.is_empty() || stripped.starts_with('/') {
                    return normalize(stripped);
                }
            }
        }
        return normalize(path);
    }

    let link_segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let submission: Vec<&str> = submission_uri.split('/').filter(|s| !s.is_empty()).collect();
    let prefix = match link_segments.first() {
        Some(first) => match submission.iter().rposition(|s| s == first) {
            Some(i) => &submission[..i],
            None => &submission[..],
        },
        None => &submission[..],
    };

    let mut segments: Vec<&str> = prefix.to_vec();
    segments.extend(link_segments);
    format!("/{}", segments.join("/"))
}

fn normalize(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::clock::ManualClock;
    use crate::transport::ScriptedTransport;
    use assert_matches::assert_matches;
    use serde_json::json;

    const ARRAY: &str = "000197800123";
    const SG_URI: &str = "/90/sloprovisioning/symmetrix/000197800123/storagegroup/SG1";

    struct Harness {
        transport: Arc<ScriptedTransport>,
        clock: Arc<ManualClock>,
        poller: JobPoller,
    }

    fn harness() -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let clock = Arc::new(ManualClock::new());
        let dispatcher = Arc::new(Dispatcher::new(transport.clone(), Duration::from_secs(120)));
        let poller = JobPoller::new(dispatcher, UriBuilder::new("90"), Some(ARRAY.to_string()))
            .with_clock(clock.clone());
        Harness {
            transport,
            clock,
            poller,
        }
    }

    fn job_uri(job_id: &str) -> String {
        format!("/90/system/symmetrix/{}/job/{}", ARRAY, job_id)
    }

    fn settings() -> PollSettings {
        PollSettings {
            poll_interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(30),
        }
    }

    #[test]
    fn test_job_uri() {
        let h = harness();
        assert_eq!(h.poller.job_uri("12345").unwrap(), job_uri("12345"));

        let no_array = h.poller.for_array(None);
        assert_eq!(no_array.job_uri("12345").unwrap(), "/90/system/job/12345");
    }

    #[tokio::test]
    async fn test_sync_completion_never_polls() {
        let h = harness();
        for status in [200, 201] {
            let outcome = RequestOutcome::new(status, Some(json!({"storageGroupId": "SG1"})));
            let result = h
                .poller
                .wait_for_outcome(SG_URI, HttpMethod::Put, outcome, settings())
                .await
                .unwrap();
            assert_eq!(result, Some(json!({"storageGroupId": "SG1"})));
        }
        let outcome = RequestOutcome::new(204, None);
        let result = h
            .poller
            .wait_for_outcome(SG_URI, HttpMethod::Delete, outcome, settings())
            .await
            .unwrap();
        assert!(result.is_none());

        assert!(h.transport.requests().is_empty());
        assert!(h.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_terminal_on_first_poll() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("12345"),
            200,
            &json!({"status": "SUCCEEDED", "jobId": "12345", "result": "created"}),
        );

        let job = h.poller.wait_for_job("12345", settings()).await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(h.transport.request_count(HttpMethod::Get, &job_uri("12345")), 1);
        assert!(h.clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn test_succeeded_follows_resource_link() {
        let h = harness();
        let sg = json!({"storageGroupId": "SG1", "slo": "Diamond"});
        h.transport
            .respond_json(HttpMethod::Post, SG_URI, 202, &json!({"jobId": "12345"}));
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("12345"),
            200,
            &json!({"status": "SUCCEEDED", "jobId": "12345", "resourceLink": "storagegroup/SG1"}),
        );
        h.transport.respond_json(HttpMethod::Get, SG_URI, 200, &sg);

        let result = h
            .poller
            .submit_and_wait(SG_URI, HttpMethod::Post, Some(&json!({})), settings())
            .await
            .unwrap();
        assert_eq!(result, Some(sg));
    }

    #[tokio::test]
    async fn test_succeeded_without_link_returns_job() {
        let h = harness();
        let job_body = json!({"status": "SUCCEEDED", "jobId": "12345", "result": "done"});
        h.transport
            .respond_json(HttpMethod::Get, &job_uri("12345"), 200, &job_body);

        let outcome = RequestOutcome::new(202, Some(json!({"jobId": "12345"})));
        let result = h
            .poller
            .wait_for_outcome(SG_URI, HttpMethod::Put, outcome, settings())
            .await
            .unwrap();
        assert_eq!(result, Some(job_body));
    }

    #[tokio::test]
    async fn test_failed_job_raises_job_failed() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("09999"),
            200,
            &json!({"status": "RUNNING", "jobId": "09999"}),
        );
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("09999"),
            200,
            &json!({"status": "FAILED", "jobId": "09999", "result": "Device is in use"}),
        );

        let err = h.poller.wait_for_job("09999", settings()).await.unwrap_err();
        assert_matches!(
            err,
            Error::JobFailed { ref job_id, ref message } if job_id == "09999" && message == "Device is in use"
        );
        assert_eq!(h.clock.sleeps(), vec![Duration::from_secs(3)]);
    }

    #[tokio::test]
    async fn test_never_terminal_times_out() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("55555"),
            200,
            &json!({"status": "RUNNING", "jobId": "55555"}),
        );

        let err = h.poller.wait_for_job("55555", settings()).await.unwrap_err();
        assert_matches!(err, Error::JobTimeout { ref job_id, waited } if job_id == "55555" && waited == Duration::from_secs(30));
        assert_eq!(h.clock.elapsed(), Duration::from_secs(30));
        // One poll at t=0 plus one after each of ten 3s sleeps
        assert_eq!(h.transport.request_count(HttpMethod::Get, &job_uri("55555")), 11);
    }

    #[tokio::test]
    async fn test_last_sleep_is_capped_by_deadline() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("1"),
            200,
            &json!({"status": "SCHEDULED"}),
        );
        let settings = PollSettings {
            poll_interval: Duration::from_secs(4),
            max_wait: Duration::from_secs(10),
        };

        let err = h.poller.wait_for_job("1", settings).await.unwrap_err();
        assert_matches!(err, Error::JobTimeout { .. });
        assert_eq!(
            h.clock.sleeps(),
            vec![Duration::from_secs(4), Duration::from_secs(4), Duration::from_secs(2)]
        );
    }

    #[tokio::test]
    async fn test_unknown_status_keeps_polling() {
        let h = harness();
        h.transport
            .respond_json(HttpMethod::Get, &job_uri("7"), 200, &json!({"jobId": "7"}));
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("7"),
            200,
            &json!({"jobId": "7", "status": "VALIDATING"}),
        );
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("7"),
            200,
            &json!({"jobId": "7", "status": "SUCCEEDED"}),
        );

        let job = h.poller.wait_for_job("7", settings()).await.unwrap();
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(h.clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_poll_interval_rejected() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("1"),
            200,
            &json!({"status": "RUNNING"}),
        );
        let settings = PollSettings {
            poll_interval: Duration::ZERO,
            max_wait: Duration::from_secs(30),
        };

        let err = h.poller.wait_for_job("1", settings).await.unwrap_err();
        assert_matches!(err, Error::InvalidInput(_));
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_fault_outcome_is_not_a_result() {
        let h = harness();
        let outcome = RequestOutcome::new(500, Some(json!({"message": "boom"})));
        let err = h
            .poller
            .wait_for_outcome(SG_URI, HttpMethod::Put, outcome, settings())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            Error::RequestFault { status_code: 500, ref message, ref operation, .. }
                if message == "boom" && operation == "PUT"
        );
        assert!(h.transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_without_job_id() {
        let h = harness();
        let outcome = RequestOutcome::new(202, Some(json!({"executionOption": "ASYNCHRONOUS"})));
        let err = h
            .poller
            .wait_for_outcome(SG_URI, HttpMethod::Put, outcome, settings())
            .await
            .unwrap_err();
        assert_matches!(err, Error::ResourceNotFound { ref kind, .. } if kind == "jobId");
    }

    #[tokio::test]
    async fn test_transport_fault_ends_polling() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("3"),
            200,
            &json!({"status": "RUNNING"}),
        );
        h.transport
            .fail(HttpMethod::Get, &job_uri("3"), crate::error::TransportFault::Connection);

        let err = h.poller.wait_for_job("3", settings()).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(h.transport.request_count(HttpMethod::Get, &job_uri("3")), 2);
    }

    #[tokio::test]
    async fn test_job_status_fault_is_a_request_fault() {
        let h = harness();
        h.transport.respond_json(
            HttpMethod::Get,
            &job_uri("4"),
            500,
            &json!({"message": "job service unavailable"}),
        );

        let err = h.poller.wait_for_job("4", settings()).await.unwrap_err();
        assert_eq!(err.status_code(), Some(500));
    }

    #[test]
    fn test_resolve_resource_link() {
        let root = "/univmax/restapi";
        assert_eq!(
            resolve_resource_link(SG_URI, "storagegroup/SG1", root),
            SG_URI
        );
        assert_eq!(
            resolve_resource_link(
                "/90/sloprovisioning/symmetrix/000197800123/storagegroup",
                "storagegroup/SG2",
                root
            ),
            "/90/sloprovisioning/symmetrix/000197800123/storagegroup/SG2"
        );
        assert_eq!(
            resolve_resource_link(
                SG_URI,
                "https://10.0.0.75:8443/univmax/restapi/90/sloprovisioning/symmetrix/000197800123/volume/00001",
                root
            ),
            "/90/sloprovisioning/symmetrix/000197800123/volume/00001"
        );
        assert_eq!(
            resolve_resource_link(SG_URI, "/90/replication/symmetrix/000197800123/storagegroup/SG1", root),
            "/90/replication/symmetrix/000197800123/storagegroup/SG1"
        );
        assert_eq!(
            resolve_resource_link("/90/sloprovisioning/symmetrix/000197800123/host", "snapshot/snap1", root),
            "/90/sloprovisioning/symmetrix/000197800123/host/snapshot/snap1"
        );
    }
}
