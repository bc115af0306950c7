//! Job Model
//!
//! Snapshot of an array-side job as returned by the job-status endpoint.
//! Each poll produces a fresh snapshot; nothing is mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Execution option value requesting asynchronous processing
pub const ASYNCHRONOUS: &str = "ASYNCHRONOUS";

/// Payload key carrying the execution option
pub const EXECUTION_OPTION: &str = "executionOption";

/// Status of an array job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Created,
    Scheduled,
    Running,
    Succeeded,
    Failed,
    /// Missing or unrecognized status text
    Unknown,
}

impl JobStatus {
    /// Parse the status text reported by the array
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "CREATED" => JobStatus::Created,
            "SCHEDULED" => JobStatus::Scheduled,
            "RUNNING" => JobStatus::Running,
            "SUCCEEDED" => JobStatus::Succeeded,
            "FAILED" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Created => write!(f, "CREATED"),
            JobStatus::Scheduled => write!(f, "SCHEDULED"),
            JobStatus::Running => write!(f, "RUNNING"),
            JobStatus::Succeeded => write!(f, "SUCCEEDED"),
            JobStatus::Failed => write!(f, "FAILED"),
            JobStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// One fetched snapshot of a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier
    pub job_id: String,
    /// Parsed status
    pub status: JobStatus,
    /// Status text exactly as reported, if any
    pub raw_status: Option<String>,
    /// Result text reported by the array
    pub result: Option<String>,
    /// Link to the resource the job produced or modified
    pub resource_link: Option<String>,
    /// When this snapshot was fetched
    pub fetched_at: DateTime<Utc>,
    /// Full job body
    pub body: Value,
}

impl Job {
    /// Build a snapshot from a job-status body
    ///
    /// `job_id` is used when the body does not echo its own id.
    pub fn from_body(job_id: &str, body: Value) -> Self {
        let raw_status = string_field(&body, "status");
        Self {
            job_id: extract_job_id(Some(&body)).unwrap_or_else(|| job_id.to_string()),
            status: raw_status
                .as_deref()
                .map(JobStatus::parse)
                .unwrap_or(JobStatus::Unknown),
            raw_status,
            result: string_field(&body, "result"),
            resource_link: string_field(&body, "resourceLink"),
            fetched_at: Utc::now(),
            body,
        }
    }

    /// Error text for a failed job
    pub fn error_message(&self) -> String {
        string_field(&self.body, "message")
            .or_else(|| self.result.clone())
            .unwrap_or_else(|| "job failed without a message".to_string())
    }
}

/// Read the job identifier from a submission or job body
pub fn extract_job_id(body: Option<&Value>) -> Option<String> {
    match body?.get("jobId")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse() {
        assert_eq!(JobStatus::parse("SUCCEEDED"), JobStatus::Succeeded);
        assert_eq!(JobStatus::parse("running"), JobStatus::Running);
        assert_eq!(JobStatus::parse("VALIDATING"), JobStatus::Unknown);
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Scheduled.is_terminal());
        assert!(!JobStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_job_from_body() {
        let job = Job::from_body(
            "12345",
            json!({
                "status": "SUCCEEDED",
                "jobId": "12345",
                "result": "created",
                "resourceLink": "storagegroup/PU-mystoragegroup-SG"
            }),
        );
        assert_eq!(job.job_id, "12345");
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.result.as_deref(), Some("created"));
        assert_eq!(
            job.resource_link.as_deref(),
            Some("storagegroup/PU-mystoragegroup-SG")
        );
    }

    #[test]
    fn test_missing_status_is_unknown() {
        let job = Job::from_body("777", json!({"name": "Modify Storage Group"}));
        assert_eq!(job.job_id, "777");
        assert_eq!(job.status, JobStatus::Unknown);
        assert!(job.raw_status.is_none());
    }

    #[test]
    fn test_error_message_precedence() {
        let job = Job::from_body("1", json!({"status": "FAILED", "result": "Device busy"}));
        assert_eq!(job.error_message(), "Device busy");

        let job = Job::from_body(
            "1",
            json!({"status": "FAILED", "result": "failed", "message": "SRP out of space"}),
        );
        assert_eq!(job.error_message(), "SRP out of space");

        let job = Job::from_body("1", json!({"status": "FAILED"}));
        assert_eq!(job.error_message(), "job failed without a message");
    }

    #[test]
    fn test_extract_job_id() {
        assert_eq!(extract_job_id(Some(&json!({"jobId": "55555"}))).as_deref(), Some("55555"));
        assert_eq!(extract_job_id(Some(&json!({"jobId": 42}))).as_deref(), Some("42"));
        assert!(extract_job_id(Some(&json!({"jobId": ""}))).is_none());
        assert!(extract_job_id(Some(&json!({}))).is_none());
        assert!(extract_job_id(None).is_none());
    }
}
