//! Unisphere REST Client
//!
//! Client core for a storage-array management REST service: resource
//! addressing, request dispatch, status classification and polling of
//! asynchronous array jobs.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                 Provisioning / System operations                     │
//! │       (hosts, storage groups, ports, versions, arrays, WLP)          │
//! ├──────────────────────────────────────────────────────────────────────┤
//! │                          ArrayClient                                 │
//! │   get_resource · create_resource · modify_resource · delete_resource │
//! ├───────────────┬──────────────────────┬───────────────────────────────┤
//! │  UriBuilder   │  Dispatcher +        │  JobPoller                    │
//! │  (legacy /    │  status classifier   │  (202 → poll → resourceLink)  │
//! │  hierarchical)│                      │                               │
//! ├───────────────┴──────────────────────┴───────────────────────────────┤
//! │                     Transport port (async)                           │
//! │        ReqwestTransport (HTTPS)   ·   ScriptedTransport (replay)     │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`client`]: Array client and system-level queries
//! - [`provisioning`]: Host, storage group and port helpers
//! - [`uri`]: Resource addressing and version policy
//! - [`rest`]: Request dispatcher and status classifier
//! - [`job`]: Job model, clocks and the job poller
//! - [`transport`]: Transport adapters
//! - [`domain`]: Port traits shared across layers
//! - [`config`]: Client configuration
//! - [`error`]: Error types and handling

pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod job;
pub mod provisioning;
pub mod rest;
pub mod transport;
pub mod uri;

// Re-export commonly used types
pub use client::{ArrayClient, ExecutionMode, HeadroomQuery, ServerVersion};

pub use config::ClientConfig;

pub use domain::ports::{
    Clock, HttpMethod, QueryParams, Transport, TransportRequest, TransportResponse,
};

pub use error::{Error, ErrorCategory, Result, TransportFault};

pub use job::{Job, JobPoller, JobStatus, ManualClock, PollSettings, TokioClock};

pub use provisioning::{HostEdit, HostEditRequest};

pub use rest::{Dispatcher, RequestOutcome, StatusClass};

pub use transport::{ReqwestTransport, ScriptedTransport};

pub use uri::{ResourceAddress, ResourceArgs, UriBuilder};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
