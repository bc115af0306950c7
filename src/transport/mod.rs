//! Transport Adapters
//!
//! Provides implementations of the [`Transport`](crate::domain::ports::Transport) port:
//! - reqwest: HTTPS session with the management server
//! - scripted: in-memory replay for tests

pub mod http;
pub mod scripted;

pub use http::*;
pub use scripted::*;
