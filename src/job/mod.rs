//! Asynchronous Job Handling
//!
//! Array operations accepted with HTTP 202 run as jobs. This module models
//! job snapshots and polls them to a terminal state.

pub mod clock;
pub mod model;
pub mod poller;

pub use clock::*;
pub use model::*;
pub use poller::*;
