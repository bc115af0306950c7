//! REST Request Layer
//!
//! Provides the request dispatcher and the status-code classifier shared by
//! every caller.

pub mod classifier;
pub mod dispatcher;

pub use classifier::*;
pub use dispatcher::*;
