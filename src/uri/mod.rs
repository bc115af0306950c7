//! Resource Addressing
//!
//! Builds resource paths in either the legacy flat convention or the
//! hierarchical convention, with the API version segment injected according
//! to the configured policy.

pub mod builder;

pub use builder::*;
